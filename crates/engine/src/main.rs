//! Taleforge Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taleforge_engine::api;
use taleforge_engine::infrastructure::{
    clock::SystemClock,
    comfyui::ComfyUIClient,
    config::AppConfig,
    ollama::OllamaClient,
    ports::{ImageGenPort, LlmPort, SpeechPort},
    speech::SpeechClient,
};
use taleforge_engine::use_cases::{ImageSettings, SessionOptions};
use taleforge_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taleforge_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taleforge Engine");

    let config = AppConfig::from_env();

    // Create infrastructure clients
    let ollama = OllamaClient::new(&config.ollama_url, &config.ollama_model);
    tracing::info!(url = %config.ollama_url, model = %ollama.model(), "Narrative backend");
    let llm: Arc<dyn LlmPort> = Arc::new(ollama);

    let comfyui = ComfyUIClient::new(&config.comfyui_url)
        .with_checkpoint(config.comfyui_checkpoint.clone());
    match comfyui.check_health().await {
        Ok(true) => tracing::info!(url = %config.comfyui_url, "ComfyUI reachable"),
        _ => tracing::warn!(
            url = %config.comfyui_url,
            "ComfyUI not reachable, scenes will be shown without images until it is"
        ),
    }
    let image_gen: Arc<dyn ImageGenPort> = Arc::new(comfyui);

    let speech: Arc<dyn SpeechPort> = Arc::new(SpeechClient::new(
        &config.speech_url,
        &config.speech_model,
        config.voices.clone(),
    ));

    tracing::info!(
        prefetch = config.prefetch_enabled,
        width = config.image_width,
        height = config.image_height,
        "Story settings"
    );

    // Create application
    let app = Arc::new(App::new(
        llm,
        image_gen,
        speech,
        Arc::new(SystemClock::new()),
        ImageSettings {
            width: config.image_width,
            height: config.image_height,
        },
        SessionOptions {
            speculative_prefetch: config.prefetch_enabled,
        },
    ));

    // Drop sessions whose startup failed once clients had time to read the error
    let reaper_app = app.clone();
    let retention = i64::try_from(config.session_retention_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);
    tokio::spawn(async move {
        loop {
            let reaped = reaper_app.sessions.reap_failed(retention).await;
            if reaped > 0 {
                tracing::info!(reaped, "Reaped failed sessions");
            }
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        }
    });

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.map(str::trim).filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
