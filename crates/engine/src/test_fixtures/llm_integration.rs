//! Integration helpers for running the scene writer against a local Ollama.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[tokio::test]
//! #[ignore = "requires ollama"]
//! async fn test_real_scene() {
//!     skip_if_ollama_unavailable().await;
//!     let writer = SceneWriter::new(Arc::new(create_test_ollama_client()));
//!     // ... test logic
//! }
//! ```

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::ports::{ChatMessage, LlmPort, LlmRequest};

/// Creates an OllamaClient from `OLLAMA_URL` / `OLLAMA_MODEL`.
pub fn create_test_ollama_client() -> OllamaClient {
    let config = AppConfig::from_env();
    OllamaClient::new(&config.ollama_url, &config.ollama_model)
}

/// Check if Ollama is reachable and answering.
pub async fn ollama_available() -> bool {
    let request = LlmRequest::new(vec![ChatMessage::user("Hi")])
        .with_temperature(0.0)
        .with_max_tokens(Some(5));

    create_test_ollama_client().generate(request).await.is_ok()
}

/// Fail fast with a clear message when Ollama is not running.
pub async fn skip_if_ollama_unavailable() {
    if !ollama_available().await {
        panic!("Ollama is not available - skipping test");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::test_settings;
    use crate::use_cases::scene::SceneWriter;
    use std::sync::Arc;
    use taleforge_domain::History;

    #[tokio::test]
    #[ignore = "requires ollama"]
    async fn local_model_writes_a_valid_opening_scene() {
        skip_if_ollama_unavailable().await;

        let writer = SceneWriter::new(Arc::new(create_test_ollama_client()));
        let draft = writer
            .next_scene(&test_settings(), &History::new(), None)
            .await
            .expect("local model produces a valid scene");

        assert!(!draft.narrative.is_empty());
        assert!((2..=4).contains(&draft.options.len()));
    }
}
