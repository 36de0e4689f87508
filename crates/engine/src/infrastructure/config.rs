//! Process configuration read from environment variables.
//!
//! Every value has a default so the engine starts against a stock local
//! Ollama / ComfyUI / speech setup with no configuration at all.

use crate::infrastructure::comfyui::{DEFAULT_CHECKPOINT, DEFAULT_COMFYUI_BASE_URL};
use crate::infrastructure::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};
use crate::infrastructure::speech::{
    VoiceCast, DEFAULT_NARRATOR_VOICE, DEFAULT_PROTAGONIST_VOICE, DEFAULT_SPEECH_BASE_URL,
    DEFAULT_SPEECH_MODEL,
};

pub const DEFAULT_IMAGE_WIDTH: u32 = 768;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 512;
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
/// How long a failed session stays readable before it is reaped.
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub ollama_url: String,
    pub ollama_model: String,
    pub comfyui_url: String,
    pub comfyui_checkpoint: String,
    pub speech_url: String,
    pub speech_model: String,
    pub voices: VoiceCast,
    pub image_width: u32,
    pub image_height: u32,
    /// Precompute every option's outcome while the player reads.
    /// Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
    pub prefetch_enabled: bool,
    /// Age after which failed sessions are dropped
    pub session_retention_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    /// Comma separated origins, or `*`; `None` disables the CORS layer
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |keys: &[&str], default: &str| -> String {
            keys.iter()
                .find_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            ollama_url: string(&["OLLAMA_URL", "OLLAMA_BASE_URL"], DEFAULT_OLLAMA_BASE_URL),
            ollama_model: string(&["OLLAMA_MODEL"], DEFAULT_OLLAMA_MODEL),
            comfyui_url: string(&["COMFYUI_URL", "COMFYUI_BASE_URL"], DEFAULT_COMFYUI_BASE_URL),
            comfyui_checkpoint: string(&["COMFYUI_CHECKPOINT"], DEFAULT_CHECKPOINT),
            speech_url: string(&["SPEECH_URL"], DEFAULT_SPEECH_BASE_URL),
            speech_model: string(&["SPEECH_MODEL"], DEFAULT_SPEECH_MODEL),
            voices: VoiceCast {
                narrator: string(&["NARRATOR_VOICE"], DEFAULT_NARRATOR_VOICE),
                protagonist: string(&["PROTAGONIST_VOICE"], DEFAULT_PROTAGONIST_VOICE),
            },
            image_width: parsed(&lookup, &["IMAGE_WIDTH"], DEFAULT_IMAGE_WIDTH),
            image_height: parsed(&lookup, &["IMAGE_HEIGHT"], DEFAULT_IMAGE_HEIGHT),
            prefetch_enabled: flag(&lookup, "PREFETCH_ENABLED", true),
            session_retention_secs: parsed(
                &lookup,
                &["SESSION_RETENTION_SECS"],
                DEFAULT_SESSION_RETENTION_SECS,
            ),
            server_host: string(&["SERVER_HOST"], DEFAULT_SERVER_HOST),
            server_port: parsed(&lookup, &["SERVER_PORT", "PORT"], DEFAULT_SERVER_PORT),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parsed<F, T>(lookup: &F, keys: &[&str], default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some((key, raw)) = keys
        .iter()
        .find_map(|key| lookup(key).map(|value| (*key, value)))
    else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            default
        }
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value = %raw, "Ignoring unrecognized flag value");
            default
        }
    }
}
