//! JSON shapes exchanged with the player client.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use taleforge_domain::{
    GameSettings, GeneratedAudio, GeneratedImage, Genre, Language, MusicConfig, SceneData,
    SceneOption, SessionId,
};

use crate::use_cases::{SessionPhase, SessionSummary, SessionView};

#[derive(Debug, Serialize)]
pub struct GenreInfo {
    pub id: Genre,
    pub name: &'static str,
    pub description: &'static str,
}

impl From<Genre> for GenreInfo {
    fn from(genre: Genre) -> Self {
        Self {
            id: genre,
            name: genre.display_name(),
            description: genre.description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub id: Language,
    /// Name in the language itself
    pub label: &'static str,
}

impl From<Language> for LanguageInfo {
    fn from(language: Language) -> Self {
        Self {
            id: language,
            label: language.native_label(),
        }
    }
}

/// Base64 encoded media payload.
#[derive(Debug, Serialize)]
pub struct MediaData {
    pub format: String,
    pub mime_type: String,
    pub data: String,
}

impl From<&GeneratedImage> for MediaData {
    fn from(image: &GeneratedImage) -> Self {
        Self {
            mime_type: format!("image/{}", image.format),
            format: image.format.clone(),
            data: BASE64.encode(&image.bytes),
        }
    }
}

impl From<&GeneratedAudio> for MediaData {
    fn from(audio: &GeneratedAudio) -> Self {
        let mime_type = match audio.format.as_str() {
            "mp3" => "audio/mpeg".to_string(),
            other => format!("audio/{}", other),
        };
        Self {
            mime_type,
            format: audio.format.clone(),
            data: BASE64.encode(&audio.bytes),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneResponse {
    pub id: u64,
    pub narrative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    pub visual_prompt: String,
    pub music_config: MusicConfig,
    pub options: Vec<SceneOption>,
    pub image: Option<MediaData>,
    pub narration: Option<MediaData>,
}

impl From<&SceneData> for SceneResponse {
    fn from(scene: &SceneData) -> Self {
        Self {
            id: scene.id().get(),
            narrative: scene.narrative().to_string(),
            dialogue: scene.dialogue().map(str::to_string),
            visual_prompt: scene.visual_prompt().to_string(),
            music_config: scene.music(),
            options: scene.options().to_vec(),
            image: scene.image().map(MediaData::from),
            narration: scene.narration().map(MediaData::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionViewResponse {
    pub phase: SessionPhase,
    pub awaiting: bool,
    pub error: Option<String>,
    pub history_len: usize,
    pub settings: Option<GameSettings>,
    pub scene: Option<SceneResponse>,
}

impl From<SessionView> for SessionViewResponse {
    fn from(view: SessionView) -> Self {
        Self {
            phase: view.phase,
            awaiting: view.awaiting,
            error: view.error_message,
            history_len: view.history_len,
            settings: view.settings,
            scene: view.scene.as_deref().map(SceneResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub id: SessionId,
    pub view: SessionViewResponse,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub index: usize,
}
