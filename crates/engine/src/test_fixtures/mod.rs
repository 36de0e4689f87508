//! Shared fakes and builders for engine tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{pipeline_with, scene_json, ScriptedLlm, StaticImageGen, StaticSpeech};
//!
//! let llm = Arc::new(ScriptedLlm::new());
//! llm.push_start(Ok(scene_json("It begins.", 3)));
//! let pipeline = pipeline_with(llm, Arc::new(StaticImageGen::new()), Arc::new(StaticSpeech::new()));
//! ```

pub mod llm_integration;
pub mod llm_mocks;
pub mod media_mocks;

pub use llm_mocks::ScriptedLlm;
pub use media_mocks::{FailingImageGen, FailingSpeech, StaticImageGen, StaticSpeech};

use std::sync::Arc;

use taleforge_domain::{GameSettings, Genre, Language, ProtagonistName};

use crate::infrastructure::ports::{ImageGenPort, LlmPort, SpeechPort};
use crate::use_cases::scene::{ImageSettings, ScenePipeline, SceneWriter};

/// English fantasy settings for a knight named Aria.
pub fn test_settings() -> GameSettings {
    GameSettings::new(
        ProtagonistName::new("Aria").expect("valid name"),
        Genre::Fantasy,
        "Knight",
        "Brave",
        Language::English,
    )
    .expect("valid settings")
}

/// Intent of option `index` in a scene built by [`scene_json`].
pub fn option_intent(narrative: &str, index: usize) -> String {
    format!("{} -> option {}", narrative, index)
}

/// Display text of option `index` in a scene built by [`scene_json`].
pub fn option_text(index: usize) -> String {
    format!("Option {}", index + 1)
}

/// A backend reply describing a scene with `option_count` options.
///
/// Intents embed the narrative so scripts for different scenes never collide.
pub fn scene_json(narrative: &str, option_count: usize) -> String {
    let options: Vec<serde_json::Value> = (0..option_count)
        .map(|i| {
            serde_json::json!({
                "text": option_text(i),
                "intent": option_intent(narrative, i),
            })
        })
        .collect();

    serde_json::json!({
        "narrative": narrative,
        "dialogue": "Stay close.",
        "visualPrompt": format!("{}, cinematic lighting", narrative),
        "musicConfig": { "mood": "mysterious", "tempo": "medium" },
        "options": options,
    })
    .to_string()
}

/// Pipeline over the given fakes with default image size.
pub fn pipeline_with(
    llm: Arc<dyn LlmPort>,
    image_gen: Arc<dyn ImageGenPort>,
    speech: Arc<dyn SpeechPort>,
) -> ScenePipeline {
    ScenePipeline::new(
        SceneWriter::new(llm),
        image_gen,
        speech,
        ImageSettings::default(),
    )
}

/// Pipeline with working media fakes, shared for spawning.
pub fn shared_pipeline(llm: Arc<ScriptedLlm>) -> Arc<ScenePipeline> {
    Arc::new(pipeline_with(
        llm,
        Arc::new(StaticImageGen::new()),
        Arc::new(StaticSpeech::new()),
    ))
}
