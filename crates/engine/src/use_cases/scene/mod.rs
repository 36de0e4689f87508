//! Scene generation pipeline.
//!
//! One required narrative call, then the illustration and the narration are
//! rendered concurrently. Asset failures degrade to a scene without that
//! asset; only a narrative failure fails the scene.

pub mod prompts;
mod writer;

pub use writer::SceneWriter;

use std::sync::Arc;

use taleforge_domain::{
    DomainError, GameSettings, GeneratedAudio, GeneratedImage, History, SceneData,
    SceneIdSequence,
};

use crate::infrastructure::config::{DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH};
use crate::infrastructure::ports::{ImageGenPort, ImageRequest, LlmError, SpeechPort};

/// Why a scene could not be produced.
///
/// Cloneable so one failed computation can be observed by every claimant of
/// a shared prefetch entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SceneGenerationError {
    #[error("Narrative backend failed: {0}")]
    Backend(#[from] LlmError),
    #[error("Narrative backend returned an empty response")]
    EmptyResponse,
    #[error("Malformed scene payload: {0}")]
    Malformed(String),
    #[error("Invalid scene: {0}")]
    InvalidScene(#[from] DomainError),
    #[error("Scene task failed: {0}")]
    TaskFailed(String),
}

/// Output size for scene illustrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }
}

/// Produces fully realized scenes. Stateless apart from the id sequence.
pub struct ScenePipeline {
    writer: SceneWriter,
    image_gen: Arc<dyn ImageGenPort>,
    speech: Arc<dyn SpeechPort>,
    image_settings: ImageSettings,
    scene_ids: SceneIdSequence,
}

impl ScenePipeline {
    pub fn new(
        writer: SceneWriter,
        image_gen: Arc<dyn ImageGenPort>,
        speech: Arc<dyn SpeechPort>,
        image_settings: ImageSettings,
    ) -> Self {
        Self {
            writer,
            image_gen,
            speech,
            image_settings,
            scene_ids: SceneIdSequence::new(),
        }
    }

    /// Generate the scene that follows `history`.
    ///
    /// The history is taken by value: callers hand over a snapshot, so later
    /// appends by the coordinator never leak into an in-flight generation.
    pub async fn generate(
        &self,
        settings: &GameSettings,
        history: History,
        action_intent: Option<&str>,
    ) -> Result<SceneData, SceneGenerationError> {
        let draft = self
            .writer
            .next_scene(settings, &history, action_intent)
            .await?;

        let (image, narration) = tokio::join!(
            self.render_image(&draft.visual_prompt),
            self.render_narration(&draft.narrative, draft.dialogue.as_deref()),
        );

        let scene = SceneData::new(self.scene_ids.next_id(), draft)
            .with_image(image)
            .with_narration(narration);

        tracing::info!(
            scene_id = %scene.id(),
            options = scene.options().len(),
            has_image = scene.image().is_some(),
            has_narration = scene.narration().is_some(),
            "Generated scene"
        );

        Ok(scene)
    }

    async fn render_image(&self, visual_prompt: &str) -> Option<GeneratedImage> {
        let request = ImageRequest {
            prompt: visual_prompt.to_string(),
            width: self.image_settings.width,
            height: self.image_settings.height,
        };

        match self.image_gen.generate(request).await {
            Ok(result) if !result.image_data.is_empty() => Some(GeneratedImage {
                bytes: result.image_data,
                format: result.format,
            }),
            Ok(_) => {
                tracing::warn!("Image backend returned no data");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Scene image generation failed");
                None
            }
        }
    }

    async fn render_narration(
        &self,
        narrative: &str,
        dialogue: Option<&str>,
    ) -> Option<GeneratedAudio> {
        let script = prompts::narration_script(narrative, dialogue);

        match self.speech.synthesize(script).await {
            Ok(result) if !result.audio_data.is_empty() => Some(GeneratedAudio {
                bytes: result.audio_data,
                format: result.format,
            }),
            Ok(_) => {
                tracing::warn!("Speech backend returned no audio");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Scene narration failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        AudioResult, ImageGenError, ImageResult, MockImageGenPort, MockSpeechPort, Speaker,
        SpeechError,
    };
    use crate::test_fixtures::{
        pipeline_with, scene_json, test_settings, FailingImageGen, FailingSpeech, ScriptedLlm,
        StaticImageGen, StaticSpeech,
    };

    fn history_of_one_turn() -> History {
        let mut history = History::new();
        history.push(taleforge_domain::HistoryItem::model("Earlier."));
        history
    }

    #[tokio::test]
    async fn full_scene_carries_image_and_narration() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("A tower rises.", 3)));

        let pipeline = pipeline_with(
            llm.clone(),
            Arc::new(StaticImageGen::new()),
            Arc::new(StaticSpeech::new()),
        );

        let scene = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("scene generated");

        assert_eq!(scene.narrative(), "A tower rises.");
        assert!(scene.image().is_some());
        assert!(scene.narration().is_some());
        assert_eq!(llm.total_calls(), 1);
    }

    #[tokio::test]
    async fn image_failure_leaves_narration_intact() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("Ash falls.", 2)));
        let speech = Arc::new(StaticSpeech::new());

        let pipeline = pipeline_with(llm, Arc::new(FailingImageGen), speech.clone());

        let scene = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("asset failure does not fail the scene");

        assert!(scene.image().is_none());
        assert!(scene.narration().is_some());
        assert_eq!(speech.call_count(), 1);
    }

    #[tokio::test]
    async fn narration_failure_leaves_image_intact() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("Ash falls.", 2)));

        let pipeline = pipeline_with(llm, Arc::new(StaticImageGen::new()), Arc::new(FailingSpeech));

        let scene = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("asset failure does not fail the scene");

        assert!(scene.image().is_some());
        assert!(scene.narration().is_none());
    }

    #[tokio::test]
    async fn both_assets_failing_still_yields_a_scene() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("Silence.", 2)));

        let pipeline = pipeline_with(llm, Arc::new(FailingImageGen), Arc::new(FailingSpeech));

        let scene = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("scene generated");

        assert!(scene.image().is_none());
        assert!(scene.narration().is_none());
    }

    #[tokio::test]
    async fn narrative_failure_skips_asset_calls() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Err(LlmError::RequestFailed("timeout".to_string())));

        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().never();
        let mut speech = MockSpeechPort::new();
        speech.expect_synthesize().never();

        let pipeline = pipeline_with(llm, Arc::new(image_gen), Arc::new(speech));

        let result = pipeline.generate(&test_settings(), History::new(), None).await;

        assert!(matches!(result, Err(SceneGenerationError::Backend(_))));
    }

    #[tokio::test]
    async fn assets_are_requested_from_the_draft() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_for_intent("enter", Ok(scene_json("Inside the hall.", 2)));

        let mut image_gen = MockImageGenPort::new();
        image_gen
            .expect_generate()
            .withf(|request| {
                request.prompt == "Inside the hall., cinematic lighting"
                    && request.width == 768
                    && request.height == 512
            })
            .times(1)
            .returning(|_| {
                Ok(ImageResult {
                    image_data: vec![1, 2, 3],
                    format: "png".to_string(),
                })
            });

        let mut speech = MockSpeechPort::new();
        speech
            .expect_synthesize()
            .withf(|request| {
                request.segments.len() == 2
                    && request.segments[0].speaker == Speaker::Narrator
                    && request.segments[1].speaker == Speaker::Protagonist
            })
            .times(1)
            .returning(|_| {
                Ok(AudioResult {
                    audio_data: vec![9],
                    format: "mp3".to_string(),
                })
            });

        let pipeline = pipeline_with(llm, Arc::new(image_gen), Arc::new(speech));

        let scene = pipeline
            .generate(&test_settings(), history_of_one_turn(), Some("enter"))
            .await
            .expect("scene generated");

        assert_eq!(scene.image().map(|i| i.format.as_str()), Some("png"));
        assert_eq!(scene.narration().map(|a| a.bytes.clone()), Some(vec![9]));
    }

    #[tokio::test]
    async fn empty_asset_payloads_count_as_absent() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("Nothing to see.", 2)));

        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().returning(|_| {
            Ok(ImageResult {
                image_data: Vec::new(),
                format: "png".to_string(),
            })
        });
        let mut speech = MockSpeechPort::new();
        speech
            .expect_synthesize()
            .returning(|_| Err(SpeechError::EmptyScript));

        let pipeline = pipeline_with(llm, Arc::new(image_gen), Arc::new(speech));
        let scene = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("scene generated");

        assert!(scene.image().is_none());
        assert!(scene.narration().is_none());
    }

    #[tokio::test]
    async fn scene_ids_increase_across_generations() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_start(Ok(scene_json("One.", 2)));
        llm.push_start(Ok(scene_json("Two.", 2)));

        let mut image_gen = MockImageGenPort::new();
        image_gen
            .expect_generate()
            .returning(|_| Err(ImageGenError::Unavailable));
        let pipeline = pipeline_with(llm, Arc::new(image_gen), Arc::new(FailingSpeech));

        let first = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("first scene");
        let second = pipeline
            .generate(&test_settings(), History::new(), None)
            .await
            .expect("second scene");

        assert!(second.id() > first.id());
    }
}
