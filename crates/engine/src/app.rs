//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, ImageGenPort, LlmPort, SpeechPort};
use crate::use_cases::{
    ImageSettings, ScenePipeline, SceneWriter, SessionOptions, SessionRegistry,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub sessions: SessionRegistry,
}

impl App {
    /// Wire the scene pipeline and the session registry over the given ports.
    pub fn new(
        llm: Arc<dyn LlmPort>,
        image_gen: Arc<dyn ImageGenPort>,
        speech: Arc<dyn SpeechPort>,
        clock: Arc<dyn ClockPort>,
        image_settings: ImageSettings,
        options: SessionOptions,
    ) -> Self {
        let pipeline = Arc::new(ScenePipeline::new(
            SceneWriter::new(llm),
            image_gen,
            speech,
            image_settings,
        ));

        Self {
            sessions: SessionRegistry::new(pipeline, options, clock),
        }
    }
}
