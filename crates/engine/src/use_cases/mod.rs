//! Use cases - story orchestration.
//!
//! - `scene` turns settings + history into a fully realized scene
//! - `prefetch` speculatively generates the outcome of every option
//! - `story` is the per-player state machine tying the two together
//! - `sessions` keeps the live stories of all players

pub mod prefetch;
pub mod scene;
pub mod sessions;
pub mod story;

pub use prefetch::{PendingScene, PrefetchCache};
pub use scene::{ImageSettings, SceneGenerationError, ScenePipeline, SceneWriter};
pub use sessions::{SessionError, SessionRegistry, SessionSummary};
pub use story::{SessionOptions, SessionPhase, SessionView, StoryError, StorySession};
