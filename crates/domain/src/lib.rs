//! Taleforge domain types.
//!
//! Pure value types shared by the engine: what the player chose at setup,
//! the scenes the story is made of, and the conversation history that drives
//! the narrative backend. No I/O lives here.

pub mod error;
pub mod history;
pub mod ids;
pub mod scene;
pub mod settings;

pub use error::DomainError;
pub use history::{History, HistoryItem, HistoryRole};
pub use ids::{SceneId, SceneIdSequence, SessionId};
pub use scene::{
    GeneratedAudio, GeneratedImage, MusicConfig, MusicMood, MusicTempo, SceneData, SceneDraft,
    SceneOption, MAX_OPTIONS, MIN_OPTIONS,
};
pub use settings::{GameSettings, Genre, Language, ProtagonistName};
