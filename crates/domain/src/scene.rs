//! Scene - one narrative beat with its options and optional media
//!
//! A [`SceneDraft`] is what the narrative backend hands back: text, a visual
//! prompt, a music cue and the choices. The pipeline turns a validated draft
//! into a [`SceneData`] by assigning an id and attaching whatever image and
//! narration it managed to produce.
//!
//! `SceneData` is immutable. Every player action yields a brand-new scene.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::ids::SceneId;

/// Fewest options a scene may offer
pub const MIN_OPTIONS: usize = 2;

/// Most options a scene may offer
pub const MAX_OPTIONS: usize = 4;

/// A choice offered to the player.
///
/// Options are identified by their position in the owning scene, not by
/// content: two options may legitimately carry the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneOption {
    /// What the player reads (target language)
    pub text: String,
    /// What the player means (English), fed back to the narrative backend
    pub intent: String,
}

impl SceneOption {
    pub fn new(text: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            intent: intent.into(),
        }
    }
}

// ============================================================================
// Music
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicMood {
    Epic,
    Mysterious,
    Ominous,
    Melancholic,
    Cybernetic,
    Peaceful,
    Action,
}

impl MusicMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicMood::Epic => "epic",
            MusicMood::Mysterious => "mysterious",
            MusicMood::Ominous => "ominous",
            MusicMood::Melancholic => "melancholic",
            MusicMood::Cybernetic => "cybernetic",
            MusicMood::Peaceful => "peaceful",
            MusicMood::Action => "action",
        }
    }
}

impl fmt::Display for MusicMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicTempo {
    Slow,
    Medium,
    Fast,
}

impl MusicTempo {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicTempo::Slow => "slow",
            MusicTempo::Medium => "medium",
            MusicTempo::Fast => "fast",
        }
    }
}

impl fmt::Display for MusicTempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mood and tempo cue for the background score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicConfig {
    pub mood: MusicMood,
    pub tempo: MusicTempo,
}

// ============================================================================
// Media
// ============================================================================

/// Rendered scene illustration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// File format, e.g. "png"
    pub format: String,
}

/// Synthesized narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAudio {
    pub bytes: Vec<u8>,
    /// File format, e.g. "mp3"
    pub format: String,
}

// ============================================================================
// SceneDraft
// ============================================================================

/// Structured narrative beat as returned by the narrative backend.
///
/// Field names follow the JSON contract the backend is prompted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDraft {
    pub narrative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    pub visual_prompt: String,
    pub music_config: MusicConfig,
    pub options: Vec<SceneOption>,
}

impl SceneDraft {
    /// Check the draft against scene invariants and normalize it.
    ///
    /// Blank dialogue collapses to `None`; surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the narrative or visual prompt is
    /// blank, if there are fewer than 2 or more than 4 options, or if any
    /// option has blank text or intent.
    pub fn into_validated(self) -> Result<Self, DomainError> {
        let narrative = self.narrative.trim().to_string();
        if narrative.is_empty() {
            return Err(DomainError::validation("Scene narrative cannot be empty"));
        }

        let visual_prompt = self.visual_prompt.trim().to_string();
        if visual_prompt.is_empty() {
            return Err(DomainError::validation("Scene visual prompt cannot be empty"));
        }

        let count = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            return Err(DomainError::validation(format!(
                "Scene must offer between {} and {} options, got {}",
                MIN_OPTIONS, MAX_OPTIONS, count
            )));
        }

        let mut options = Vec::with_capacity(count);
        for (index, option) in self.options.into_iter().enumerate() {
            let text = option.text.trim();
            let intent = option.intent.trim();
            if text.is_empty() || intent.is_empty() {
                return Err(DomainError::validation(format!(
                    "Option {} must have both text and intent",
                    index
                )));
            }
            options.push(SceneOption::new(text, intent));
        }

        let dialogue = self
            .dialogue
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            narrative,
            dialogue,
            visual_prompt,
            music_config: self.music_config,
            options,
        })
    }
}

// ============================================================================
// SceneData
// ============================================================================

/// A fully realized scene: the unit of narrative progress.
///
/// # Invariants
///
/// - `options` holds between 2 and 4 entries (enforced by the draft)
/// - image and narration are independently optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneData {
    id: SceneId,
    narrative: String,
    dialogue: Option<String>,
    visual_prompt: String,
    options: Vec<SceneOption>,
    music: MusicConfig,
    image: Option<GeneratedImage>,
    narration: Option<GeneratedAudio>,
}

impl SceneData {
    /// Build a scene from an already validated draft.
    pub fn new(id: SceneId, draft: SceneDraft) -> Self {
        Self {
            id,
            narrative: draft.narrative,
            dialogue: draft.dialogue,
            visual_prompt: draft.visual_prompt,
            options: draft.options,
            music: draft.music_config,
            image: None,
            narration: None,
        }
    }

    pub fn with_image(mut self, image: Option<GeneratedImage>) -> Self {
        self.image = image;
        self
    }

    pub fn with_narration(mut self, narration: Option<GeneratedAudio>) -> Self {
        self.narration = narration;
        self
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn dialogue(&self) -> Option<&str> {
        self.dialogue.as_deref()
    }

    pub fn visual_prompt(&self) -> &str {
        &self.visual_prompt
    }

    pub fn options(&self) -> &[SceneOption] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&SceneOption> {
        self.options.get(index)
    }

    /// Index of the first option equal to `option`.
    ///
    /// Duplicated options resolve to the earliest position.
    pub fn position_of(&self, option: &SceneOption) -> Option<usize> {
        self.options.iter().position(|candidate| candidate == option)
    }

    pub fn music(&self) -> MusicConfig {
        self.music
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        self.image.as_ref()
    }

    pub fn narration(&self) -> Option<&GeneratedAudio> {
        self.narration.as_ref()
    }
}
