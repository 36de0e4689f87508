//! Session settings chosen once before the story starts.
//!
//! `GameSettings` is immutable: it is validated on construction (or
//! deserialization) and never changes for the lifetime of a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Maximum length for the protagonist name
const MAX_NAME_LENGTH: usize = 200;

/// Maximum length for free-form role and trait labels
const MAX_LABEL_LENGTH: usize = 100;

// ============================================================================
// Genre
// ============================================================================

/// Story genre, fixed per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Fantasy,
    SciFi,
    Cyberpunk,
    Noir,
    Pirate,
    PostApocalyptic,
    Eldritch,
}

impl Genre {
    /// All genres in presentation order
    pub fn all() -> &'static [Genre] {
        &[
            Genre::Fantasy,
            Genre::SciFi,
            Genre::Cyberpunk,
            Genre::Noir,
            Genre::Pirate,
            Genre::PostApocalyptic,
            Genre::Eldritch,
        ]
    }

    /// Name used in prompts and in the setup screen
    pub fn display_name(&self) -> &'static str {
        match self {
            Genre::Fantasy => "Fantasy",
            Genre::SciFi => "Sci-Fi",
            Genre::Cyberpunk => "Cyberpunk",
            Genre::Noir => "Noir Detective",
            Genre::Pirate => "Golden Age of Piracy",
            Genre::PostApocalyptic => "Post-Apocalyptic",
            Genre::Eldritch => "Lovecraftian Horror",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Genre::Fantasy => "Swords, sorcery, and ancient dragons.",
            Genre::SciFi => "Space exploration, aliens, and high-tech warfare.",
            Genre::Cyberpunk => "High tech, low life, neon lights and mega-corps.",
            Genre::Noir => "Shadowy streets, jazz, and unsolved mysteries.",
            Genre::Pirate => "High seas adventure, treasure, and naval battles.",
            Genre::PostApocalyptic => "Survival in a wasteland after the fall of civilization.",
            Genre::Eldritch => "Madness, cosmic entities, and the unknown.",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Language
// ============================================================================

/// Target language for narrative, dialogue and option text.
///
/// Serialized by its English name, which is also what the narrative backend
/// is told to write in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Japanese,
    Korean,
    Portuguese,
    Russian,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[
            Language::English,
            Language::Spanish,
            Language::French,
            Language::German,
            Language::Japanese,
            Language::Korean,
            Language::Portuguese,
            Language::Russian,
        ]
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
        }
    }

    /// The language's name written in itself
    pub fn native_label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Español",
            Language::French => "Français",
            Language::German => "Deutsch",
            Language::Japanese => "日本語",
            Language::Korean => "한국어",
            Language::Portuguese => "Português",
            Language::Russian => "Русский",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.english_name())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.english_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::parse(format!("Unsupported language: {}", s)))
    }
}

// ============================================================================
// ProtagonistName
// ============================================================================

/// A validated protagonist name (non-empty, <=200 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtagonistName(String);

impl ProtagonistName {
    /// Create a new validated protagonist name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty after trimming
    /// or exceeds 200 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Protagonist name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Protagonist name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtagonistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ProtagonistName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProtagonistName> for String {
    fn from(value: ProtagonistName) -> Self {
        value.0
    }
}

// ============================================================================
// GameSettings
// ============================================================================

/// Everything the player picks before the first scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGameSettings", into = "RawGameSettings")]
pub struct GameSettings {
    protagonist_name: ProtagonistName,
    genre: Genre,
    role: String,
    character_trait: String,
    language: Language,
}

impl GameSettings {
    pub fn new(
        protagonist_name: ProtagonistName,
        genre: Genre,
        role: impl Into<String>,
        character_trait: impl Into<String>,
        language: Language,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            protagonist_name,
            genre,
            role: validate_label("Role", role.into())?,
            character_trait: validate_label("Trait", character_trait.into())?,
            language,
        })
    }

    pub fn protagonist_name(&self) -> &ProtagonistName {
        &self.protagonist_name
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn character_trait(&self) -> &str {
        &self.character_trait
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

fn validate_label(field: &str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > MAX_LABEL_LENGTH {
        return Err(DomainError::validation(format!(
            "{} cannot exceed {} characters",
            field, MAX_LABEL_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Wire shape of [`GameSettings`]; validated on the way in.
#[derive(Serialize, Deserialize)]
struct RawGameSettings {
    protagonist_name: String,
    genre: Genre,
    role: String,
    #[serde(rename = "trait")]
    character_trait: String,
    language: Language,
}

impl TryFrom<RawGameSettings> for GameSettings {
    type Error = DomainError;

    fn try_from(raw: RawGameSettings) -> Result<Self, Self::Error> {
        GameSettings::new(
            ProtagonistName::new(raw.protagonist_name)?,
            raw.genre,
            raw.role,
            raw.character_trait,
            raw.language,
        )
    }
}

impl From<GameSettings> for RawGameSettings {
    fn from(settings: GameSettings) -> Self {
        Self {
            protagonist_name: settings.protagonist_name.into(),
            genre: settings.genre,
            role: settings.role,
            character_trait: settings.character_trait,
            language: settings.language,
        }
    }
}
