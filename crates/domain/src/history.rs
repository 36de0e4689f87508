//! Conversation history fed back to the narrative backend.
//!
//! The history is append-only: turns are pushed in order and never removed or
//! rewritten. Branching for speculative work happens by cloning into a new
//! `History` value, never by mutating a shared one.

use serde::{Deserialize, Serialize};

use crate::scene::SceneOption;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// The player's choice
    User,
    /// A narrative beat written by the backend
    Model,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub role: HistoryRole,
    pub parts: Vec<String>,
}

impl HistoryItem {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Model,
            parts: vec![text.into()],
        }
    }

    /// The user turn recorded when the player picks `option`
    pub fn choice(option: &SceneOption) -> Self {
        Self::user(format!("I choose to: {}", option.text))
    }

    /// All segments joined with newlines
    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

/// Ordered, append-only log of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    items: Vec<HistoryItem>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
    }

    /// Record a completed transition: the narrative the player saw, then the
    /// choice they made.
    pub fn record_selection(&mut self, narrative: &str, option: &SceneOption) {
        self.push(HistoryItem::model(narrative));
        self.push(HistoryItem::choice(option));
    }

    /// A copy of this history with the model turn for `narrative` appended
    pub fn with_narrative(&self, narrative: &str) -> Self {
        let mut next = self.clone();
        next.push(HistoryItem::model(narrative));
        next
    }

    /// A copy of this history with the user turn for `option` appended
    pub fn with_choice(&self, option: &SceneOption) -> Self {
        let mut next = self.clone();
        next.push(HistoryItem::choice(option));
        next
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryItem> {
        self.items.last()
    }
}
