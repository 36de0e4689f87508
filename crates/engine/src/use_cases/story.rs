//! Story session: the selection coordinator.
//!
//! Owns the current scene, the history and the prefetch cache of one player
//! and moves them through the session phases:
//!
//! ```text
//! NoSession --start--> Awaiting --ok--> Idle --select--> Awaiting --ok--> Idle
//!     ^                    |                                  |
//!     +-----failure--------+                      failure x2  +--> Error
//! ```
//!
//! A selection claims the prefetched outcome for the chosen option when one
//! is live and generates it fresh otherwise. A failed outcome is retried
//! exactly once, without consulting the cache, before the session fails.
//!
//! Both `start` and selections are split into a synchronous `prepare_*` step,
//! which validates the phase and records history under the session lock, and
//! an async `resolve_*` step that does the backend work. Callers that must
//! answer quickly (the HTTP layer) run the resolve step on a spawned task.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use taleforge_domain::{GameSettings, History, SceneData, SceneOption};

use super::prefetch::{PendingScene, PrefetchCache};
use super::scene::{SceneGenerationError, ScenePipeline};

/// Shown after the opening scene could not be generated.
pub const START_FAILED_MESSAGE: &str = "Failed to start the story. Please try again.";

/// Shown when a selection failed even after its retry.
pub const SELECTION_FAILED_MESSAGE: &str = "The story path crumbled. Please try selecting again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Not started, or the last start failed
    NoSession,
    /// A scene is being produced
    Awaiting,
    /// A scene is displayed and accepts a selection
    Idle,
    /// A selection failed twice; terminal
    Error,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::NoSession => "no_session",
            SessionPhase::Awaiting => "awaiting",
            SessionPhase::Idle => "idle",
            SessionPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoryError {
    #[error("Cannot {action} while the session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("Option {index} does not exist in the current scene")]
    UnknownOption { index: usize },
    #[error("Option \"{0}\" is not offered by the current scene")]
    OptionNotOffered(String),
    #[error("Scene generation failed: {0}")]
    Generation(#[from] SceneGenerationError),
}

/// Per-session behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Generate every option's outcome as soon as a scene is shown
    pub speculative_prefetch: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            speculative_prefetch: true,
        }
    }
}

/// Snapshot of a session for presentation.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub scene: Option<Arc<SceneData>>,
    pub awaiting: bool,
    pub error_message: Option<String>,
    pub history_len: usize,
    pub settings: Option<GameSettings>,
}

/// Work handed from `prepare_selection` to `resolve_selection`.
pub struct PendingSelection {
    index: usize,
    intent: String,
    history: History,
    settings: Arc<GameSettings>,
    claim: Option<PendingScene>,
}

impl PendingSelection {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether a prefetched computation was claimed for this selection.
    pub fn is_prefetched(&self) -> bool {
        self.claim.is_some()
    }
}

struct SessionState {
    phase: SessionPhase,
    settings: Option<Arc<GameSettings>>,
    current: Option<Arc<SceneData>>,
    history: History,
    cache: PrefetchCache,
    error_message: Option<String>,
}

pub struct StorySession {
    pipeline: Arc<ScenePipeline>,
    options: SessionOptions,
    state: Mutex<SessionState>,
}

impl StorySession {
    pub fn new(pipeline: Arc<ScenePipeline>, options: SessionOptions) -> Self {
        let cache = PrefetchCache::new(pipeline.clone());
        Self {
            pipeline,
            options,
            state: Mutex::new(SessionState {
                phase: SessionPhase::NoSession,
                settings: None,
                current: None,
                history: History::new(),
                cache,
                error_message: None,
            }),
        }
    }

    // =========================================================================
    // Start
    // =========================================================================

    /// Start the story and wait for the opening scene.
    pub async fn start(&self, settings: GameSettings) -> Result<(), StoryError> {
        self.prepare_start(settings).await?;
        self.resolve_start().await
    }

    /// Accept `settings` and enter `Awaiting`. Only valid from `NoSession`.
    pub async fn prepare_start(&self, settings: GameSettings) -> Result<(), StoryError> {
        let mut state = self.state.lock().await;
        if state.phase != SessionPhase::NoSession {
            return Err(StoryError::InvalidPhase {
                action: "start",
                phase: state.phase,
            });
        }

        state.settings = Some(Arc::new(settings));
        state.history = History::new();
        state.error_message = None;
        state.phase = SessionPhase::Awaiting;
        Ok(())
    }

    /// Generate the opening scene for a prepared start.
    pub async fn resolve_start(&self) -> Result<(), StoryError> {
        let settings = {
            let state = self.state.lock().await;
            match (&state.settings, state.phase) {
                (Some(settings), SessionPhase::Awaiting) if state.current.is_none() => {
                    settings.clone()
                }
                _ => {
                    return Err(StoryError::InvalidPhase {
                        action: "finish starting",
                        phase: state.phase,
                    })
                }
            }
        };

        let outcome = self.pipeline.generate(&settings, History::new(), None).await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(scene) => {
                tracing::info!(scene_id = %scene.id(), "Story started");
                self.commit(&mut state, Arc::new(scene));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start story");
                state.phase = SessionPhase::NoSession;
                state.settings = None;
                state.error_message = Some(START_FAILED_MESSAGE.to_string());
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Choose option `index` of the current scene and wait for the next one.
    pub async fn select_option(&self, index: usize) -> Result<(), StoryError> {
        let pending = self.prepare_selection(index).await?;
        self.resolve_selection(pending).await
    }

    /// Choose the first option of the current scene equal to `option`.
    pub async fn select_option_value(&self, option: &SceneOption) -> Result<(), StoryError> {
        let pending = self.prepare_selection_value(option).await?;
        self.resolve_selection(pending).await
    }

    /// Validate the choice, record it in the history and claim its prefetch.
    ///
    /// Leaves the session `Awaiting`; the returned work must be passed to
    /// [`StorySession::resolve_selection`].
    pub async fn prepare_selection(&self, index: usize) -> Result<PendingSelection, StoryError> {
        let mut state = self.state.lock().await;
        Self::record_choice(&mut state, index)
    }

    /// Like [`StorySession::prepare_selection`], resolving `option` to the
    /// position of its first occurrence in the current scene.
    pub async fn prepare_selection_value(
        &self,
        option: &SceneOption,
    ) -> Result<PendingSelection, StoryError> {
        let mut state = self.state.lock().await;
        Self::ensure_idle(&state, "select an option")?;
        let index = state
            .current
            .as_ref()
            .and_then(|scene| scene.position_of(option))
            .ok_or_else(|| StoryError::OptionNotOffered(option.text.clone()))?;

        Self::record_choice(&mut state, index)
    }

    fn record_choice(
        state: &mut SessionState,
        index: usize,
    ) -> Result<PendingSelection, StoryError> {
        Self::ensure_idle(state, "select an option")?;

        let (Some(scene), Some(settings)) = (state.current.clone(), state.settings.clone()) else {
            return Err(StoryError::InvalidPhase {
                action: "select an option",
                phase: state.phase,
            });
        };
        let option = scene
            .option(index)
            .ok_or(StoryError::UnknownOption { index })?
            .clone();

        state.history.record_selection(scene.narrative(), &option);
        let claim = state.cache.try_claim(index);
        state.phase = SessionPhase::Awaiting;

        tracing::info!(
            scene_id = %scene.id(),
            option_index = index,
            prefetched = claim.is_some(),
            "Option selected"
        );

        Ok(PendingSelection {
            index,
            intent: option.intent,
            history: state.history.clone(),
            settings,
            claim,
        })
    }

    /// Produce the scene for a prepared selection, retrying once on failure.
    pub async fn resolve_selection(&self, pending: PendingSelection) -> Result<(), StoryError> {
        let first = match pending.claim.clone() {
            Some(claim) => claim.await,
            None => self.generate_next(&pending).await,
        };

        let outcome = match first {
            Ok(scene) => Ok(scene),
            Err(e) => {
                tracing::warn!(
                    option_index = pending.index,
                    error = %e,
                    "Next scene failed, retrying once"
                );
                self.generate_next(&pending).await
            }
        };

        let mut state = self.state.lock().await;
        match outcome {
            Ok(scene) => {
                self.commit(&mut state, scene);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    option_index = pending.index,
                    error = %e,
                    "Selection failed after retry"
                );
                state.phase = SessionPhase::Error;
                state.error_message = Some(SELECTION_FAILED_MESSAGE.to_string());
                Err(e.into())
            }
        }
    }

    async fn generate_next(
        &self,
        pending: &PendingSelection,
    ) -> Result<Arc<SceneData>, SceneGenerationError> {
        self.pipeline
            .generate(&pending.settings, pending.history.clone(), Some(&pending.intent))
            .await
            .map(Arc::new)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn view(&self) -> SessionView {
        let state = self.state.lock().await;
        SessionView {
            phase: state.phase,
            scene: state.current.clone(),
            awaiting: state.phase == SessionPhase::Awaiting,
            error_message: state.error_message.clone(),
            history_len: state.history.len(),
            settings: state.settings.as_deref().cloned(),
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn history(&self) -> History {
        self.state.lock().await.history.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_idle(state: &SessionState, action: &'static str) -> Result<(), StoryError> {
        if state.phase == SessionPhase::Idle {
            Ok(())
        } else {
            Err(StoryError::InvalidPhase {
                action,
                phase: state.phase,
            })
        }
    }

    /// Make `scene` current, repopulate the cache and go `Idle`, all under
    /// the caller's lock.
    fn commit(&self, state: &mut SessionState, scene: Arc<SceneData>) {
        if self.options.speculative_prefetch {
            if let Some(settings) = state.settings.clone() {
                state.cache.repopulate(&settings, &scene, &state.history);
            }
        } else {
            state.cache.clear();
        }

        tracing::debug!(
            scene_id = %scene.id(),
            history_len = state.history.len(),
            "Scene committed"
        );

        state.current = Some(scene);
        state.error_message = None;
        state.phase = SessionPhase::Idle;
    }
}
