//! Registry of live story sessions.
//!
//! Each player drives one [`StorySession`] addressed by a [`SessionId`].
//! Backend work is launched on spawned tasks so callers get an answer as
//! soon as the request has been validated and recorded.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use taleforge_domain::{GameSettings, SessionId};

use super::scene::ScenePipeline;
use super::story::{SessionOptions, SessionPhase, SessionView, StoryError, StorySession};
use crate::infrastructure::ports::ClockPort;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error(transparent)]
    Story(#[from] StoryError),
}

/// Listing entry for a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
}

struct SessionEntry {
    session: Arc<StorySession>,
    started_at: DateTime<Utc>,
}

pub struct SessionRegistry {
    pipeline: Arc<ScenePipeline>,
    options: SessionOptions,
    clock: Arc<dyn ClockPort>,
    sessions: DashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    pub fn new(
        pipeline: Arc<ScenePipeline>,
        options: SessionOptions,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            pipeline,
            options,
            clock,
            sessions: DashMap::new(),
        }
    }

    /// Register a new session and generate its opening scene in the background.
    pub async fn create(&self, settings: GameSettings) -> Result<SessionId, SessionError> {
        let id = SessionId::new();
        let session = Arc::new(StorySession::new(self.pipeline.clone(), self.options));
        session.prepare_start(settings).await?;

        self.sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                started_at: self.clock.now(),
            },
        );
        tracing::info!(session_id = %id, "Session created");

        tokio::spawn(async move {
            if let Err(e) = session.resolve_start().await {
                tracing::warn!(session_id = %id, error = %e, "Session failed to start");
            }
        });

        Ok(id)
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<StorySession>> {
        self.sessions.get(&id).map(|entry| entry.session.clone())
    }

    pub async fn view(&self, id: SessionId) -> Result<SessionView, SessionError> {
        let session = self.get(id).ok_or(SessionError::NotFound(id))?;
        Ok(session.view().await)
    }

    /// Record the choice of option `index` and resolve it in the background.
    ///
    /// Phase and index are validated before returning; the returned view is
    /// taken right after the choice was recorded.
    pub async fn select(&self, id: SessionId, index: usize) -> Result<SessionView, SessionError> {
        let session = self.get(id).ok_or(SessionError::NotFound(id))?;
        let pending = session.prepare_selection(index).await?;
        let view = session.view().await;
        tracing::debug!(
            session_id = %id,
            option_index = pending.index(),
            prefetched = pending.is_prefetched(),
            "Resolving selection in background"
        );

        tokio::spawn(async move {
            if let Err(e) = session.resolve_selection(pending).await {
                tracing::warn!(session_id = %id, error = %e, "Selection failed");
            }
        });

        Ok(view)
    }

    /// Forget a session. In-flight work finishes and is discarded.
    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Drop sessions that failed and were started more than `retention` ago.
    ///
    /// A failed session is one whose start failed (`NoSession`) or whose
    /// selection failed twice (`Error`). Returns how many were removed.
    pub async fn reap_failed(&self, retention: Duration) -> usize {
        let Some(cutoff) = self.clock.now().checked_sub_signed(retention) else {
            return 0;
        };
        let candidates: Vec<(SessionId, Arc<StorySession>)> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().started_at <= cutoff)
            .map(|entry| (*entry.key(), entry.value().session.clone()))
            .collect();

        let mut reaped = 0;
        for (id, session) in candidates {
            let phase = session.phase().await;
            if matches!(phase, SessionPhase::NoSession | SessionPhase::Error)
                && self.sessions.remove(&id).is_some()
            {
                tracing::info!(session_id = %id, phase = %phase, "Reaped failed session");
                reaped += 1;
            }
        }
        reaped
    }

    /// Live sessions, oldest first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| SessionSummary {
                id: *entry.key(),
                started_at: entry.value().started_at,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.started_at);
        summaries
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
