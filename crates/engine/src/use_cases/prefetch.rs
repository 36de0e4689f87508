//! Speculative prefetch of next scenes.
//!
//! When a scene becomes current, the outcome of every one of its options is
//! generated in the background. A selection then claims the matching entry
//! and awaits it, which is instant when the work has already finished.
//!
//! Entries are keyed by option position in the scene that owns the cache.
//! Only one generation of entries is live at a time: repopulating for a new
//! scene drops every previous entry. Dropped entries are not cancelled; their
//! tasks run to completion and the results are discarded.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use taleforge_domain::{GameSettings, History, SceneData, SceneId};

use super::scene::{SceneGenerationError, ScenePipeline};

/// A pending or settled next-scene computation. Cloning shares the same work.
pub type PendingScene =
    Shared<BoxFuture<'static, Result<Arc<SceneData>, SceneGenerationError>>>;

pub struct PrefetchCache {
    pipeline: Arc<ScenePipeline>,
    owner: Option<SceneId>,
    entries: HashMap<usize, PendingScene>,
}

impl PrefetchCache {
    pub fn new(pipeline: Arc<ScenePipeline>) -> Self {
        Self {
            pipeline,
            owner: None,
            entries: HashMap::new(),
        }
    }

    /// Replace all entries with fresh generations for every option of `scene`.
    ///
    /// `history` is the log up to, but not including, `scene`'s narrative.
    /// Returns `false` without doing anything when `scene` already owns the
    /// live entries.
    pub fn repopulate(
        &mut self,
        settings: &GameSettings,
        scene: &SceneData,
        history: &History,
    ) -> bool {
        if self.owner == Some(scene.id()) {
            tracing::debug!(scene_id = %scene.id(), "Prefetch already live for scene");
            return false;
        }

        self.clear();
        self.owner = Some(scene.id());

        let settings = Arc::new(settings.clone());
        let base = history.with_narrative(scene.narrative());

        for (index, option) in scene.options().iter().enumerate() {
            let pending = spawn_branch(
                self.pipeline.clone(),
                settings.clone(),
                base.with_choice(option),
                option.intent.clone(),
                index,
            );
            self.entries.insert(index, pending);
        }

        tracing::debug!(
            scene_id = %scene.id(),
            branches = self.entries.len(),
            "Prefetching next scenes"
        );
        true
    }

    /// The computation for option `index`, if one is live.
    ///
    /// The entry stays in place; claiming again yields the same outcome.
    pub fn try_claim(&self, index: usize) -> Option<PendingScene> {
        self.entries.get(&index).cloned()
    }

    /// Drop every entry and forget the owning scene.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.owner = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scene whose options the live entries belong to.
    pub fn scene_id(&self) -> Option<SceneId> {
        self.owner
    }
}

fn spawn_branch(
    pipeline: Arc<ScenePipeline>,
    settings: Arc<GameSettings>,
    history: History,
    intent: String,
    index: usize,
) -> PendingScene {
    let handle = tokio::spawn(async move {
        let result = pipeline.generate(&settings, history, Some(&intent)).await;
        if let Err(e) = &result {
            tracing::warn!(option_index = index, error = %e, "Prefetch failed for option");
        }
        result.map(Arc::new)
    });

    handle
        .map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(SceneGenerationError::TaskFailed(e.to_string())),
        })
        .boxed()
        .shared()
}
