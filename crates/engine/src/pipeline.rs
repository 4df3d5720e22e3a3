use crate::error::{EngineError, Result};
use skilldex_cache::CacheLayer;
use skilldex_protocol::{CorpusEntry, CorpusProvider, RenderItem, SearchRequest, UsageTracker};
use skilldex_search::{rank, ScoreParams};
use std::sync::Arc;

/// `(category, normalized query, context)`, see [`SearchRequest::cache_key`].
type ResultKey = (String, String, String);

/// The synchronous half of a session: corpus access, ranking, result
/// memoization, and the dynamic usage subsets. Shared between the session
/// surface and the scheduler task behind a mutex.
pub(crate) struct SearchPipeline {
    provider: Arc<dyn CorpusProvider + Send + Sync>,
    trackers: Vec<Box<dyn UsageTracker + Send>>,
    cache: CacheLayer<ResultKey, Arc<Vec<RenderItem>>>,
    score: ScoreParams,
}

impl SearchPipeline {
    pub(crate) fn new(
        provider: Arc<dyn CorpusProvider + Send + Sync>,
        trackers: Vec<Box<dyn UsageTracker + Send>>,
        cache_capacity: usize,
        score: ScoreParams,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            trackers,
            cache: CacheLayer::new(cache_capacity)?,
            score,
        })
    }

    /// Cached lookup: on a miss the corpus slice for the request's category
    /// is resolved and ranked. An empty query lists the slice unscored in
    /// catalogue order (a valid result, not an error).
    pub(crate) fn search(&mut self, request: &SearchRequest) -> Result<Arc<Vec<RenderItem>>> {
        let key = request.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("result cache hit for {key:?}");
            return Ok(hit.clone());
        }

        let entries = self.resolve_entries(request.category.as_deref())?;
        let trimmed = request.query.trim();
        let items: Vec<RenderItem> = if trimmed.is_empty() {
            entries.into_iter().map(RenderItem::Entry).collect()
        } else {
            rank(trimmed, &entries, request.context.as_deref(), &self.score)
                .into_iter()
                .map(RenderItem::Scored)
                .collect()
        };

        let items = Arc::new(items);
        self.cache.put(key, items.clone());
        Ok(items)
    }

    /// Corpus slice for a category tab: a dynamic subset when the name is
    /// a tracker label (MRU order), otherwise the provider's listing.
    fn resolve_entries(&self, category: Option<&str>) -> Result<Vec<Arc<CorpusEntry>>> {
        if !self.provider.is_ready() {
            return Err(EngineError::CorpusUnavailable);
        }
        let Some(category) = category else {
            return Ok(self.provider.list_all());
        };
        if let Some(tracker) = self.trackers.iter().find(|t| t.label() == category) {
            let entries = tracker
                .ids()
                .iter()
                .filter_map(|id| self.provider.get_by_id(id))
                .collect();
            return Ok(entries);
        }
        Ok(self.provider.list_by_category(category))
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.provider.is_ready()
    }

    pub(crate) fn list_all(&self) -> Result<Vec<Arc<CorpusEntry>>> {
        if !self.provider.is_ready() {
            return Err(EngineError::CorpusUnavailable);
        }
        Ok(self.provider.list_all())
    }

    /// `(label, size)` of every dynamic subset, for count refreshes.
    pub(crate) fn subset_sizes(&self) -> Vec<(String, usize)> {
        self.trackers
            .iter()
            .map(|t| (t.label().to_string(), t.len()))
            .collect()
    }

    /// Move `id` to the front of the tracker with `label`. Returns the
    /// subset size delta (0 or 1, or 0 on an unknown label).
    pub(crate) fn record_usage(&mut self, label: &str, id: &str) -> i32 {
        let Some(tracker) = self.trackers.iter_mut().find(|t| t.label() == label) else {
            log::warn!("record_usage on unknown tracker '{label}'");
            return 0;
        };
        let before = tracker.len();
        tracker.record(id);
        let delta = tracker.len() as i32 - before as i32;
        self.invalidate_category(label);
        delta
    }

    /// Toggle `id` in the tracker with `label`. Returns `(now_member,
    /// size delta)`; membership is unchanged for an unknown label.
    pub(crate) fn toggle(&mut self, label: &str, id: &str) -> (bool, i32) {
        let Some(tracker) = self.trackers.iter_mut().find(|t| t.label() == label) else {
            log::warn!("toggle on unknown tracker '{label}'");
            return (false, 0);
        };
        let before = tracker.len();
        let now_member = if tracker.contains(id) {
            tracker.remove(id);
            false
        } else {
            tracker.record(id);
            true
        };
        let delta = tracker.len() as i32 - before as i32;
        self.invalidate_category(label);
        (now_member, delta)
    }

    pub(crate) fn tracker_contains(&self, label: &str, id: &str) -> bool {
        self.trackers
            .iter()
            .find(|t| t.label() == label)
            .is_some_and(|t| t.contains(id))
    }

    /// Drop only the cached result lists under one category tab.
    fn invalidate_category(&mut self, category: &str) {
        self.cache.invalidate_where(|(cat, _, _)| cat == category);
    }
}
