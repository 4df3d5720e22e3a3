use crate::config::EngineConfig;
use crate::counts::CategoryCounter;
use crate::error::Result;
use crate::pipeline::SearchPipeline;
use skilldex_graph::{build_tree, detect_cycle, CycleReport, DependencyNode};
use skilldex_protocol::{CategoryCountsSnapshot, CorpusProvider, RenderItem, SearchRequest, UsageTracker};
use skilldex_render::{RenderScheduler, RenderSink, SchedulerConfig, SchedulerHandle};
use std::sync::{Arc, Mutex, MutexGuard};

/// Depth bound for reference-integrity traversals; deep enough for any
/// sane skill tree, shallow enough to stay cheap on hostile input.
pub const DEFAULT_REFERENCE_DEPTH: usize = 16;

/// One editor session's lookup state: result cache, category counts and
/// render scheduler. Sessions are independent; nothing is process-global,
/// and the corpus itself stays owned by the provider.
pub struct SessionContext {
    pipeline: Arc<Mutex<SearchPipeline>>,
    counter: CategoryCounter,
    scheduler_config: SchedulerConfig,
    scheduler: Option<SchedulerHandle>,
}

impl SessionContext {
    /// Build a session over a corpus provider and its dynamic subsets
    /// (Favorites, Recent, ...). Fails only on an invalid cache capacity.
    pub fn new(
        provider: Arc<dyn CorpusProvider + Send + Sync>,
        trackers: Vec<Box<dyn UsageTracker + Send>>,
        config: EngineConfig,
    ) -> Result<Self> {
        let pipeline = SearchPipeline::new(provider, trackers, config.cache_capacity, config.score)?;
        Ok(Self {
            pipeline: Arc::new(Mutex::new(pipeline)),
            counter: CategoryCounter::new(),
            scheduler_config: config.scheduler,
            scheduler: None,
        })
    }

    /// Spawn the debounced render path, delivering chunks to `sink`.
    /// Requires a running tokio runtime; a second call is ignored.
    pub fn start_scheduler(&mut self, sink: RenderSink) {
        if self.scheduler.is_some() {
            log::warn!("render scheduler already running for this session");
            return;
        }
        let pipeline = self.pipeline.clone();
        let executor = Box::new(move |request: &SearchRequest| {
            let mut guard = match pipeline.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match guard.search(request) {
                Ok(items) => (*items).clone(),
                Err(err) => {
                    log::warn!("scheduled search failed: {err}");
                    Vec::new()
                }
            }
        });
        self.scheduler = Some(RenderScheduler::spawn(
            self.scheduler_config.clone(),
            executor,
            sink,
        ));
    }

    /// Debounced search path. Returns the issued generation, or `None`
    /// while no scheduler is running.
    pub fn schedule(&self, request: SearchRequest) -> Option<u64> {
        self.scheduler.as_ref().map(|h| h.schedule(request))
    }

    /// Generation of the most recent `schedule` call, for chunk filtering.
    pub fn latest_generation(&self) -> Option<u64> {
        self.scheduler.as_ref().map(SchedulerHandle::latest_generation)
    }

    /// Synchronous search path: cached ranked results for one request.
    /// An empty result is a valid answer; `CorpusUnavailable` is not.
    pub fn search(&self, request: &SearchRequest) -> Result<Arc<Vec<RenderItem>>> {
        self.pipeline().search(request)
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline().is_ready()
    }

    /// Note a use of `id` under the tracker labeled `label` (e.g. insert
    /// into Recent). Patches counts and drops that label's cached results.
    pub fn record_usage(&mut self, label: &str, id: &str) {
        let delta = self.pipeline().record_usage(label, id);
        self.counter.patch(label, delta);
    }

    /// Toggle `id` in the tracker labeled `label` (e.g. Favorites).
    /// Returns whether the id is now a member. Counts are patched by the
    /// resulting ±1 without a corpus rescan.
    pub fn toggle(&mut self, label: &str, id: &str) -> bool {
        let (now_member, delta) = self.pipeline().toggle(label, id);
        self.counter.patch(label, delta);
        now_member
    }

    pub fn tracker_contains(&self, label: &str, id: &str) -> bool {
        self.pipeline().tracker_contains(label, id)
    }

    /// Full O(n) recount of every category and subset; bumps the counts
    /// generation. Fails while the corpus is unavailable.
    pub fn refresh_counts(&mut self) -> Result<u64> {
        let (corpus, subsets) = {
            let pipeline = self.pipeline();
            (pipeline.list_all()?, pipeline.subset_sizes())
        };
        Ok(self.counter.refresh(&corpus, subsets))
    }

    /// `None` until the first successful [`refresh_counts`](Self::refresh_counts).
    pub fn count(&self, category: &str) -> Option<usize> {
        self.counter.count(category)
    }

    pub fn counts_snapshot(&self) -> Option<CategoryCountsSnapshot> {
        self.counter.snapshot()
    }

    pub fn counts_stale(&self, generation: u64) -> bool {
        self.counter.is_stale(generation)
    }

    /// Probe whether adding a reference from `start` would close a cycle.
    /// `edges_of` resolves a skill name to the names it references,
    /// typically by parsing the skill's configuration lines.
    pub fn check_reference_cycle<F>(&self, start: &str, edges_of: F) -> CycleReport
    where
        F: Fn(&str) -> Vec<String>,
    {
        detect_cycle(start, edges_of, DEFAULT_REFERENCE_DEPTH)
    }

    /// Dependency tree under `start` for the reference view.
    pub fn dependency_tree<F>(&self, start: &str, edges_of: F, max_depth: usize) -> DependencyNode
    where
        F: Fn(&str) -> Vec<String>,
    {
        build_tree(start, edges_of, max_depth)
    }

    fn pipeline(&self) -> MutexGuard<'_, SearchPipeline> {
        match self.pipeline.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use pretty_assertions::assert_eq;
    use skilldex_protocol::CorpusEntry;

    /// Provider that has not loaded anything yet.
    struct ColdProvider;

    impl CorpusProvider for ColdProvider {
        fn is_ready(&self) -> bool {
            false
        }
        fn get_by_id(&self, _id: &str) -> Option<Arc<CorpusEntry>> {
            None
        }
        fn list_all(&self) -> Vec<Arc<CorpusEntry>> {
            Vec::new()
        }
        fn list_by_category(&self, _category: &str) -> Vec<Arc<CorpusEntry>> {
            Vec::new()
        }
    }

    fn cold_session() -> SessionContext {
        SessionContext::new(Arc::new(ColdProvider), Vec::new(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn unavailable_corpus_is_not_an_empty_result() {
        let session = cold_session();
        let err = session.search(&SearchRequest::new("fire")).unwrap_err();
        assert!(matches!(err, EngineError::CorpusUnavailable));
        assert_eq!(session.count("Damage"), None);
    }

    #[test]
    fn refresh_counts_requires_a_ready_corpus() {
        let mut session = cold_session();
        assert!(matches!(
            session.refresh_counts(),
            Err(EngineError::CorpusUnavailable)
        ));
    }

    #[test]
    fn schedule_without_scheduler_is_a_noop() {
        let session = cold_session();
        assert_eq!(session.schedule(SearchRequest::new("fire")), None);
        assert_eq!(session.latest_generation(), None);
    }

    #[test]
    fn invalid_cache_capacity_fails_construction() {
        let config = EngineConfig {
            cache_capacity: 0,
            ..EngineConfig::default()
        };
        let err = SessionContext::new(Arc::new(ColdProvider), Vec::new(), config).err();
        assert!(matches!(err, Some(EngineError::Cache(_))));
    }
}
