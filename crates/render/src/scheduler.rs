use skilldex_protocol::{RenderChunk, RenderItem, SearchRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Produces the full ordered result list for one request. Supplied by the
/// engine; runs on the scheduler task.
pub type Executor = Box<dyn FnMut(&SearchRequest) -> Vec<RenderItem> + Send>;

/// Receives emitted chunks. The scheduler has no idea how chunks become
/// pixels.
pub type RenderSink = Box<dyn FnMut(RenderChunk) + Send>;

/// Timing and sizing knobs. None of these affect correctness, only how the
/// engine feels under typing bursts and large result lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Quiet period after the last `schedule` before the search runs.
    pub debounce: Duration,
    /// Pause between the first chunk and the remainder chunk.
    pub yield_delay: Duration,
    /// Item cap of the synchronous first chunk.
    pub initial_chunk: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            yield_delay: Duration::from_millis(15),
            initial_chunk: 30,
        }
    }
}

enum SchedulerCommand {
    Schedule { generation: u64, request: SearchRequest },
    Shutdown,
}

/// Cheap entry point into the scheduler task.
///
/// Each `schedule` call supersedes any pending or half-delivered earlier
/// one; there is no explicit cancel. Consumers compare every received
/// chunk's `generation` against [`latest_generation`](Self::latest_generation)
/// and drop mismatches.
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
    generation: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Queue a request, resetting the debounce window. Returns the
    /// generation assigned to it.
    pub fn schedule(&self, request: SearchRequest) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.tx.send(SchedulerCommand::Schedule {
            generation,
            request,
        });
        generation
    }

    /// Generation of the most recent `schedule` call.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stop the scheduler task. Dropping the handle has the same effect.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SchedulerCommand::Shutdown);
    }
}

/// Debounced, chunked search execution as one tokio task.
///
/// State machine: idle -> pending (debounce armed) -> executing (first
/// chunk emitted) -> yielding (remainder armed) -> idle. A new request in
/// any state moves straight back to pending and abandons undelivered work.
pub struct RenderScheduler;

struct PendingRequest {
    generation: u64,
    request: SearchRequest,
    deadline: Instant,
}

struct YieldingTail {
    generation: u64,
    items: Vec<RenderItem>,
    deadline: Instant,
}

impl RenderScheduler {
    pub fn spawn(config: SchedulerConfig, executor: Executor, sink: RenderSink) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        tokio::spawn(run_loop(config, executor, sink, rx));
        SchedulerHandle { tx, generation }
    }
}

async fn run_loop(
    config: SchedulerConfig,
    mut executor: Executor,
    mut sink: RenderSink,
    mut rx: mpsc::UnboundedReceiver<SchedulerCommand>,
) {
    let initial_chunk = config.initial_chunk.max(1);
    // At most one of these is armed: a new request cancels a yielding tail.
    let mut pending: Option<PendingRequest> = None;
    let mut tail: Option<YieldingTail> = None;

    loop {
        let deadline = pending
            .as_ref()
            .map(|p| p.deadline)
            .or_else(|| tail.as_ref().map(|t| t.deadline));

        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(SchedulerCommand::Schedule { generation, request }) => {
                    if tail.take().is_some() {
                        log::debug!("generation superseded while yielding");
                    }
                    pending = Some(PendingRequest {
                        generation,
                        request,
                        deadline: Instant::now() + config.debounce,
                    });
                }
                Some(SchedulerCommand::Shutdown) | None => break,
            },
            () = async {
                if let Some(deadline) = deadline {
                    time::sleep_until(deadline).await;
                }
            }, if deadline.is_some() => {
                if let Some(p) = pending.take() {
                    tail = execute(&mut executor, &mut sink, p, initial_chunk, config.yield_delay);
                } else if let Some(t) = tail.take() {
                    let count = t.items.len();
                    sink(RenderChunk {
                        items: t.items,
                        chunk_index: 1,
                        is_final: true,
                        generation: t.generation,
                    });
                    log::debug!("emitted remainder chunk of {count} items");
                }
            }
        }
    }
}

/// Run the search for the winning request and emit its first chunk. Returns
/// the armed remainder when the result list does not fit in one chunk.
fn execute(
    executor: &mut Executor,
    sink: &mut RenderSink,
    p: PendingRequest,
    initial_chunk: usize,
    yield_delay: Duration,
) -> Option<YieldingTail> {
    let mut items = executor(&p.request);
    log::debug!(
        "executing generation {} ('{}'): {} items",
        p.generation,
        p.request.query,
        items.len()
    );

    if items.len() <= initial_chunk {
        sink(RenderChunk {
            items,
            chunk_index: 0,
            is_final: true,
            generation: p.generation,
        });
        return None;
    }

    let rest = items.split_off(initial_chunk);
    sink(RenderChunk {
        items,
        chunk_index: 0,
        is_final: false,
        generation: p.generation,
    });
    Some(YieldingTail {
        generation: p.generation,
        items: rest,
        deadline: Instant::now() + yield_delay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use skilldex_protocol::{MatchKind, MatchResult};
    use std::sync::Mutex;

    fn scored(id: usize) -> RenderItem {
        RenderItem::Scored(MatchResult {
            entry_id: format!("entry_{id}"),
            score: 100.0,
            kind: MatchKind::Fuzzy,
            spans: vec![],
        })
    }

    fn collecting_sink() -> (Arc<Mutex<Vec<RenderChunk>>>, RenderSink) {
        let chunks: Arc<Mutex<Vec<RenderChunk>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_chunks = chunks.clone();
        let sink: RenderSink = Box::new(move |chunk| {
            sink_chunks.lock().unwrap().push(chunk);
        });
        (chunks, sink)
    }

    fn counting_executor(size: usize) -> (Arc<Mutex<Vec<String>>>, Executor) {
        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let exec_calls = calls.clone();
        let executor: Executor = Box::new(move |req: &SearchRequest| {
            exec_calls.lock().unwrap().push(req.query.clone());
            (0..size).map(scored).collect()
        });
        (calls, executor)
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            debounce: Duration::from_millis(100),
            yield_delay: Duration::from_millis(20),
            initial_chunk: 30,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn large_result_is_split_into_two_chunks() {
        let (chunks, sink) = collecting_sink();
        let (_, executor) = counting_executor(120);
        let handle = RenderScheduler::spawn(config(), executor, sink);

        let generation = handle.schedule(SearchRequest::new("fire"));
        time::sleep(Duration::from_millis(500)).await;

        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].items.len(), 30);
        assert_eq!(chunks[0].chunk_index, 0);
        assert!(!chunks[0].is_final);
        assert_eq!(chunks[1].items.len(), 90);
        assert_eq!(chunks[1].chunk_index, 1);
        assert!(chunks[1].is_final);
        assert!(chunks.iter().all(|c| c.generation == generation));
    }

    #[tokio::test(start_paused = true)]
    async fn small_result_is_one_final_chunk() {
        let (chunks, sink) = collecting_sink();
        let (_, executor) = counting_executor(7);
        let handle = RenderScheduler::spawn(config(), executor, sink);

        handle.schedule(SearchRequest::new("stun"));
        time::sleep(Duration::from_millis(500)).await;

        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].items.len(), 7);
        assert!(chunks[0].is_final);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_schedules_runs_only_the_last() {
        let (chunks, sink) = collecting_sink();
        let (calls, executor) = counting_executor(5);
        let handle = RenderScheduler::spawn(config(), executor, sink);

        for query in ["f", "fi", "fir", "fire", "fireb"] {
            handle.schedule(SearchRequest::new(query));
        }
        time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["fireb".to_string()]);
        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].generation, handle.latest_generation());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_within_debounce_resets_the_window() {
        let (_, sink) = collecting_sink();
        let (calls, executor) = counting_executor(1);
        let handle = RenderScheduler::spawn(config(), executor, sink);

        handle.schedule(SearchRequest::new("a"));
        time::sleep(Duration::from_millis(60)).await;
        handle.schedule(SearchRequest::new("ab"));
        // 60ms after the first call the window has been reset, so nothing
        // has run yet.
        time::sleep(Duration::from_millis(60)).await;
        assert!(calls.lock().unwrap().is_empty());

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["ab".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_tail_is_never_emitted() {
        let (chunks, sink) = collecting_sink();
        let calls: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let exec_calls = calls.clone();
        // First query yields 120 items, later ones 3.
        let executor: Executor = Box::new(move |req: &SearchRequest| {
            exec_calls.lock().unwrap().push(req.query.clone());
            let size = if req.query == "big" { 120 } else { 3 };
            (0..size).map(scored).collect()
        });
        let handle = RenderScheduler::spawn(config(), executor, sink);

        let first = handle.schedule(SearchRequest::new("big"));
        // Debounce expires at 100ms; the 90-item tail is armed for 120ms.
        time::sleep(Duration::from_millis(110)).await;
        let second = handle.schedule(SearchRequest::new("sm"));
        time::sleep(Duration::from_millis(500)).await;

        let chunks = chunks.lock().unwrap();
        assert_eq!(chunks.len(), 2);
        // First generation got its synchronous chunk but never a final one.
        assert_eq!(chunks[0].generation, first);
        assert!(!chunks[0].is_final);
        assert_eq!(chunks[0].items.len(), 30);
        // Second generation completed normally.
        assert_eq!(chunks[1].generation, second);
        assert!(chunks[1].is_final);
        assert_eq!(chunks[1].items.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn generations_are_monotonic() {
        let (_, sink) = collecting_sink();
        let (_, executor) = counting_executor(1);
        let handle = RenderScheduler::spawn(config(), executor, sink);

        let a = handle.schedule(SearchRequest::new("a"));
        let b = handle.schedule(SearchRequest::new("b"));
        assert!(b > a);
        assert_eq!(handle.latest_generation(), b);
        handle.shutdown();
    }
}
