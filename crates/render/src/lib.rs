//! # Skilldex Render
//!
//! Incremental result delivery: debounces bursts of search requests,
//! executes only the latest one, and hands the ordered result list to the
//! render sink in consumer-sized chunks tagged with a generation so late
//! chunks from superseded requests can be discarded.

mod scheduler;

pub use scheduler::{Executor, RenderScheduler, RenderSink, SchedulerConfig, SchedulerHandle};
