//! # Skilldex Engine
//!
//! Per-session glue over the lookup stack: one result cache, one category
//! counter, one render scheduler per editor session, with nothing global.
//!
//! ## Query flow
//!
//! ```text
//! (category, query, context)
//!     │
//!     ├──> CacheLayer ── hit ──> Arc<Vec<RenderItem>>
//!     │        │miss
//!     │        └──> CorpusProvider ──> Ranker ──> cache fill
//!     │
//!     └──> RenderScheduler (debounced path) ──> RenderChunk sink
//! ```
//!
//! Favorites/Recent are [`UsageTracker`](skilldex_protocol::UsageTracker)
//! subsets; toggling one patches the category counts by ±1 and drops only
//! the cache entries under that subset's label, never the whole cache.

mod config;
mod counts;
mod error;
mod pipeline;
mod session;

pub use config::{EngineConfig, DEFAULT_RESULT_CACHE_CAPACITY, RESULT_CACHE_CAPACITY_ENV};
pub use counts::CategoryCounter;
pub use error::{EngineError, Result};
pub use session::{SessionContext, DEFAULT_REFERENCE_DEPTH};

pub use skilldex_graph::{CycleReport, DependencyNode};
