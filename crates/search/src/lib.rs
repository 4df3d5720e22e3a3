//! # Skilldex Search
//!
//! Pure ranking over the mechanic/skill corpus: tiered case-insensitive
//! matching (exact, prefix, substring, subsequence) with char-offset
//! highlight spans and an optional context-affinity bonus.
//!
//! `rank` is deterministic and side-effect free, so the engine memoizes
//! its output per `(category, query, context)` tuple.

mod ranker;

pub use ranker::{rank, ScoreParams};
