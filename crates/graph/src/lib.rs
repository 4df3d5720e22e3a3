//! # Skilldex Graph
//!
//! Reference-integrity analysis over the skill dependency relation: cycle
//! detection before a sub-skill reference is added, and bounded-depth tree
//! construction for the dependency view.
//!
//! The relation is lazily resolved through a caller-supplied edge function
//! (`name -> referenced names`), typically backed by parsing configuration
//! text. Nothing here errors: an absent cycle is a normal result, and depth
//! or revisit bounds surface as truncation, never as failure.

mod analyzer;
mod types;

pub use analyzer::{build_tree, detect_cycle};
pub use types::{CycleReport, DependencyNode};
