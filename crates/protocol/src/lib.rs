//! # Skilldex Protocol
//!
//! Shared data model for the skill/mechanic lookup engine: corpus entries,
//! match results, render chunks, category snapshots, and the narrow traits
//! through which the engine talks to its collaborators (corpus provider,
//! usage trackers).
//!
//! The engine never owns the corpus: entries are `Arc`-shared and immutable
//! once loaded, so every component can hold references without copying.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

mod provider;

pub use provider::{BoundedIdList, CorpusProvider, UsageTracker, DEFAULT_ID_LIST_CAP};

/// One nameable item (mechanic, skill, condition...) in the searchable corpus.
///
/// Immutable once loaded; owned by the corpus provider and shared via `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusEntry {
    /// Unique identifier, stable across sessions.
    pub id: String,
    /// Canonical display name, the primary match target.
    pub name: String,
    /// Alternate names that should match as well as the canonical one.
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// Category tab the entry belongs to.
    pub category: String,
    /// Human-readable description (never matched against).
    #[serde(default)]
    pub description: String,
}

/// How a query matched a target, strongest first.
///
/// Ordering between kinds is strict: an [`Exact`](MatchKind::Exact) match
/// always ranks above any [`Prefix`](MatchKind::Prefix) match, and so on,
/// regardless of raw scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
}

impl MatchKind {
    /// Rank used for tier-first ordering; higher is stronger.
    pub fn rank(self) -> u8 {
        match self {
            MatchKind::Exact => 3,
            MatchKind::Prefix => 2,
            MatchKind::Substring => 1,
            MatchKind::Fuzzy => 0,
        }
    }
}

/// Half-open `[start, end)` char-offset range to highlight in the matched
/// target. Presentation (markup, color codes) is a consumer concern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A scored candidate produced by ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    /// Id of the matched [`CorpusEntry`].
    pub entry_id: String,
    pub score: f64,
    pub kind: MatchKind,
    /// Ordered, non-overlapping highlight spans into the matched target.
    pub spans: Vec<Span>,
}

/// One item of a render chunk: either a ranked match or, for the empty-query
/// "match all" listing, an unscored corpus entry in original order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RenderItem {
    Scored(MatchResult),
    Entry(Arc<CorpusEntry>),
}

impl RenderItem {
    /// Id of the underlying corpus entry, whichever variant.
    pub fn entry_id(&self) -> &str {
        match self {
            RenderItem::Scored(m) => &m.entry_id,
            RenderItem::Entry(e) => &e.id,
        }
    }
}

/// A bounded slice of an ordered result list, emitted to the render sink.
///
/// Consumers must compare `generation` against the latest generation they
/// issued and discard mismatches; a late chunk from a superseded request
/// is expected, not a bug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderChunk {
    pub items: Vec<RenderItem>,
    /// 0 for the synchronous first chunk, 1 for the follow-up.
    pub chunk_index: usize,
    /// Set only on the last chunk of a generation.
    pub is_final: bool,
    /// Generation of the `schedule` call that produced this chunk.
    pub generation: u64,
}

/// Parameters of one search: what to look for and where.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Category tab to restrict to; `None` searches the whole corpus.
    pub category: Option<String>,
    /// Name of the skill being edited, used for the context affinity bonus.
    pub context: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            context: None,
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Cache key for the result list this request resolves to. The context
    /// skill participates because the affinity bonus changes ordering.
    pub fn cache_key(&self) -> (String, String, String) {
        (
            self.category.clone().unwrap_or_default(),
            self.query.trim().to_lowercase(),
            self.context.clone().unwrap_or_default(),
        )
    }
}

/// Point-in-time category counts with a staleness token.
///
/// `generation` increases monotonically on every full recount; a consumer
/// holding an older generation knows its snapshot is stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCountsSnapshot {
    pub counts: BTreeMap<String, usize>,
    pub generation: u64,
}

impl CategoryCountsSnapshot {
    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, name: &str, category: &str) -> Arc<CorpusEntry> {
        Arc::new(CorpusEntry {
            id: id.to_string(),
            name: name.to_string(),
            aliases: BTreeSet::new(),
            category: category.to_string(),
            description: String::new(),
        })
    }

    #[test]
    fn match_kind_rank_is_strictly_ordered() {
        assert!(MatchKind::Exact.rank() > MatchKind::Prefix.rank());
        assert!(MatchKind::Prefix.rank() > MatchKind::Substring.rank());
        assert!(MatchKind::Substring.rank() > MatchKind::Fuzzy.rank());
    }

    #[test]
    fn cache_key_normalizes_query() {
        let a = SearchRequest::new("  Fire ").in_category("Damage");
        let b = SearchRequest::new("fire").in_category("Damage");
        assert_eq!(a.cache_key(), b.cache_key());

        let c = SearchRequest::new("fire").in_category("Damage").with_context("fire_aura");
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn render_item_exposes_entry_id() {
        let scored = RenderItem::Scored(MatchResult {
            entry_id: "m1".to_string(),
            score: 42.0,
            kind: MatchKind::Fuzzy,
            spans: vec![],
        });
        assert_eq!(scored.entry_id(), "m1");

        let plain = RenderItem::Entry(entry("m2", "ignite", "Damage"));
        assert_eq!(plain.entry_id(), "m2");
    }

    #[test]
    fn corpus_entry_round_trips_through_json() {
        let mut aliases = BTreeSet::new();
        aliases.insert("burn".to_string());
        let e = CorpusEntry {
            id: "ignite".to_string(),
            name: "ignite".to_string(),
            aliases,
            category: "Damage".to_string(),
            description: "Sets the target on fire".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: CorpusEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
