use skilldex_protocol::{CategoryCountsSnapshot, CorpusEntry};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Incrementally maintained per-category counts for the category tabs.
///
/// `refresh` is the O(n) ground truth and bumps the generation; `patch`
/// applies an O(1) adjustment (one favorite toggled) between refreshes
/// without touching the generation. Until the first refresh the counter
/// is unavailable: [`count`](Self::count) returns `None`, which is not
/// the same thing as a category counting zero.
#[derive(Debug, Default)]
pub struct CategoryCounter {
    counts: Option<BTreeMap<String, usize>>,
    generation: u64,
}

impl CategoryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full recount from the corpus plus `(label, size)` pairs for the
    /// dynamic subsets (Favorites, Recent). Returns the new generation.
    pub fn refresh(
        &mut self,
        corpus: &[Arc<CorpusEntry>],
        subsets: impl IntoIterator<Item = (String, usize)>,
    ) -> u64 {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in corpus {
            *counts.entry(entry.category.clone()).or_insert(0) += 1;
        }
        for (label, size) in subsets {
            counts.insert(label, size);
        }
        self.counts = Some(counts);
        self.generation += 1;
        log::debug!(
            "category counts refreshed (generation {})",
            self.generation
        );
        self.generation
    }

    /// `None` while no corpus has been counted yet; `Some(0)` for a known
    /// category with no items.
    pub fn count(&self, category: &str) -> Option<usize> {
        self.counts
            .as_ref()
            .map(|counts| counts.get(category).copied().unwrap_or(0))
    }

    /// O(1) adjustment between refreshes. Saturates at zero and ignores
    /// the call entirely while the counter is unavailable.
    pub fn patch(&mut self, category: &str, delta: i32) {
        let Some(counts) = self.counts.as_mut() else {
            return;
        };
        let slot = counts.entry(category.to_string()).or_insert(0);
        *slot = if delta.is_negative() {
            slot.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            slot.saturating_add(delta as usize)
        };
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a snapshot taken at `generation` no longer reflects the
    /// latest refresh.
    pub fn is_stale(&self, generation: u64) -> bool {
        generation < self.generation
    }

    pub fn snapshot(&self) -> Option<CategoryCountsSnapshot> {
        self.counts.as_ref().map(|counts| CategoryCountsSnapshot {
            counts: counts.clone(),
            generation: self.generation,
        })
    }
}
