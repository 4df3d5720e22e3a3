use crate::CorpusEntry;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default cap for [`BoundedIdList`], matching the editor's "recent" and
/// "favorite" strips.
pub const DEFAULT_ID_LIST_CAP: usize = 10;

/// Read-only access to the corpus. The engine never stores or duplicates
/// the full corpus; it asks for slices per call.
pub trait CorpusProvider {
    /// Whether the corpus has been loaded. While `false`, lookups surface
    /// "unavailable" rather than "empty" to callers.
    fn is_ready(&self) -> bool;

    /// O(1) lookup by id.
    fn get_by_id(&self, id: &str) -> Option<Arc<CorpusEntry>>;

    /// Every entry, in catalogue order. O(n).
    fn list_all(&self) -> Vec<Arc<CorpusEntry>>;

    /// Entries of one category, in catalogue order. O(n).
    fn list_by_category(&self, category: &str) -> Vec<Arc<CorpusEntry>>;
}

/// Capability interface over a dynamic id subset ("Favorites", "Recent").
///
/// Each variant implements the same surface so the engine never branches on
/// which kind of tracker it is holding.
pub trait UsageTracker {
    /// Category label this subset is surfaced under.
    fn label(&self) -> &str;

    /// Ids in most-recently-used order.
    fn ids(&self) -> Vec<String>;

    fn contains(&self, id: &str) -> bool;

    /// Record a use: inserts or moves the id to the front, dropping the
    /// oldest id when over cap. Returns `true` if the id was not already
    /// present.
    fn record(&mut self, id: &str) -> bool;

    /// Remove the id. Returns `true` if it was present.
    fn remove(&mut self, id: &str) -> bool;

    fn len(&self) -> usize {
        self.ids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory MRU-ordered id list with a fixed cap; the reference
/// [`UsageTracker`] implementation. Persistence of the list (localStorage,
/// config files) belongs to the embedding application.
#[derive(Debug, Clone)]
pub struct BoundedIdList {
    label: String,
    cap: usize,
    ids: VecDeque<String>,
}

impl BoundedIdList {
    pub fn new(label: impl Into<String>, cap: usize) -> Self {
        Self {
            label: label.into(),
            cap: cap.max(1),
            ids: VecDeque::new(),
        }
    }

    pub fn with_default_cap(label: impl Into<String>) -> Self {
        Self::new(label, DEFAULT_ID_LIST_CAP)
    }

    /// Seed from an externally persisted list, oldest last. Ids beyond the
    /// cap are dropped.
    pub fn seed(&mut self, ids: impl IntoIterator<Item = String>) {
        self.ids.clear();
        for id in ids {
            if self.ids.len() == self.cap {
                break;
            }
            if !self.ids.contains(&id) {
                self.ids.push_back(id);
            }
        }
    }
}

impl UsageTracker for BoundedIdList {
    fn label(&self) -> &str {
        &self.label
    }

    fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    fn record(&mut self, id: &str) -> bool {
        let existed = if let Some(pos) = self.ids.iter().position(|x| x == id) {
            self.ids.remove(pos);
            true
        } else {
            false
        };
        self.ids.push_front(id.to_string());
        while self.ids.len() > self.cap {
            self.ids.pop_back();
        }
        !existed
    }

    fn remove(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|x| x == id) {
            self.ids.remove(pos);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
