//! Highlight registry
//!
//! The authoritative in-memory set of highlight records attached to the
//! visible surface, together with the overlay marks currently painted for
//! each. Marks are a derived projection: the registry never holds a mark for
//! a record it does not also hold, and callers rebuild the whole set on
//! reload rather than diffing.

use std::collections::HashMap;

use crate::record::HighlightRecord;

struct RegistryEntry<M> {
    record: HighlightRecord,
    marks: Vec<M>,
}

/// In-memory map of records to their painted overlay marks.
///
/// Generic over the surface's mark handle type. Mutations that drop entries
/// hand the detached marks back so the caller can tear them off the surface;
/// the registry itself never talks to the surface.
pub struct HighlightRegistry<M> {
    entries: Vec<RegistryEntry<M>>,
    // 1-based page number -> indices into entries, rebuilt on every mutation
    by_page: HashMap<u32, Vec<usize>>,
}

impl<M> Default for HighlightRegistry<M> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_page: HashMap::new(),
        }
    }
}

impl<M> HighlightRegistry<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically discard all entries, returning every detached mark.
    ///
    /// Installs the new record set with no marks; the caller paints them.
    pub fn replace_all(&mut self, records: Vec<HighlightRecord>) -> Vec<M> {
        let detached = self.take_all_marks();
        self.entries = records
            .into_iter()
            .map(|record| RegistryEntry {
                record,
                marks: Vec::new(),
            })
            .collect();
        self.rebuild_index();
        detached
    }

    /// Add a single freshly created record with no marks yet
    pub fn insert(&mut self, record: HighlightRecord) {
        self.entries.push(RegistryEntry {
            record,
            marks: Vec::new(),
        });
        self.rebuild_index();
    }

    /// Remove one entry, returning its detached marks. `None` if absent.
    pub fn remove(&mut self, id: &str) -> Option<Vec<M>> {
        let idx = self.entries.iter().position(|e| e.record.id == id)?;
        let entry = self.entries.remove(idx);
        self.rebuild_index();
        Some(entry.marks)
    }

    /// Detach every mark from every entry, keeping the records.
    ///
    /// Used when visibility turns off and before a full repaint: entries
    /// survive, so turning visibility back on needs no data re-fetch.
    pub fn take_all_marks(&mut self) -> Vec<M> {
        self.entries
            .iter_mut()
            .flat_map(|e| e.marks.drain(..))
            .collect()
    }

    /// Attach freshly painted marks to an entry
    pub fn set_marks(&mut self, id: &str, marks: Vec<M>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.record.id == id) {
            entry.marks = marks;
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HighlightRecord> {
        self.entries
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| &e.record)
    }

    pub fn records(&self) -> impl Iterator<Item = &HighlightRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Record ids anchored to the given page, in registry order
    #[must_use]
    pub fn ids_on_page(&self, page: u32) -> Vec<&str> {
        self.by_page
            .get(&page)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| self.entries[i].record.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total marks currently attached across all entries
    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.entries.iter().map(|e| e.marks.len()).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rebuild_index(&mut self) {
        self.by_page.clear();
        for (idx, entry) in self.entries.iter().enumerate() {
            if let Some(page) = entry.record.anchor.page() {
                self.by_page.entry(page).or_default().push(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::HighlightRect;
    use crate::record::Anchor;

    fn record_on_page(page: u32) -> HighlightRecord {
        HighlightRecord::new(
            "text".to_string(),
            None,
            Anchor::Paginated {
                page,
                rects: vec![HighlightRect::new(0.0, 0.0, 10.0, 10.0)],
                scale: 1.0,
            },
        )
    }

    #[test]
    fn replace_all_detaches_old_marks() {
        let mut registry: HighlightRegistry<u64> = HighlightRegistry::new();
        let old = record_on_page(1);
        registry.insert(old.clone());
        registry.set_marks(&old.id, vec![1, 2]);

        let detached = registry.replace_all(vec![record_on_page(2)]);
        assert_eq!(detached, vec![1, 2]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.mark_count(), 0);
        assert!(registry.get(&old.id).is_none());
    }

    #[test]
    fn remove_absent_id_is_a_noop() {
        let mut registry: HighlightRegistry<u64> = HighlightRegistry::new();
        registry.insert(record_on_page(1));
        assert!(registry.remove("no-such-id").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_returns_detached_marks() {
        let mut registry: HighlightRegistry<u64> = HighlightRegistry::new();
        let record = record_on_page(1);
        registry.insert(record.clone());
        registry.set_marks(&record.id, vec![7]);

        assert_eq!(registry.remove(&record.id), Some(vec![7]));
        assert!(registry.is_empty());
        assert_eq!(registry.mark_count(), 0);
    }

    #[test]
    fn take_all_marks_keeps_records() {
        let mut registry: HighlightRegistry<u64> = HighlightRegistry::new();
        let record = record_on_page(1);
        registry.insert(record.clone());
        registry.set_marks(&record.id, vec![3, 4]);

        let detached = registry.take_all_marks();
        assert_eq!(detached, vec![3, 4]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&record.id).is_some());
    }

    #[test]
    fn page_index_follows_mutations() {
        let mut registry: HighlightRegistry<u64> = HighlightRegistry::new();
        let a = record_on_page(1);
        let b = record_on_page(1);
        let c = record_on_page(2);
        registry.insert(a.clone());
        registry.insert(b.clone());
        registry.insert(c.clone());

        assert_eq!(registry.ids_on_page(1), vec![a.id.as_str(), b.id.as_str()]);
        registry.remove(&a.id);
        assert_eq!(registry.ids_on_page(1), vec![b.id.as_str()]);
        assert_eq!(registry.ids_on_page(3), Vec::<&str>::new());
    }
}
