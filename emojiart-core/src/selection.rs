//! The set of currently selected elements.

use std::collections::HashSet;

use crate::ElementId;

/// Selected element identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<ElementId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Select exactly the given ids.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.ids = ids.into_iter().collect();
    }

    /// Insert the id if absent, remove it if present.
    ///
    /// Returns `true` if the id is selected afterwards.
    pub fn toggle(&mut self, id: ElementId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Keep only the ids matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.ids.retain(|&id| keep(id));
    }

    /// Whether the id is selected.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of selected elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over the selected ids in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut selection = Selection::new();
        let other = ElementId::new();
        selection.toggle(other);
        let before = selection.clone();

        let id = ElementId::new();
        assert!(selection.toggle(id));
        assert!(selection.contains(id));
        assert!(!selection.toggle(id));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_select_all_replaces_contents() {
        let mut selection = Selection::new();
        let stale = ElementId::new();
        selection.toggle(stale);

        let ids = [ElementId::new(), ElementId::new()];
        selection.select_all(ids);
        assert_eq!(selection.len(), 2);
        assert!(!selection.contains(stale));

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_prunes() {
        let mut selection = Selection::new();
        let keep = ElementId::new();
        let drop = ElementId::new();
        selection.select_all([keep, drop]);
        selection.retain(|id| id == keep);
        assert!(selection.contains(keep));
        assert!(!selection.contains(drop));
    }
}
