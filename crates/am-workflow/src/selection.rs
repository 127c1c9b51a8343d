//! Order-preserving selection set keyed by structural asset identity.
//!
//! Uniqueness is enforced at every mutation site rather than by a hashing
//! container: two entries are the same pick iff their identities match, even
//! when the surrounding records differ.

use am_api_types::Asset;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    items: Vec<Asset>,
}

/// Which half of the combined select-all toggle a bulk call performs. Drives
/// the "Select All" / "Deselect All" button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    SelectAll,
    DeselectAll,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a prior session's picks, dropping identity duplicates.
    pub fn from_items(items: Vec<Asset>) -> Self {
        let mut set = Self::new();
        for asset in items {
            if !set.contains(&asset) {
                set.items.push(asset);
            }
        }
        set
    }

    pub fn contains(&self, asset: &Asset) -> bool {
        self.items.iter().any(|entry| entry.identity == asset.identity)
    }

    /// Remove the asset if its identity is present, append it otherwise.
    /// Re-selecting appends at the end, not at the original position.
    pub fn toggle(&mut self, asset: Asset) {
        match self.items.iter().position(|entry| entry.identity == asset.identity) {
            Some(index) => {
                self.items.remove(index);
            }
            None => self.items.push(asset),
        }
    }

    /// The action a bulk call would perform against a universe of the given
    /// size: fill while anything is unselected, clear once everything is.
    pub fn bulk_action(&self, universe_len: usize) -> BulkAction {
        if self.items.len() < universe_len {
            BulkAction::SelectAll
        } else {
            BulkAction::DeselectAll
        }
    }

    /// The combined select-all/deselect-all toggle.
    pub fn select_all(&mut self, universe: &[Asset]) -> BulkAction {
        match self.bulk_action(universe.len()) {
            BulkAction::SelectAll => {
                self.items = universe.to_vec();
                BulkAction::SelectAll
            }
            BulkAction::DeselectAll => {
                self.items.clear();
                BulkAction::DeselectAll
            }
        }
    }

    pub fn items(&self) -> &[Asset] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Asset> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
