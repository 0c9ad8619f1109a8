use hashbrown::HashMap;

use super::ir::StorageSlot;

/// Variable name to storage slot. Entries are created on first reference and
/// never removed; there is a single whole-program scope.
#[derive(Debug, Default)]
pub struct VariableTable {
    slots: HashMap<String, StorageSlot>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<StorageSlot> {
        self.slots.get(name).copied()
    }

    /// Records the slot of a new variable. Returns false if the name was
    /// already bound, in which case the existing slot is kept.
    pub fn insert(&mut self, name: &str, slot: StorageSlot) -> bool {
        if self.slots.contains_key(name) {
            return false;
        }

        self.slots.insert(name.to_owned(), slot);
        true
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::ir::RegisterId, index::Index};

    #[test]
    fn first_binding_wins() {
        let mut table = VariableTable::new();
        assert!(table.is_empty());

        let first = StorageSlot(RegisterId::new(1));

        assert!(table.insert("x", first));
        assert!(!table.insert("x", StorageSlot(RegisterId::new(9))));
        assert_eq!(table.get("x"), Some(first));
        assert_eq!(table.get("y"), None);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
    }
}
