use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::storage::SelectionStorage;
use crate::wire::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added(i64),
    /// `found` is false when the id was not selected; the list is unchanged.
    Removed { id: i64, found: bool },
    Cleared,
    Restored,
}

/// Notified after every selection mutation, once the new list is persisted.
pub trait SelectionObserver: Send + Sync {
    fn selection_changed(&self, change: SelectionChange, products: &[Product]);
}

/// Ordered, id-unique list of chosen products mirrored into storage.
pub struct SelectionStore {
    products: Vec<Product>,
    storage: SelectionStorage,
    observers: Vec<Arc<dyn SelectionObserver>>,
}

impl SelectionStore {
    /// Restore from storage. Duplicate ids in the stored list are dropped,
    /// first occurrence wins.
    pub fn restore(storage: SelectionStorage, observers: Vec<Arc<dyn SelectionObserver>>) -> Self {
        let mut seen = HashSet::new();
        let products: Vec<Product> = storage
            .load()
            .into_iter()
            .filter(|p| seen.insert(p.id))
            .collect();
        debug!(count = products.len(), "selection restored");
        let store = Self { products, storage, observers };
        store.notify(SelectionChange::Restored);
        store
    }

    pub fn add(&mut self, product: Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        let id = product.id;
        self.products.push(product);
        self.storage.save(&self.products);
        self.notify(SelectionChange::Added(id));
        true
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        let removed = self.products.len() != before;
        self.storage.save(&self.products);
        self.notify(SelectionChange::Removed { id, found: removed });
        removed
    }

    pub fn clear(&mut self) {
        self.products.clear();
        self.storage.clear();
        self.notify(SelectionChange::Cleared);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    fn notify(&self, change: SelectionChange) {
        for o in &self.observers {
            o.selection_changed(change, &self.products);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::tests::{product, Broken, Shared};
    use crate::storage::{KeyValueStore, MemoryStore, DEFAULT_STORAGE_KEY};
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct Recorder {
        pub changes: Mutex<Vec<(SelectionChange, usize)>>,
    }

    impl SelectionObserver for Recorder {
        fn selection_changed(&self, change: SelectionChange, products: &[Product]) {
            self.changes.lock().unwrap().push((change, products.len()));
        }
    }

    fn store_with(mem: Arc<MemoryStore>, rec: Arc<Recorder>) -> SelectionStore {
        let storage = SelectionStorage::new(Box::new(Shared(mem)), DEFAULT_STORAGE_KEY);
        SelectionStore::restore(storage, vec![rec as Arc<dyn SelectionObserver>])
    }

    fn ids(store: &SelectionStore) -> Vec<i64> {
        store.products().iter().map(|p| p.id).collect()
    }

    #[test]
    fn duplicate_add_is_a_no_op() {
        let rec = Arc::new(Recorder::default());
        let mut store = store_with(Arc::new(MemoryStore::new()), rec.clone());

        assert!(store.add(product(1, "Serum", "Acme")));
        assert!(store.add(product(2, "Toner", "B")));
        assert!(!store.add(product(1, "Serum", "Acme")));

        assert_eq!(ids(&store), vec![1, 2]);
        // Restored + two adds; the rejected add fires nothing.
        assert_eq!(rec.changes.lock().unwrap().len(), 3);
    }

    #[test]
    fn removing_absent_id_leaves_list_unchanged() {
        let rec = Arc::new(Recorder::default());
        let mut store = store_with(Arc::new(MemoryStore::new()), rec.clone());
        store.add(product(1, "Serum", "Acme"));
        store.add(product(2, "Toner", "B"));

        assert!(!store.remove(99));
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(
            rec.changes.lock().unwrap().last(),
            Some(&(SelectionChange::Removed { id: 99, found: false }, 2))
        );

        assert!(store.remove(1));
        assert_eq!(ids(&store), vec![2]);
    }

    #[test]
    fn mutations_are_persisted() {
        let mem = Arc::new(MemoryStore::new());
        let mut store = store_with(mem.clone(), Arc::new(Recorder::default()));
        store.add(product(4, "Oil", "D"));
        store.add(product(2, "Toner", "B"));

        let again = store_with(mem.clone(), Arc::new(Recorder::default()));
        assert_eq!(ids(&again), vec![4, 2]);

        store.clear();
        assert!(mem.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn failing_storage_keeps_memory_correct() {
        let rec = Arc::new(Recorder::default());
        let storage = SelectionStorage::new(Box::new(Broken), DEFAULT_STORAGE_KEY);
        let mut store = SelectionStore::restore(storage, vec![rec.clone() as Arc<dyn SelectionObserver>]);
        assert!(store.is_empty());

        assert!(store.add(product(1, "Serum", "Acme")));
        assert!(store.add(product(2, "Toner", "B")));
        assert!(!store.add(product(1, "Serum", "Acme")));
        assert_eq!(ids(&store), vec![1, 2]);

        assert!(store.remove(1));
        assert_eq!(ids(&store), vec![2]);
        assert!(store.contains(2));

        store.clear();
        assert!(store.is_empty());
        // Restored, two adds, remove, clear; none lost to the storage errors.
        assert_eq!(rec.changes.lock().unwrap().len(), 5);
    }

    #[test]
    fn restore_drops_duplicate_ids() {
        let mem = Arc::new(MemoryStore::new());
        let stored = vec![product(1, "Serum", "Acme"), product(2, "Toner", "B"), product(1, "Serum", "Acme")];
        mem.set(DEFAULT_STORAGE_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();

        let rec = Arc::new(Recorder::default());
        let store = store_with(mem, rec.clone());
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(rec.changes.lock().unwrap()[0], (SelectionChange::Restored, 2));
    }

    #[test]
    fn observers_see_list_after_change() {
        let rec = Arc::new(Recorder::default());
        let mut store = store_with(Arc::new(MemoryStore::new()), rec.clone());
        store.add(product(1, "Serum", "Acme"));
        store.remove(1);
        store.clear();

        let changes = rec.changes.lock().unwrap().clone();
        assert_eq!(
            changes,
            vec![
                (SelectionChange::Restored, 0),
                (SelectionChange::Added(1), 1),
                (SelectionChange::Removed { id: 1, found: true }, 0),
                (SelectionChange::Cleared, 0),
            ]
        );
    }
}
