use fs_err as fs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

use crate::errors::StorageError;
use crate::wire::Product;

pub const DEFAULT_STORAGE_KEY: &str = "lorealSelectedProducts";

/// String-keyed durable storage with `localStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// All keys live in a single JSON object file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        fs::write(tmp.path(), serde_json::to_string_pretty(map)?)?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut map = self.read_all().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_all().unwrap_or_default();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// Process-local store for tests and `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().map(|m| m.get(key).cloned()).unwrap_or(None))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Ok(mut m) = self.map.lock() {
            m.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut m) = self.map.lock() {
            m.remove(key);
        }
        Ok(())
    }
}

/// Reads and writes the selection list under one fixed key.
///
/// Every failure is logged and absorbed: the in-memory selection stays
/// authoritative, it just may not be durable.
pub struct SelectionStorage {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl SelectionStorage {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    pub fn load(&self) -> Vec<Product> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key = %self.key, "Error loading products from storage: {err}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Product>>(&raw) {
            Ok(list) => {
                debug!(count = list.len(), "restored selection");
                list
            }
            Err(err) => {
                warn!(key = %self.key, "Error loading products from storage: {err}");
                Vec::new()
            }
        }
    }

    pub fn save(&self, products: &[Product]) {
        let result = serde_json::to_string(products)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(&self.key, &json));
        if let Err(err) = result {
            error!(key = %self.key, "Error saving products to storage: {err}");
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(&self.key) {
            error!(key = %self.key, "Error clearing stored products: {err}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    pub(crate) fn product(id: i64, name: &str, brand: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            brand: brand.to_string(),
            category: "skincare".to_string(),
            description: format!("{name} description"),
            image: format!("https://img.example/{id}.png"),
        }
    }

    /// Lets a test keep a handle on the store it hands to `SelectionStorage`.
    pub(crate) struct Shared(pub Arc<MemoryStore>);

    impl KeyValueStore for Shared {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> { self.0.get(key) }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> { self.0.set(key, value) }
        fn remove(&self, key: &str) -> Result<(), StorageError> { self.0.remove(key) }
    }

    /// Fails every operation, like a full or unavailable `localStorage`.
    pub(crate) struct Broken;

    impl KeyValueStore for Broken {
        fn get(&self, _: &str) -> Result<Option<String>, StorageError> {
            Err(std::io::Error::other("unavailable").into())
        }
        fn set(&self, _: &str, _: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("quota exceeded").into())
        }
        fn remove(&self, _: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("unavailable").into())
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let storage = SelectionStorage::new(Box::new(MemoryStore::new()), DEFAULT_STORAGE_KEY);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn corrupt_value_loads_empty() {
        let mem = Arc::new(MemoryStore::new());
        mem.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let storage = SelectionStorage::new(Box::new(Shared(mem)), DEFAULT_STORAGE_KEY);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn broken_store_never_panics() {
        let storage = SelectionStorage::new(Box::new(Broken), DEFAULT_STORAGE_KEY);
        storage.save(&[product(1, "Serum", "Acme")]);
        storage.clear();
        assert!(storage.load().is_empty());
    }

    #[test]
    fn file_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let list = vec![product(3, "Toner", "B"), product(1, "Serum", "Acme"), product(2, "Mask", "C")];

        SelectionStorage::new(Box::new(FileStore::new(&path)), DEFAULT_STORAGE_KEY).save(&list);

        let fresh = SelectionStorage::new(Box::new(FileStore::new(&path)), DEFAULT_STORAGE_KEY);
        let ids: Vec<i64> = fresh.load().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn file_clear_removes_only_our_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileStore::new(&path);
        store.set("theme", "dark").unwrap();

        let storage = SelectionStorage::new(Box::new(FileStore::new(&path)), DEFAULT_STORAGE_KEY);
        storage.save(&[product(1, "Serum", "Acme")]);
        assert!(store.get(DEFAULT_STORAGE_KEY).unwrap().is_some());

        storage.clear();
        assert!(store.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "garbage").unwrap();

        let storage = SelectionStorage::new(Box::new(FileStore::new(&path)), DEFAULT_STORAGE_KEY);
        assert!(storage.load().is_empty());
        storage.save(&[product(5, "Oil", "D")]);
        assert_eq!(storage.load().len(), 1);
    }
}
