//! Pattern library persistence boundary and single-writer manager.

use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::Result;

use super::{Collection, PatternLibrary, SearchPattern, SubCollection};

/// Fixed storage key the serialized library lives under.
pub const LIBRARY_KEY: &str = "pattern-library";

/// The external key-value storage engine, at its interface boundary: whole
/// values loaded and saved by string identifier. The composition root
/// injects an implementation; the core never discovers one at runtime.
pub trait LibraryStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, key: &str, value: &[u8]) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn list_keys(&self) -> Result<Vec<String>>;
}

/// In-memory store, used by tests and by read-only composition roots that
/// already hold a deserialized library.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with the given library under [`LIBRARY_KEY`].
    pub fn with_library(library: &PatternLibrary) -> Result<Self> {
        let store = Self::new();
        store.save(LIBRARY_KEY, &serde_json::to_vec(library)?)?;
        Ok(store)
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LibraryStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }
}

/// Owns the storage handle and serializes every load-mutate-save sequence
/// behind one library-wide lock.
///
/// There is no fine-grained per-pattern locking and no versioned merge: a
/// second concurrent writer simply waits. Read-only queries hold the lock
/// only while loading; the returned data is the caller's own copy.
pub struct PatternLibraryManager {
    store: Box<dyn LibraryStore>,
    gate: Mutex<()>,
}

impl PatternLibraryManager {
    pub fn new(store: Box<dyn LibraryStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// Loads the whole library. An unavailable store or a malformed payload
    /// degrades to an empty library: callers treat "empty" and
    /// "never-initialized" identically.
    pub fn load_library(&self) -> PatternLibrary {
        let _guard = self.lock();
        self.load_unlocked()
    }

    fn load_unlocked(&self) -> PatternLibrary {
        match self.store.load(LIBRARY_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(library) => library,
                Err(err) => {
                    warn!(error = %err, "malformed pattern library, using empty");
                    PatternLibrary::default()
                }
            },
            Ok(None) => PatternLibrary::default(),
            Err(err) => {
                warn!(error = %err, "pattern store unavailable, using empty library");
                PatternLibrary::default()
            }
        }
    }

    fn save_unlocked(&self, library: &PatternLibrary) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(library)?;
        self.store.save(LIBRARY_KEY, &bytes)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One locked load-mutate-save sequence.
    fn update<T>(&self, mutate: impl FnOnce(&mut PatternLibrary) -> T) -> Result<T> {
        let _guard = self.lock();
        let mut library = self.load_unlocked();
        let out = mutate(&mut library);
        self.save_unlocked(&library)?;
        Ok(out)
    }

    // Read surface. Each call loads under the lock and answers from the
    // caller's own copy.

    pub fn list_collections(&self) -> Vec<String> {
        self.load_library().document_types()
    }

    pub fn list_sub_collections(&self, document_type: &str) -> Vec<String> {
        self.load_library()
            .collection(document_type)
            .map(Collection::names)
            .unwrap_or_default()
    }

    pub fn list_patterns(&self, document_type: &str, format: &str) -> Vec<String> {
        self.load_library()
            .sub_collection(document_type, format)
            .map(SubCollection::names)
            .unwrap_or_default()
    }

    pub fn load_pattern(
        &self,
        document_type: &str,
        format: &str,
        name: &str,
    ) -> Option<SearchPattern> {
        self.load_library()
            .pattern(document_type, format, name)
            .cloned()
    }

    pub fn load_sub_collection(&self, document_type: &str, format: &str) -> Option<SubCollection> {
        self.load_library()
            .sub_collection(document_type, format)
            .cloned()
    }

    pub fn load_collection(&self, document_type: &str) -> Option<Collection> {
        self.load_library().collection(document_type).cloned()
    }

    // Write surface. Structural mutations run as locked load-mutate-save.

    /// Returns false if the collection already existed.
    pub fn create_collection(&self, document_type: &str) -> Result<bool> {
        self.update(|lib| lib.create_collection(document_type))
    }

    /// Returns false if the sub-collection already existed; creates the
    /// collection on demand.
    pub fn create_sub_collection(&self, document_type: &str, format: &str) -> Result<bool> {
        self.update(|lib| {
            lib.create_collection(document_type);
            lib.create_sub_collection(document_type, format)
                .unwrap_or(false)
        })
    }

    /// Inserts or overwrites one named pattern. Returns false if the
    /// hierarchy path does not exist.
    pub fn upsert_pattern(
        &self,
        document_type: &str,
        format: &str,
        pattern: SearchPattern,
    ) -> Result<bool> {
        self.update(|lib| lib.upsert_pattern(document_type, format, pattern))
    }

    /// Removes one named pattern. Deliberately leaves empty containers in
    /// place; run [`PatternLibraryManager::prune_empty`] to clean them up.
    pub fn remove_pattern(&self, document_type: &str, format: &str, name: &str) -> Result<bool> {
        self.update(|lib| lib.remove_pattern(document_type, format, name))
    }

    pub fn remove_sub_collection(&self, document_type: &str, format: &str) -> Result<bool> {
        self.update(|lib| lib.remove_sub_collection(document_type, format))
    }

    pub fn remove_collection(&self, document_type: &str) -> Result<bool> {
        self.update(|lib| lib.remove_collection(document_type))
    }

    /// Maintenance pass dropping empty sub-collections and collections.
    /// Returns (sub-collections removed, collections removed).
    pub fn prune_empty(&self) -> Result<(usize, usize)> {
        self.update(PatternLibrary::prune_empty)
    }

    /// Replaces the whole persisted library in one locked write.
    pub fn replace_library(&self, library: &PatternLibrary) -> Result<()> {
        let _guard = self.lock();
        self.save_unlocked(library)
    }
}
