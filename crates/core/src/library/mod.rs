//! Hierarchical pattern library: document type -> format -> named pattern.
//!
//! The whole library is loaded and persisted as one unit; see [`store`] for
//! the storage boundary and the single-writer manager. Names are unique
//! within their parent map and iteration order is insertion order.

pub mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::layout::bbox::{DEFAULT_HORIZONTAL_ALIGN_TOLERANCE, NormalizedRect};
use crate::layout::document::MatchMode;

pub use store::{LIBRARY_KEY, LibraryStore, MemoryStore, PatternLibraryManager};

/// Where a pattern takes its extracted value from, relative to the anchor
/// box matched by its keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// First acceptable box to the right of the anchor on the same row.
    RightOf { tolerance: f64 },
    /// First acceptable box below the anchor in the same column.
    Below { tolerance: f64 },
    /// Closest acceptable box within a distance budget.
    Nearest { max_distance: f64 },
    /// Boxes whose normalized center falls inside a fixed region. Needs no
    /// anchor keywords.
    Region { rect: NormalizedRect },
    /// The anchor box itself carries the value (label and value recognized
    /// as one fragment).
    Anchor,
}

impl Default for ValueSource {
    fn default() -> Self {
        ValueSource::RightOf {
            tolerance: DEFAULT_HORIZONTAL_ALIGN_TOLERANCE,
        }
    }
}

/// One named extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPattern {
    pub name: String,

    /// Anchor phrases; a box matching any one of them marks the spot.
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub value_source: ValueSource,

    /// Optional regex the extracted value must match, applied per candidate
    /// box.
    #[serde(default)]
    pub value_filter: Option<String>,

    /// Candidate boxes below this confidence are ignored.
    #[serde(default)]
    pub min_confidence: f64,

    /// Concatenate every acceptable candidate instead of taking the first.
    #[serde(default)]
    pub join_values: bool,
}

impl SearchPattern {
    pub fn new(name: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            name: name.into(),
            keywords,
            match_mode: MatchMode::default(),
            value_source: ValueSource::default(),
            value_filter: None,
            min_confidence: 0.0,
            join_values: false,
        }
    }

    pub fn with_source(mut self, source: ValueSource) -> Self {
        self.value_source = source;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_value_filter(mut self, filter: impl Into<String>) -> Self {
        self.value_filter = Some(filter.into());
        self
    }
}

/// Named patterns for one document format (vendor layout).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCollection {
    pub patterns: IndexMap<String, SearchPattern>,
}

impl SubCollection {
    pub fn insert(&mut self, pattern: SearchPattern) {
        self.patterns.insert(pattern.name.clone(), pattern);
    }

    pub fn remove(&mut self, name: &str) -> Option<SearchPattern> {
        self.patterns.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&SearchPattern> {
        self.patterns.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.patterns.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Formats known for one document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub sub_collections: IndexMap<String, SubCollection>,
}

impl Collection {
    pub fn get(&self, format: &str) -> Option<&SubCollection> {
        self.sub_collections.get(format)
    }

    pub fn names(&self) -> Vec<String> {
        self.sub_collections.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_collections.is_empty()
    }
}

/// The full three-level pattern hierarchy, persisted as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternLibrary {
    pub collections: IndexMap<String, Collection>,
}

impl PatternLibrary {
    pub fn collection(&self, document_type: &str) -> Option<&Collection> {
        self.collections.get(document_type)
    }

    pub fn sub_collection(&self, document_type: &str, format: &str) -> Option<&SubCollection> {
        self.collection(document_type)?.get(format)
    }

    pub fn pattern(&self, document_type: &str, format: &str, name: &str) -> Option<&SearchPattern> {
        self.sub_collection(document_type, format)?.get(name)
    }

    /// Creates an empty collection. Returns false if one already exists.
    pub fn create_collection(&mut self, document_type: &str) -> bool {
        if self.collections.contains_key(document_type) {
            return false;
        }
        self.collections
            .insert(document_type.to_string(), Collection::default());
        true
    }

    /// Creates an empty sub-collection under an existing collection.
    /// Returns None if the collection is unknown, Some(false) if the
    /// sub-collection already exists.
    pub fn create_sub_collection(&mut self, document_type: &str, format: &str) -> Option<bool> {
        let collection = self.collections.get_mut(document_type)?;
        if collection.sub_collections.contains_key(format) {
            return Some(false);
        }
        collection
            .sub_collections
            .insert(format.to_string(), SubCollection::default());
        Some(true)
    }

    /// Inserts or overwrites a pattern under an existing sub-collection.
    /// Returns false if the hierarchy path does not exist.
    pub fn upsert_pattern(
        &mut self,
        document_type: &str,
        format: &str,
        pattern: SearchPattern,
    ) -> bool {
        match self
            .collections
            .get_mut(document_type)
            .and_then(|c| c.sub_collections.get_mut(format))
        {
            Some(sub) => {
                sub.insert(pattern);
                true
            }
            None => false,
        }
    }

    /// Removes one named pattern. Empty containers are left in place; see
    /// [`PatternLibrary::prune_empty`].
    pub fn remove_pattern(&mut self, document_type: &str, format: &str, name: &str) -> bool {
        self.collections
            .get_mut(document_type)
            .and_then(|c| c.sub_collections.get_mut(format))
            .and_then(|sub| sub.remove(name))
            .is_some()
    }

    pub fn remove_sub_collection(&mut self, document_type: &str, format: &str) -> bool {
        self.collections
            .get_mut(document_type)
            .and_then(|c| c.sub_collections.shift_remove(format))
            .is_some()
    }

    pub fn remove_collection(&mut self, document_type: &str) -> bool {
        self.collections.shift_remove(document_type).is_some()
    }

    /// Maintenance pass: drops sub-collections with zero patterns, then
    /// collections with zero sub-collections. Returns the number of
    /// sub-collections and collections removed.
    pub fn prune_empty(&mut self) -> (usize, usize) {
        let mut removed_subs = 0;
        for collection in self.collections.values_mut() {
            let before = collection.sub_collections.len();
            collection.sub_collections.retain(|_, sub| !sub.is_empty());
            removed_subs += before - collection.sub_collections.len();
        }
        let before = self.collections.len();
        self.collections.retain(|_, c| !c.is_empty());
        (removed_subs, before - self.collections.len())
    }

    pub fn document_types(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}
