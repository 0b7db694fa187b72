//! In-memory entity store loaded from a STIX bundle.

use super::{EntityStore, Filter};
use crate::error::{KnowledgeBaseError, KnowledgeBaseResult};
use crate::models::StixObject;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// On-disk STIX bundle envelope.
#[derive(Debug, Deserialize)]
struct Bundle {
    #[serde(default)]
    objects: Vec<StixObject>,
}

/// In-memory implementation of [`EntityStore`].
///
/// Records keep bundle order; queries return matches in that order. When a
/// bundle carries several versions of one id, the most recently modified
/// version replaces the earlier one in place.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Vec<StixObject>,
    index: HashMap<String, usize>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given records.
    pub fn from_objects(objects: impl IntoIterator<Item = StixObject>) -> Self {
        let mut store = Self::new();
        for object in objects {
            store.insert(object);
        }
        store
    }

    /// Parses a bundle from a JSON string.
    pub fn from_bundle_str(json: &str) -> KnowledgeBaseResult<Self> {
        Self::parse_bundle(json, "<memory>")
    }

    /// Loads a bundle file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_from_file(path: impl AsRef<Path>) -> KnowledgeBaseResult<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            origin: origin.clone(),
            source,
        })?;
        let store = Self::parse_bundle(&content, &origin)?;
        info!(objects = store.len(), "Loaded STIX bundle");
        Ok(store)
    }

    fn parse_bundle(json: &str, origin: &str) -> KnowledgeBaseResult<Self> {
        let bundle: Bundle =
            serde_json::from_str(json).map_err(|source| KnowledgeBaseError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        Ok(Self::from_objects(bundle.objects))
    }

    fn insert(&mut self, object: StixObject) {
        match self.index.get(&object.id) {
            Some(&position) => {
                let existing = &mut self.objects[position];
                if object.modified >= existing.modified {
                    debug!(id = %object.id, "Replacing older version of object");
                    *existing = object;
                }
            }
            None => {
                self.index.insert(object.id.clone(), self.objects.len());
                self.objects.push(object);
            }
        }
    }
}

impl EntityStore for MemoryStore {
    fn query(&self, filters: &[Filter]) -> Vec<&StixObject> {
        self.objects
            .iter()
            .filter(|o| filters.iter().all(|f| f.matches(o)))
            .collect()
    }

    fn get(&self, stix_id: &str) -> Option<&StixObject> {
        self.index.get(stix_id).map(|&i| &self.objects[i])
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}
