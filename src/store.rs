//! The Feature Store: in-memory source of truth for the loaded collection.
//!
//! Every change is applied in memory first, then written to the local cache,
//! then pushed to the remote sink. Neither persistence step can roll back or
//! block the in-memory update.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::Database;
use crate::editor::{Editor, SaveOutcome};
use crate::models::{Feature, FeatureCollection};
use crate::sync::{RemoteSync, RemoteUpdate};
use crate::CoreError;

/// Durable local storage for the collection.
pub trait LocalCache: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<FeatureCollection>>;
    fn write(&self, key: &str, collection: &FeatureCollection) -> Result<()>;
}

impl LocalCache for Database {
    fn read(&self, key: &str) -> Result<Option<FeatureCollection>> {
        self.read_collection(key)
    }

    fn write(&self, key: &str, collection: &FeatureCollection) -> Result<()> {
        self.write_collection(key, collection)
    }
}

/// Where the initial collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    Cache,
    Document,
    Empty,
}

/// Read and validate a GeoJSON document from disk.
pub fn read_document(path: &Path) -> Result<FeatureCollection> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let collection = FeatureCollection::from_json(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(collection)
}

pub struct FeatureStore {
    key: String,
    collection: FeatureCollection,
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteSync>,
}

impl FeatureStore {
    pub fn new(
        key: impl Into<String>,
        initial: FeatureCollection,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteSync>,
    ) -> Self {
        Self {
            key: key.into(),
            collection: initial,
            cache,
            remote,
        }
    }

    /// Build the store from the cache, then the static document, then an
    /// empty collection. Load failures are logged and never surfaced.
    pub fn load(
        key: impl Into<String>,
        document: Option<&Path>,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteSync>,
    ) -> (Self, LoadSource) {
        let key = key.into();

        match cache.read(&key) {
            Ok(Some(collection)) => {
                tracing::info!(features = collection.len(), "Loaded collection from cache");
                return (Self::new(key, collection, cache, remote), LoadSource::Cache);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read cache, ignoring it: {:#}", e),
        }

        if let Some(path) = document {
            match read_document(path) {
                Ok(collection) => {
                    tracing::info!(
                        features = collection.len(),
                        "Loaded collection from {}",
                        path.display()
                    );
                    let store = Self::new(key, collection, cache, remote);
                    store.write_cache();
                    return (store, LoadSource::Document);
                }
                Err(e) => tracing::warn!("Falling back to an empty collection: {:#}", e),
            }
        }

        (
            Self::new(key, FeatureCollection::empty(), cache, remote),
            LoadSource::Empty,
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.collection.get(key)
    }

    /// Save the editor's draft into the collection.
    ///
    /// The in-memory collection is updated first; the cache write and the
    /// remote push follow and their failures are not reported.
    pub fn save(&mut self, editor: &mut Editor) -> Result<SaveOutcome, CoreError> {
        let outcome = editor.save(&mut self.collection)?;

        if let Some(feature) = outcome.feature.as_ref() {
            self.write_cache();
            if let Some(feature_id) = feature.key() {
                self.remote.push(RemoteUpdate {
                    feature_id: feature_id.clone(),
                    properties: feature.properties.clone(),
                });
            }
        }

        Ok(outcome)
    }

    fn write_cache(&self) {
        if let Err(e) = self.cache.write(&self.key, &self.collection) {
            tracing::warn!("Failed to write cache, local state kept in memory: {:#}", e);
        }
    }
}
