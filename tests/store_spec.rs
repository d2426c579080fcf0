use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cartoquartier::db::Database;
use cartoquartier::editor::{EditField, Editor};
use cartoquartier::models::*;
use cartoquartier::store::{FeatureStore, LoadSource, LocalCache};
use cartoquartier::sync::{NoopSync, RemoteSync, RemoteUpdate};
use speculate2::speculate;

const KEY: &str = "cartoquartier:features";

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sectors.geojson")
}

fn memory_db() -> Arc<Database> {
    let db = Database::open_memory().expect("Failed to create in-memory database");
    Arc::new(db)
}

#[derive(Default)]
struct RecordingSync {
    updates: Mutex<Vec<RemoteUpdate>>,
}

impl RemoteSync for RecordingSync {
    fn push(&self, update: RemoteUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

struct BrokenCache;

impl LocalCache for BrokenCache {
    fn read(&self, _key: &str) -> anyhow::Result<Option<FeatureCollection>> {
        Err(anyhow::anyhow!("disk unavailable"))
    }

    fn write(&self, _key: &str, _collection: &FeatureCollection) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk unavailable"))
    }
}

fn two_features() -> FeatureCollection {
    let geometry = serde_json::json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
    FeatureCollection::new(vec![
        Feature::new(
            1,
            FeatureProperties {
                phase: Some(Phase::One),
                ..Default::default()
            },
            geometry.clone(),
        ),
        Feature::new(
            2,
            FeatureProperties {
                phase: Some(Phase::Two),
                ..Default::default()
            },
            geometry,
        ),
    ])
}

speculate! {
    before {
        let db = memory_db();
    }

    describe "database cache" {
        it "returns None when nothing is cached" {
            assert!(db.read_collection(KEY).expect("Query failed").is_none());
            assert!(db.cached_at(KEY).expect("Query failed").is_none());
        }

        it "round-trips a collection under its key" {
            let collection = two_features();
            db.write_collection(KEY, &collection).expect("Write failed");

            let cached = db.read_collection(KEY).expect("Query failed");
            assert_eq!(cached, Some(collection));
            assert!(db.cached_at(KEY).expect("Query failed").is_some());
            assert!(db.read_collection("other").expect("Query failed").is_none());
        }

        it "overwrites the previous value" {
            db.write_collection(KEY, &two_features()).expect("Write failed");
            db.write_collection(KEY, &FeatureCollection::empty()).expect("Write failed");

            let cached = db.read_collection(KEY).expect("Query failed").unwrap();
            assert!(cached.is_empty());
        }

        it "deletes the cached collection" {
            db.write_collection(KEY, &two_features()).expect("Write failed");
            assert!(db.delete_collection(KEY).expect("Delete failed"));
            assert!(!db.delete_collection(KEY).expect("Delete failed"));
            assert!(db.read_collection(KEY).expect("Query failed").is_none());
        }

        it "persists across reopening a file database" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("cache.db");

            let file_db = Database::open(path.clone()).expect("Failed to open");
            file_db.write_collection(KEY, &two_features()).expect("Write failed");
            drop(file_db);

            let reopened = Database::open(path).expect("Failed to reopen");
            assert_eq!(reopened.read_collection(KEY).expect("Query failed"), Some(two_features()));
        }
    }

    describe "initial load" {
        it "prefers the cached collection" {
            db.write_collection(KEY, &two_features()).expect("Write failed");

            let (store, source) = FeatureStore::load(KEY, Some(fixture().as_path()), db.clone(), Arc::new(NoopSync));

            assert_eq!(source, LoadSource::Cache);
            assert_eq!(store.collection(), &two_features());
        }

        it "loads the document and writes it through to the cache" {
            let (store, source) = FeatureStore::load(KEY, Some(fixture().as_path()), db.clone(), Arc::new(NoopSync));

            assert_eq!(source, LoadSource::Document);
            assert_eq!(store.collection().len(), 4);
            assert_eq!(db.read_collection(KEY).expect("Query failed").as_ref(), Some(store.collection()));
        }

        it "falls back to an empty collection when the document is missing" {
            let missing = PathBuf::from("/nonexistent/sectors.geojson");
            let (store, source) = FeatureStore::load(KEY, Some(missing.as_path()), db.clone(), Arc::new(NoopSync));

            assert_eq!(source, LoadSource::Empty);
            assert!(store.collection().is_empty());
            assert_eq!(store.collection().kind, "FeatureCollection");
        }

        it "falls back to an empty collection when the document is malformed" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("broken.geojson");
            std::fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();

            let (store, source) = FeatureStore::load(KEY, Some(path.as_path()), db.clone(), Arc::new(NoopSync));

            assert_eq!(source, LoadSource::Empty);
            assert!(store.collection().is_empty());
        }

        it "ignores an unreadable cache" {
            let (store, source) = FeatureStore::load(KEY, Some(fixture().as_path()), Arc::new(BrokenCache), Arc::new(NoopSync));

            assert_eq!(source, LoadSource::Document);
            assert_eq!(store.collection().len(), 4);
        }
    }

    describe "saving edits" {
        it "updates memory, cache and remote in that order" {
            let remote = Arc::new(RecordingSync::default());
            let mut store = FeatureStore::new(KEY, two_features(), db.clone(), remote.clone());
            let mut editor = Editor::new();

            editor.select(store.get("2").unwrap());
            editor.update(EditField::Status, "occupied").unwrap();
            let outcome = store.save(&mut editor).expect("Save failed");

            assert!(outcome.applied);
            let saved = store.get("2").unwrap();
            assert_eq!(saved.properties.status, Some(Status::Occupied));
            assert_eq!(saved.properties.phase, Some(Phase::Two));
            assert_eq!(store.get("1").unwrap().properties.status, None);

            let cached = db.read_collection(KEY).expect("Query failed").unwrap();
            assert_eq!(&cached, store.collection());

            let updates = remote.updates.lock().unwrap();
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].feature_id, FeatureId::Number(2));
            assert_eq!(updates[0].properties.status, Some(Status::Occupied));
        }

        it "keeps successive edits in order" {
            let remote = Arc::new(RecordingSync::default());
            let mut store = FeatureStore::new(KEY, two_features(), db.clone(), remote.clone());
            let mut editor = Editor::new();

            for name in ["first", "second"] {
                editor.select(store.get("1").unwrap());
                editor.update(EditField::Name, name).unwrap();
                store.save(&mut editor).expect("Save failed");
            }

            let cached = db.read_collection(KEY).expect("Query failed").unwrap();
            assert_eq!(cached.features[0].properties.name.as_deref(), Some("second"));
            let names: Vec<_> = remote
                .updates
                .lock()
                .unwrap()
                .iter()
                .map(|u| u.properties.name.clone().unwrap())
                .collect();
            assert_eq!(names, vec!["first", "second"]);
        }

        it "keeps the local update when the cache write fails" {
            let remote = Arc::new(RecordingSync::default());
            let mut store = FeatureStore::new(KEY, two_features(), Arc::new(BrokenCache), remote.clone());
            let mut editor = Editor::new();

            editor.select(store.get("1").unwrap());
            editor.update(EditField::Level, "abc").unwrap();
            let outcome = store.save(&mut editor).expect("Save failed");

            assert!(outcome.applied);
            assert_eq!(store.get("1").unwrap().properties.level, Some(Level::Floor(0)));
            assert_eq!(remote.updates.lock().unwrap().len(), 1);
        }

        it "does nothing for an id missing from the collection" {
            let remote = Arc::new(RecordingSync::default());
            let mut store = FeatureStore::new(KEY, two_features(), db.clone(), remote.clone());
            let mut editor = Editor::new();
            let orphan = Feature::new(
                99,
                FeatureProperties::default(),
                serde_json::json!({"type": "Point", "coordinates": [0, 0]}),
            );

            editor.select(&orphan);
            editor.update(EditField::Name, "ghost").unwrap();
            let outcome = store.save(&mut editor).expect("Save failed");

            assert!(!outcome.applied);
            assert_eq!(store.collection(), &two_features());
            assert!(db.read_collection(KEY).expect("Query failed").is_none());
            assert!(remote.updates.lock().unwrap().is_empty());
        }
    }
}
