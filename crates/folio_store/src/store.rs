//! The record-collection store.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use crate::file::FileBackend;
use crate::memory::InMemoryBackend;
use crate::schema::{self, CollectionSpec, Manifest, MANIFEST_BLOB, SCHEMA_LADDER, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::Path;

/// A schema-versioned store of named record collections.
///
/// `Store` is the persistence boundary of the Folio core. Records are JSON
/// objects carrying their own `"id"` field; each collection is one blob on
/// the [`StoreBackend`]. Every `put` is verified by reading the collection
/// back from the backend and confirming the key is present, which turns
/// silent write loss into an explicit [`StoreError::VerifyFailed`].
///
/// # Opening a Store
///
/// ```rust
/// use folio_store::{schema, Store};
///
/// let store = Store::open_in_memory().unwrap();
/// let id = store
///     .put(schema::DOCUMENTS, &serde_json::json!({"id": "d1", "title": "Flyer"}))
///     .unwrap();
/// assert_eq!(id, "d1");
/// ```
///
/// Atomicity covers a single record write; there is no transaction spanning
/// collections.
pub struct Store {
    backend: RwLock<Box<dyn StoreBackend>>,
    manifest: RwLock<Manifest>,
    is_open: RwLock<bool>,
}

impl Store {
    /// Opens a persistent store rooted at the given directory, applying any
    /// pending schema upgrades.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is unusable, the manifest is
    /// corrupt, or the store was written by a newer schema version.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        Self::open_with_backend(Box::new(FileBackend::open(dir)?))
    }

    /// Opens a fresh in-memory store for tests and ephemeral use.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with_backend(Box::new(InMemoryBackend::new()))
    }

    /// Opens a store over a pre-configured backend.
    pub fn open_with_backend(mut backend: Box<dyn StoreBackend>) -> StoreResult<Self> {
        let mut manifest = match backend.read(MANIFEST_BLOB)? {
            Some(bytes) => serde_json::from_slice::<Manifest>(&bytes)
                .map_err(|err| StoreError::corrupt(format!("unreadable manifest: {err}")))?,
            None => Manifest::empty(),
        };

        if manifest.schema_version > SCHEMA_VERSION {
            return Err(StoreError::schema(format!(
                "store schema v{} is newer than supported v{}",
                manifest.schema_version, SCHEMA_VERSION
            )));
        }

        // Additive upgrades only: create what the older version lacked,
        // never touch existing collections.
        for (version, specs) in SCHEMA_LADDER {
            if *version <= manifest.schema_version {
                continue;
            }
            for spec in *specs {
                if backend.read(spec.name)?.is_none() {
                    backend.write(spec.name, b"{}")?;
                }
                if !manifest.collections.iter().any(|c| c == spec.name) {
                    manifest.collections.push(spec.name.to_string());
                }
            }
            manifest.schema_version = *version;
            tracing::info!(version, "applied schema upgrade");
        }

        backend.write(MANIFEST_BLOB, &serde_json::to_vec(&manifest)?)?;
        backend.sync()?;

        Ok(Self {
            backend: RwLock::new(backend),
            manifest: RwLock::new(manifest),
            is_open: RwLock::new(true),
        })
    }

    /// Writes a record and verifies it by reading the collection back.
    ///
    /// The record must be a JSON object with a non-empty string `"id"`.
    /// Returns the record id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidRecord`] when the record has no usable id
    /// - [`StoreError::VerifyFailed`] when the read-back does not confirm
    ///   the write
    /// - I/O and corruption errors from the backend
    pub fn put(&self, collection: &str, record: &Value) -> StoreResult<String> {
        self.ensure_open()?;
        self.spec(collection)?;

        let id = record
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                StoreError::invalid_record(format!(
                    "record for '{collection}' has no non-empty string 'id'"
                ))
            })?
            .to_string();

        let mut backend = self.backend.write();
        let mut records = load_records(backend.as_ref(), collection)?;
        records.insert(id.clone(), record.clone());
        backend.write(collection, &serde_json::to_vec(&Value::Object(records))?)?;
        backend.sync()?;

        // Verify-by-readback: go through the backend again, not the map we
        // just built.
        let confirmed = load_records(backend.as_ref(), collection)?.contains_key(&id);
        if !confirmed {
            tracing::warn!(collection, id, "write did not read back");
            return Err(StoreError::VerifyFailed {
                collection: collection.to_string(),
                id,
            });
        }

        tracing::debug!(collection, id, "record stored");
        Ok(id)
    }

    /// Reads one record by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the record does not exist; otherwise
    /// backend I/O or corruption errors.
    pub fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Value> {
        self.ensure_open()?;
        self.spec(collection)?;

        let backend = self.backend.read();
        load_records(backend.as_ref(), collection)?
            .remove(id)
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    /// Reads all records in a collection, in unspecified order.
    pub fn get_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        self.ensure_open()?;
        self.spec(collection)?;

        let backend = self.backend.read();
        Ok(load_records(backend.as_ref(), collection)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// Reads the records whose indexed field equals `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Schema`] when the collection has no such index.
    pub fn get_by_index(&self, collection: &str, index: &str, key: &str) -> StoreResult<Vec<Value>> {
        let field = self.index_field(collection, index)?;
        self.ensure_open()?;

        let backend = self.backend.read();
        Ok(load_records(backend.as_ref(), collection)?
            .into_iter()
            .filter(|(_, record)| record.get(field).and_then(Value::as_str) == Some(key))
            .map(|(_, record)| record)
            .collect())
    }

    /// Reads all records in a collection ordered by an indexed field.
    pub fn list_sorted(
        &self,
        collection: &str,
        index: &str,
        descending: bool,
    ) -> StoreResult<Vec<Value>> {
        let field = self.index_field(collection, index)?;
        self.ensure_open()?;

        let backend = self.backend.read();
        let mut records: Vec<Value> = load_records(backend.as_ref(), collection)?
            .into_iter()
            .map(|(_, record)| record)
            .collect();

        records.sort_by(|a, b| {
            let ka = index_sort_key(a.get(field));
            let kb = index_sort_key(b.get(field));
            if descending {
                kb.cmp(&ka)
            } else {
                ka.cmp(&kb)
            }
        });
        Ok(records)
    }

    /// Deletes a record by id. Deleting an absent record is not an error.
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.spec(collection)?;

        let mut backend = self.backend.write();
        let mut records = load_records(backend.as_ref(), collection)?;
        if records.remove(id).is_none() {
            tracing::debug!(collection, id, "delete of absent record");
            return Ok(());
        }
        backend.write(collection, &serde_json::to_vec(&Value::Object(records))?)?;
        backend.sync()?;
        Ok(())
    }

    /// Returns the number of records in a collection.
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        self.ensure_open()?;
        self.spec(collection)?;
        let backend = self.backend.read();
        Ok(load_records(backend.as_ref(), collection)?.len())
    }

    /// Returns the schema version the store is at.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.manifest.read().schema_version
    }

    /// Returns per-collection record counts, for diagnostics.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        self.ensure_open()?;
        let collections = self.manifest.read().collections.clone();
        let backend = self.backend.read();

        let mut stats = Vec::with_capacity(collections.len());
        for name in collections {
            let records = load_records(backend.as_ref(), &name)?.len();
            stats.push(CollectionStats { name, records });
        }
        Ok(StoreStats {
            schema_version: self.schema_version(),
            collections: stats,
        })
    }

    /// Closes the store. Further operations fail with
    /// [`StoreError::Closed`]. Closing twice is harmless.
    pub fn close(&self) -> StoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }
        self.backend.write().sync()?;
        *is_open = false;
        Ok(())
    }

    /// Checks whether the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    fn spec(&self, collection: &str) -> StoreResult<&'static CollectionSpec> {
        let known = self.manifest.read().collections.iter().any(|c| c == collection);
        if !known {
            return Err(StoreError::CollectionNotFound {
                name: collection.to_string(),
            });
        }
        schema::collection_spec(collection).ok_or_else(|| StoreError::CollectionNotFound {
            name: collection.to_string(),
        })
    }

    fn index_field(&self, collection: &str, index: &str) -> StoreResult<&'static str> {
        let spec = self.spec(collection)?;
        spec.index(index)
            .map(|idx| idx.field)
            .ok_or_else(|| {
                StoreError::schema(format!("collection '{collection}' has no index '{index}'"))
            })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("is_open", &self.is_open())
            .field("schema_version", &self.schema_version())
            .finish_non_exhaustive()
    }
}

/// Diagnostic counters for the whole store.
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Current schema version.
    pub schema_version: u32,
    /// Per-collection record counts.
    pub collections: Vec<CollectionStats>,
}

/// Diagnostic counters for one collection.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Number of records.
    pub records: usize,
}

fn load_records(backend: &dyn StoreBackend, collection: &str) -> StoreResult<Map<String, Value>> {
    match backend.read(collection)? {
        None => Ok(Map::new()),
        Some(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(records)) => Ok(records),
            Ok(_) => Err(StoreError::corrupt(format!(
                "collection '{collection}' is not an object"
            ))),
            Err(err) => Err(StoreError::corrupt(format!(
                "collection '{collection}' is unreadable: {err}"
            ))),
        },
    }
}

/// Sort key for an indexed field: timestamps order chronologically, other
/// values lexicographically.
fn index_sort_key(value: Option<&Value>) -> (Option<i64>, String) {
    match value {
        Some(Value::String(text)) => match text.parse::<DateTime<Utc>>() {
            Ok(ts) => (Some(ts.timestamp_millis()), String::new()),
            Err(_) => (None, text.clone()),
        },
        Some(Value::Number(n)) => (n.as_i64(), n.to_string()),
        Some(other) => (None, other.to_string()),
        None => (None, String::new()),
    }
}
