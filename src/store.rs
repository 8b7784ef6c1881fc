//! JSON document store
//!
//! Device uploads are kept per subject, one document per upload, in the same
//! shape the device sends them:
//!
//! ```json
//! { "users": { "raz": [ {
//!     "m5Details":    { "ax": 0.01, "ay": -0.02, "az": 0.98 },
//!     "shtDetails":   { "temp": 21.4, "rHum": 43.1 },
//!     "vcnlDetails":  { "prox": 3, "al": 120, "rwl": 240 },
//!     "otherDetails": { "timeCaptured": 1744662005, "userId": "raz" }
//! } ] } }
//! ```
//!
//! The file is read lazily on first use and kept in memory for the life of
//! the handle. Uploads mark the store dirty; [`DocumentStore::close`] writes
//! them back.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tally_core::{Reading, ReadingSource, SourceError, SubjectRegistry};
use thiserror_no_std::Error;

use crate::config::StoreConfig;

/// Group holding capture metadata rather than sensor fields.
pub const META_GROUP: &str = "otherDetails";
pub const TIME_CAPTURED_FIELD: &str = "timeCaptured";
pub const USER_ID_FIELD: &str = "userId";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store file could not be opened or written
    #[error("store {path} unavailable: {reason}")]
    Unavailable { path: String, reason: String },
    /// The store file is not a valid document collection
    #[error("store {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
    /// A stored or uploaded document does not have the expected shape
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    /// An upload names a subject that is not a concrete registry entry
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
}

impl From<StoreError> for SourceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable { .. } => SourceError::Unavailable(value.to_string()),
            StoreError::Corrupt { .. }
            | StoreError::InvalidDocument(_)
            | StoreError::UnknownSubject(_) => SourceError::Query(value.to_string()),
        }
    }
}

/// On-disk layout.
#[derive(Serialize, Deserialize, Debug, Default)]
struct Collections {
    #[serde(default)]
    users: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Default)]
struct State {
    collections: Option<Collections>,
    dirty: bool,
}

/// Handle to a JSON document store.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    create_if_missing: bool,
    state: Mutex<State>,
}

impl DocumentStore {
    /// Creates a handle. Nothing is read until the first query or upload.
    pub fn open(config: &StoreConfig) -> Self {
        Self {
            path: config.path.clone(),
            create_if_missing: config.create_if_missing,
            state: Mutex::new(State::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl ToString) -> StoreError {
        StoreError::Unavailable {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn load(&self) -> Result<Collections, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound && self.create_if_missing => {
                info!("Store {} does not exist yet, starting empty", self.path.display());
                return Ok(Collections::default());
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        let collections: Collections =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "Loaded store {} ({} collections)",
            self.path.display(),
            collections.users.len()
        );
        Ok(collections)
    }

    /// Runs `f` against the loaded collections, loading them on first use.
    fn with_collections<T>(
        &self,
        f: impl FnOnce(&mut Collections, &mut bool) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| self.unavailable("store lock poisoned"))?;

        if state.collections.is_none() {
            state.collections = Some(self.load()?);
        }

        let State { collections, dirty } = &mut *state;
        match collections.as_mut() {
            Some(collections) => f(collections, dirty),
            None => Err(self.unavailable("store not loaded")),
        }
    }

    /// Readings of `subject` captured at or after `since`.
    ///
    /// An unknown collection is empty, not an error. Documents without a
    /// numeric capture time never match a time filter and are skipped.
    pub fn readings_since(&self, subject: &str, since: i64) -> Result<Vec<Reading>, StoreError> {
        self.with_collections(|collections, _| {
            let Some(documents) = collections.users.get(subject) else {
                debug!("No collection for {}", subject);
                return Ok(Vec::new());
            };

            let mut readings = Vec::new();
            for (index, document) in documents.iter().enumerate() {
                let reading = match document_to_reading(document) {
                    Ok(reading) => reading,
                    Err(e) => {
                        warn!("Skipping {} document #{}: {}", subject, index, e);
                        continue;
                    }
                };
                if reading.timestamp() >= since {
                    readings.push(reading);
                }
            }
            debug!(
                "{}: {} of {} documents since {}",
                subject,
                readings.len(),
                documents.len(),
                since
            );
            Ok(readings)
        })
    }

    /// Appends an uploaded document to its subject's collection.
    ///
    /// The document must name a concrete subject of `registry`; composite
    /// aliases are rejected. Returns the subject it was filed under.
    pub fn upload(
        &self,
        document: Value,
        registry: &SubjectRegistry,
    ) -> Result<String, StoreError> {
        let subject = document_subject(&document)?;
        if !registry.is_concrete(&subject) {
            return Err(StoreError::UnknownSubject(subject));
        }
        // Reject documents that could not be read back later
        document_to_reading(&document)?;

        self.with_collections(|collections, dirty| {
            collections
                .users
                .entry(subject.clone())
                .or_default()
                .push(document);
            *dirty = true;
            debug!("Uploaded document for {}", subject);
            Ok(subject)
        })
    }

    /// Number of documents stored for `subject`.
    pub fn document_count(&self, subject: &str) -> Result<usize, StoreError> {
        self.with_collections(|collections, _| {
            Ok(collections.users.get(subject).map_or(0, Vec::len))
        })
    }

    /// Writes pending uploads back to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| self.unavailable("store lock poisoned"))?;

        let State { collections, dirty } = &mut *state;
        let Some(collections) = collections.as_ref() else {
            return Ok(());
        };
        if !*dirty {
            return Ok(());
        }

        self.write(collections)?;
        *dirty = false;
        Ok(())
    }

    fn write(&self, collections: &Collections) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(|e| self.unavailable(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, collections).map_err(|e| self.unavailable(e))?;
        writer.flush().map_err(|e| self.unavailable(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.unavailable(e))?;

        info!("Wrote store {}", self.path.display());
        Ok(())
    }

    /// Flushes pending uploads and releases the handle.
    pub fn close(self) -> Result<(), StoreError> {
        let result = self.flush();
        if let Err(e) = &result {
            warn!("Closing store with unsaved uploads: {}", e);
        }
        result
    }
}

impl ReadingSource for DocumentStore {
    type Readings = Vec<Reading>;

    async fn query(&self, subject: &str, since: i64) -> Result<Vec<Reading>, SourceError> {
        Ok(self.readings_since(subject, since)?)
    }
}

/// Capture time of a document, in whole seconds.
fn time_captured(meta: &Map<String, Value>) -> Option<i64> {
    let value = meta.get(TIME_CAPTURED_FIELD)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64))
}

/// Converts a stored document into a reading.
///
/// Every object-valued key except the metadata group becomes a sensor group;
/// non-numeric fields are ignored.
pub fn document_to_reading(document: &Value) -> Result<Reading, StoreError> {
    let object = document
        .as_object()
        .ok_or_else(|| StoreError::InvalidDocument(String::from("document is not an object")))?;

    let timestamp = object
        .get(META_GROUP)
        .and_then(Value::as_object)
        .and_then(time_captured)
        .ok_or_else(|| {
            StoreError::InvalidDocument(format!(
                "missing numeric {}.{}",
                META_GROUP, TIME_CAPTURED_FIELD
            ))
        })?;

    let mut reading = Reading::new(timestamp);
    for (group, fields) in object {
        if group == META_GROUP {
            continue;
        }
        let Some(fields) = fields.as_object() else {
            continue;
        };
        for (field, value) in fields {
            if let Some(value) = value.as_f64() {
                reading = reading.with_value(group, field, value);
            }
        }
    }
    Ok(reading)
}

/// Subject a document belongs to (`otherDetails.userId`).
pub fn document_subject(document: &Value) -> Result<String, StoreError> {
    document
        .get(META_GROUP)
        .and_then(|meta| meta.get(USER_ID_FIELD))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            StoreError::InvalidDocument(format!("missing {}.{}", META_GROUP, USER_ID_FIELD))
        })
}
