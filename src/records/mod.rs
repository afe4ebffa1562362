//! Record stores for the admin and scorer lists.
//!
//! Each list is one flat CSV object. Every operation is a full
//! read → decode → mutate → encode → write cycle against the latest stored
//! text; nothing is cached between requests. There is no locking: two
//! concurrent mutations race on the whole file and the last writer wins.
//!
//! Record ids are transient positions assigned on decode. Removing record 2
//! of 5 shifts ids 3 and 4 down to 2 and 3, so an id is only a valid address
//! within the cycle that produced it.

use std::sync::Arc;

use crate::codec::{self, Record, RECORD_COLUMNS};
use crate::storage::{BlobStore, StorageError};

pub const ADMINS_PATH: &str = "admins.csv";
pub const SCORERS_PATH: &str = "scorers.csv";

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("password already set")]
    PasswordAlreadySet,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ─── RecordFields ─────────────────────────────────────────────────────────────

/// The three caller-editable fields of a record. The password hash is never
/// writable through this type.
#[derive(Debug, Clone)]
pub struct RecordFields {
    pub scout_name: String,
    pub real_name: String,
    pub scout_group: String,
}

impl RecordFields {
    /// Trim all three fields, rejecting any that end up empty.
    fn validated(self) -> Result<Self, StoreError> {
        let fields = Self {
            scout_name: self.scout_name.trim().to_string(),
            real_name: self.real_name.trim().to_string(),
            scout_group: self.scout_group.trim().to_string(),
        };
        if fields.scout_name.is_empty()
            || fields.real_name.is_empty()
            || fields.scout_group.is_empty()
        {
            return Err(StoreError::Validation(
                "scoutName, realName, and scoutGroup are required".to_string(),
            ));
        }
        Ok(fields)
    }
}

// ─── RecordStore ──────────────────────────────────────────────────────────────

/// CRUD over one record list.
pub struct RecordStore {
    store: Arc<dyn BlobStore>,
    path: &'static str,
    /// Records written on first read of a missing or empty list.
    seed: Vec<Record>,
}

impl RecordStore {
    /// The administrator list, seeded with the bootstrap admin so a fresh
    /// deployment always has someone who can log in after setup.
    pub fn admins(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            path: ADMINS_PATH,
            seed: vec![Record {
                id: 0,
                scout_name: "Chip".to_string(),
                real_name: "James Robinson".to_string(),
                scout_group: "1st Blackheath".to_string(),
                password_hash: String::new(),
            }],
        }
    }

    /// The scorer list, seeded empty.
    pub fn scorers(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            path: SCORERS_PATH,
            seed: Vec::new(),
        }
    }

    /// Decode the stored list without seeding. A missing object decodes to
    /// an empty list.
    pub async fn records(&self) -> Result<Vec<Record>, StoreError> {
        let text = self.store.read(self.path).await?.unwrap_or_default();
        Ok(codec::decode(&text, &RECORD_COLUMNS))
    }

    /// The full list, seeding the stored object first if it is missing,
    /// empty, or holds nothing but a header.
    pub async fn list(&self) -> Result<Vec<Record>, StoreError> {
        let records = self.records().await?;
        if !records.is_empty() {
            return Ok(records);
        }
        self.write_back(&self.seed).await?;
        Ok(self.seed.clone())
    }

    /// Append a record with an empty password hash. Returns the updated list.
    pub async fn add(&self, fields: RecordFields) -> Result<Vec<Record>, StoreError> {
        let fields = fields.validated()?;
        // A missing list is seeded in memory before the append, so the first
        // add on a fresh deployment does not lose the bootstrap records.
        let mut records = self.records().await?;
        if records.is_empty() {
            records = self.seed.clone();
        }
        records.push(Record {
            id: records.len(),
            scout_name: fields.scout_name,
            real_name: fields.real_name,
            scout_group: fields.scout_group,
            password_hash: String::new(),
        });
        self.write_back(&records).await?;
        Ok(records)
    }

    /// Replace the editable fields of the record at `id`, keeping its stored
    /// password hash. Returns the updated list.
    pub async fn update(&self, id: usize, fields: RecordFields) -> Result<Vec<Record>, StoreError> {
        let fields = fields.validated()?;
        let text = self.store.read(self.path).await?.ok_or(StoreError::NotFound)?;
        let mut records = codec::decode(&text, &RECORD_COLUMNS);
        let record = records.get_mut(id).ok_or(StoreError::NotFound)?;
        record.scout_name = fields.scout_name;
        record.real_name = fields.real_name;
        record.scout_group = fields.scout_group;
        self.write_back(&records).await?;
        Ok(records)
    }

    /// Remove the record at `id`. Ids above it shift down by one. Returns the
    /// updated, re-indexed list.
    pub async fn remove(&self, id: usize) -> Result<Vec<Record>, StoreError> {
        let text = self.store.read(self.path).await?.ok_or(StoreError::NotFound)?;
        let mut records = codec::decode(&text, &RECORD_COLUMNS);
        if id >= records.len() {
            return Err(StoreError::NotFound);
        }
        records.remove(id);
        reindex(&mut records);
        self.write_back(&records).await?;
        Ok(records)
    }

    /// Store a password hash for the named record (case-insensitive lookup).
    ///
    /// Refuses when a hash is already present. Writing back under the
    /// canonical four-column order upgrades a legacy three-column file in the
    /// same pass, with field values and row order untouched.
    pub async fn set_password(&self, scout_name: &str, hash: &str) -> Result<(), StoreError> {
        let text = self.store.read(self.path).await?.ok_or(StoreError::NotFound)?;
        let mut records = codec::decode(&text, &RECORD_COLUMNS);
        let wanted = scout_name.to_lowercase();
        let record = records
            .iter_mut()
            .find(|r| r.scout_name.to_lowercase() == wanted)
            .ok_or(StoreError::NotFound)?;
        if !record.password_hash.trim().is_empty() {
            return Err(StoreError::PasswordAlreadySet);
        }
        record.password_hash = hash.to_string();
        self.write_back(&records).await?;
        Ok(())
    }

    /// True when the list has records and at least one of them has no
    /// password yet. Every record of a legacy three-column file counts.
    pub async fn needs_setup(&self) -> Result<bool, StoreError> {
        let records = self.records().await?;
        Ok(records.iter().any(|r| r.password_hash.trim().is_empty()))
    }

    async fn write_back(&self, records: &[Record]) -> Result<(), StoreError> {
        let text = codec::encode(records, &RECORD_COLUMNS);
        self.store.write(self.path, &text).await?;
        Ok(())
    }
}

fn reindex(records: &mut [Record]) {
    for (i, record) in records.iter_mut().enumerate() {
        record.id = i;
    }
}
