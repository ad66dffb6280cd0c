//! Record table storage
//!
//! The table file is the single source of truth for records. Every write
//! goes to a fresh temp file in the table's directory, which is synced and
//! renamed into place, so a reader sees either the old table or the new one.
//!
//! Everything that writes, including first-time initialization, holds a
//! store-wide lock, which serializes writers inside one process. Nothing
//! protects against other processes writing the same file.

pub mod table;

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{Record, RecordDraft, RecordId};
use table::Table;

/// Errors from the record table
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record table I/O failed for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Record id space exhausted: cannot assign {requested} ids after {highest}")]
    IdsExhausted { highest: RecordId, requested: usize },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// File-backed record table
pub struct RecordStore {
    /// Location of the table
    path: PathBuf,
    /// Held by every write, across read-modify-write cycles
    write_lock: Mutex<()>,
}

impl RecordStore {
    /// Create a store for the table at `path`. The file is created lazily on
    /// first read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the table file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, in table order.
    ///
    /// A missing or empty table is initialized with just the header.
    pub fn read_all(&self) -> StorageResult<Vec<Record>> {
        Ok(self.read_table()?.into_records())
    }

    /// Read the full table, rows without a valid id included
    pub fn read_table(&self) -> StorageResult<Table> {
        Ok(Table::parse(&self.read_text()?))
    }

    /// Raw table text, initializing the table first if needed
    pub fn read_text(&self) -> StorageResult<String> {
        if let Some(text) = self.try_read_text()? {
            return Ok(text);
        }
        let _guard = self.write_lock.lock();
        self.read_text_locked()
    }

    fn try_read_text(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    /// Caller holds `write_lock`. Re-checks the file, since another writer may
    /// have created it in the meantime.
    fn read_text_locked(&self) -> StorageResult<String> {
        if let Some(text) = self.try_read_text()? {
            return Ok(text);
        }
        info!("Initializing record table at {}", self.path.display());
        let header = table::header_line();
        self.write_text(&header)?;
        Ok(header)
    }

    /// URLs of all stored rows
    pub fn existing_urls(&self) -> StorageResult<HashSet<String>> {
        Ok(self.read_table()?.urls().map(str::to_string).collect())
    }

    /// Largest id in the table, or 0 when empty
    pub fn highest_id(&self) -> StorageResult<RecordId> {
        Ok(self.read_table()?.highest_id())
    }

    /// Assign ids to `drafts` in order and append them to the table.
    ///
    /// Returns the new records with their ids.
    pub fn append_new(&self, drafts: Vec<RecordDraft>) -> StorageResult<Vec<Record>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = self.write_lock.lock();
        let mut table = Table::parse(&self.read_text_locked()?);
        let highest = table.highest_id();
        let last_id = highest
            .checked_add(drafts.len() as u64)
            .ok_or(StorageError::IdsExhausted {
                highest,
                requested: drafts.len(),
            })?;
        let first_id = highest + 1;

        let created: Vec<Record> = drafts
            .into_iter()
            .zip(first_id..=last_id)
            .map(|(draft, id)| Record::from_draft(id, draft))
            .collect();

        for record in &created {
            table.push(record.clone());
        }
        self.write_text(&table.render())?;

        debug!("Appended {} records (ids {}..={})", created.len(), first_id, last_id);
        Ok(created)
    }

    /// Replace stored records sharing an id with `updates`; updates with an
    /// unknown id are appended. A record's `date_added` never changes once
    /// stored.
    pub fn upsert_by_key(&self, updates: Vec<Record>) -> StorageResult<()> {
        if let Some(bad) = updates.iter().find(|r| r.id == 0) {
            return Err(StorageError::InvalidRecord(format!(
                "record ids must be positive (url '{}')",
                bad.url
            )));
        }
        if updates.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock();
        let mut table = Table::parse(&self.read_text_locked()?);
        let (replaced, inserted) = table.upsert(updates);
        self.write_text(&table.render())?;

        debug!("Upserted records: {} replaced, {} inserted", replaced, inserted);
        Ok(())
    }

    /// Rewrite the whole table with `records`
    pub fn write_all(&self, records: &[Record]) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        self.write_text(&table::render_table(records))
    }

    /// Rewrite the whole table with `table`, unparsed rows included
    pub fn write_table(&self, table: &Table) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        self.write_text(&table.render())
    }

    /// Write atomically through a uniquely named temp file next to the table.
    /// Caller holds `write_lock`.
    fn write_text(&self, text: &str) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(".linkledger-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| StorageError::io(dir, e))?;
        temp.write_all(text.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| StorageError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;
        Ok(())
    }
}
