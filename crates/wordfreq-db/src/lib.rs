//! Persistent table of [`WordRecord`]s backed by SQLite.
//!
//! The store keeps one table generation at a time: [`WordStore::bulk_load`]
//! drops whatever was there and inserts the new records in a single
//! transaction, so readers see either the old generation or the new one.
//! Ids are assigned in insertion order starting at 1 for every generation.
//!
//! Handles move through `Unopened → Open → Closed`. Data operations on a
//! handle that is not open fail with [`StoreError::NotConnected`]; "not
//! found" is never an error (empty lookups, zero-row updates).
//!
//! Logical layout:
//! `WordFreq(word_id INTEGER PRIMARY KEY, form TEXT, lemma TEXT, pos TEXT, freq INTEGER)`.
//! `form` is indexed but not unique.
//!
//! # Example
//! ```no_run
//! use wordfreq_db::WordStore;
//! use wordfreq_types::{Category, WordRecord};
//!
//! # fn main() -> Result<(), wordfreq_db::StoreError> {
//! let mut store = WordStore::open("words.db")?;
//! store.bulk_load(&[WordRecord::new("дощ", "дощ", Category::Noun, 2)])?;
//! let hits = store.lookup_by_form("дощ")?;
//! assert_eq!(hits[0].frequency, 2);
//! assert_eq!(store.update_frequency("дощ", 100)?, 1);
//! store.close()?;
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p wordfreq-db --example dump -- <db>`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, DatabaseName, OpenFlags, Row, ffi, params};
use thiserror::Error;
use tracing::{debug, info};
use wordfreq_types::{Category, WordRecord};

pub const TABLE: &str = "WordFreq";

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS WordFreq (
        word_id INTEGER PRIMARY KEY,
        form    TEXT NOT NULL CHECK (length(form) > 0),
        lemma   TEXT NOT NULL,
        pos     TEXT NOT NULL,
        freq    INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS WordFreq_form ON WordFreq (form);
";
const DROP_TABLE: &str = "DROP TABLE IF EXISTS WordFreq;";
const INSERT: &str = "INSERT INTO WordFreq (form, lemma, pos, freq) VALUES (?1, ?2, ?3, ?4)";
const SELECT_ALL: &str = "SELECT word_id, form, lemma, pos, freq FROM WordFreq ORDER BY word_id";
const SELECT_BY_FORM: &str =
    "SELECT word_id, form, lemma, pos, freq FROM WordFreq WHERE form = ?1 ORDER BY word_id";
const COUNT_BY_POS: &str = "SELECT pos, COUNT(word_id) FROM WordFreq GROUP BY pos";
const COUNT_ALL: &str = "SELECT COUNT(*) FROM WordFreq";
const UPDATE_FREQ: &str = "UPDATE WordFreq SET freq = ?1 WHERE form = ?2";

/// Where the database lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Location {
    File(PathBuf),
    /// Private in-memory database, gone when the handle closes.
    Memory,
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Location::from(s))
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        if s == ":memory:" {
            Location::Memory
        } else {
            Location::File(PathBuf::from(s))
        }
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::File(path)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::File(path.to_path_buf())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Memory => f.write_str(":memory:"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OpenOptions {
    /// Open without write access; writes fail with `Insert`/`Update` errors.
    ///
    /// The table is never created in this mode, so the store must already
    /// exist on disk. [`Location::Memory`] is rejected with a connection error.
    pub read_only: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Unopened,
    Open,
    Closed,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open store at {location}")]
    Connection {
        location: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store is not connected (state: {state:?})")]
    NotConnected { state: ConnectionState },
    #[error("bulk load failed{}", .index.map(|i| format!(" at record {i}")).unwrap_or_default())]
    Insert {
        /// Position of the offending record, if the failure was per-record.
        index: Option<usize>,
        #[source]
        source: rusqlite::Error,
    },
    #[error("updating frequency of {form:?} failed")]
    Update {
        form: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("query failed")]
    Query(#[from] rusqlite::Error),
    #[error("closing store failed")]
    Close {
        #[source]
        source: rusqlite::Error,
    },
}

enum Handle {
    Unopened,
    Open(Connection),
    Closed,
}

/// Handle to the word frequency table.
///
/// The connection is owned by the handle and released by [`WordStore::close`]
/// or, failing that, when the handle is dropped.
pub struct WordStore {
    location: Location,
    handle: Handle,
}

impl WordStore {
    /// Unopened handle; call [`WordStore::connect`] before use.
    pub fn new(location: impl Into<Location>) -> Self {
        Self {
            location: location.into(),
            handle: Handle::Unopened,
        }
    }

    /// Open a read-write store, creating the table if needed.
    pub fn open(location: impl Into<Location>) -> Result<Self, StoreError> {
        Self::open_with(location, OpenOptions::default())
    }

    pub fn open_with(
        location: impl Into<Location>,
        options: OpenOptions,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(location);
        store.connect_with(options)?;
        Ok(store)
    }

    pub fn connect(&mut self) -> Result<(), StoreError> {
        self.connect_with(OpenOptions::default())
    }

    /// `Unopened → Open`. No-op when already open; a closed handle stays closed.
    pub fn connect_with(&mut self, options: OpenOptions) -> Result<(), StoreError> {
        match self.handle {
            Handle::Open(_) => return Ok(()),
            Handle::Closed => {
                return Err(StoreError::NotConnected {
                    state: ConnectionState::Closed,
                });
            }
            Handle::Unopened => {}
        }
        if options.read_only && self.location == Location::Memory {
            return Err(StoreError::Connection {
                location: self.location.to_string(),
                source: refused(
                    ffi::SQLITE_CANTOPEN,
                    "read-only in-memory store has no table",
                ),
            });
        }

        let flags = if options.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };
        let connection_error = |source| StoreError::Connection {
            location: self.location.to_string(),
            source,
        };
        let conn = match &self.location {
            Location::File(path) => Connection::open_with_flags(path, flags),
            Location::Memory => Connection::open_in_memory_with_flags(flags),
        }
        .map_err(connection_error)?;
        if !options.read_only {
            conn.execute_batch(CREATE_SCHEMA).map_err(connection_error)?;
            // SQLite falls back to read-only for write-protected files.
            if conn.is_readonly(DatabaseName::Main).map_err(connection_error)? {
                return Err(connection_error(refused(
                    ffi::SQLITE_READONLY,
                    "store is not writable",
                )));
            }
        }

        info!(
            "opened store at {} (read-only: {})",
            self.location, options.read_only
        );
        self.handle = Handle::Open(conn);
        Ok(())
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn state(&self) -> ConnectionState {
        match self.handle {
            Handle::Unopened => ConnectionState::Unopened,
            Handle::Open(_) => ConnectionState::Open,
            Handle::Closed => ConnectionState::Closed,
        }
    }

    /// Replace the table contents with `records`.
    ///
    /// Runs in one transaction: on failure nothing changes and the previous
    /// generation is still in place. Incoming ids are ignored. Duplicate
    /// forms are accepted. Returns the number of rows inserted.
    pub fn bulk_load(&mut self, records: &[WordRecord]) -> Result<usize, StoreError> {
        let conn = self.connection_mut()?;
        let insert_error = |index| move |source| StoreError::Insert { index, source };

        let tx = conn.transaction().map_err(insert_error(None))?;
        tx.execute_batch(DROP_TABLE).map_err(insert_error(None))?;
        tx.execute_batch(CREATE_SCHEMA).map_err(insert_error(None))?;
        {
            let mut stmt = tx.prepare(INSERT).map_err(insert_error(None))?;
            for (i, rec) in records.iter().enumerate() {
                stmt.execute(params![
                    rec.form,
                    rec.lemma,
                    rec.category.as_tag(),
                    rec.frequency
                ])
                .map_err(insert_error(Some(i)))?;
            }
        }
        tx.commit().map_err(insert_error(None))?;

        info!("inserted {} records into {TABLE}", records.len());
        Ok(records.len())
    }

    /// Every row of the current generation, by id.
    pub fn select_all(&self) -> Result<Vec<WordRecord>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(SELECT_ALL)?;
        let rows = stmt
            .query_map([], read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows whose form equals `form` exactly (case-sensitive).
    pub fn lookup_by_form(&self, form: &str) -> Result<Vec<WordRecord>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(SELECT_BY_FORM)?;
        let rows = stmt
            .query_map([form], read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("lookup {form:?}: {} rows", rows.len());
        Ok(rows)
    }

    /// Row count per category. Absent categories have no entry.
    pub fn aggregate_by_category(&self) -> Result<BTreeMap<Category, usize>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(COUNT_BY_POS)?;
        let rows = stmt.query_map([], |row| {
            Ok((parse_category(row, 0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (category, count) = row?;
            *counts.entry(category).or_insert(0) += count as usize;
        }
        Ok(counts)
    }

    /// Set the frequency of every row with this form.
    ///
    /// Returns the number of rows changed; `0` means the form is not stored.
    pub fn update_frequency(&mut self, form: &str, frequency: u32) -> Result<usize, StoreError> {
        let conn = self.connection_mut()?;
        let affected = conn
            .execute(UPDATE_FREQ, params![frequency, form])
            .map_err(|source| StoreError::Update {
                form: form.to_string(),
                source,
            })?;
        debug!("update {form:?} -> {frequency}: {affected} rows");
        Ok(affected)
    }

    /// Number of rows in the current generation.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row(COUNT_ALL, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Release the connection. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), StoreError> {
        match std::mem::replace(&mut self.handle, Handle::Closed) {
            Handle::Open(conn) => {
                conn.close()
                    .map_err(|(_, source)| StoreError::Close { source })?;
                info!("closed store at {}", self.location);
                Ok(())
            }
            Handle::Unopened | Handle::Closed => Ok(()),
        }
    }

    fn connection(&self) -> Result<&Connection, StoreError> {
        match &self.handle {
            Handle::Open(conn) => Ok(conn),
            _ => Err(StoreError::NotConnected {
                state: self.state(),
            }),
        }
    }

    fn connection_mut(&mut self) -> Result<&mut Connection, StoreError> {
        let state = self.state();
        match &mut self.handle {
            Handle::Open(conn) => Ok(conn),
            _ => Err(StoreError::NotConnected { state }),
        }
    }
}

impl fmt::Debug for WordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordStore")
            .field("location", &self.location)
            .field("state", &self.state())
            .finish()
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<WordRecord> {
    Ok(WordRecord {
        id: Some(row.get(0)?),
        form: row.get(1)?,
        lemma: row.get(2)?,
        category: parse_category(row, 3)?,
        frequency: row.get(4)?,
    })
}

fn refused(code: std::os::raw::c_int, message: &str) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some(message.to_string()))
}

fn parse_category(row: &Row<'_>, idx: usize) -> rusqlite::Result<Category> {
    let tag: String = row.get(idx)?;
    tag.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
