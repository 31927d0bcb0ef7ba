//! Storage layer for rollcall.
//!
//! This module provides `SQLite`-based persistence for the roster. It is the
//! persistence collaborator behind [`RosterStore`]: bulk replace, bulk
//! delete, snapshot reads, single-record status updates, and an atomic
//! check-in/out toggle.
//!
//! All access goes through one connection guarded by a mutex, and every
//! multi-statement operation runs in a single transaction, so a reader never
//! observes a half-written roster and two toggles of the same identifier
//! cannot interleave.

pub mod migrations;
pub mod schema;
mod store;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::roster::{Status, UserRecord};

pub use store::RosterStore;

const SELECT_USER_COLUMNS: &str = r"
SELECT identifier, name, passport, nationality, extra, status, login_time, logout_time
FROM users
";

/// Result of toggling a roster record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The user is now inside.
    CheckedIn {
        /// The record after the update.
        record: UserRecord,
    },
    /// The user is now outside.
    CheckedOut {
        /// The record after the update.
        record: UserRecord,
    },
    /// The room was full; nothing changed.
    Denied {
        /// Occupancy at the time of the scan.
        occupancy: usize,
        /// The enforced capacity.
        capacity: usize,
    },
    /// No record carries the scanned identifier.
    NotFound {
        /// The identifier that was scanned.
        identifier: String,
    },
}

impl ToggleOutcome {
    /// Message to show the person who scanned.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::CheckedIn { record } => format!("Welcome, {}. You are logged in.", record.name),
            Self::CheckedOut { record } => {
                format!("Goodbye, {}. You are logged out.", record.name)
            }
            Self::Denied { .. } => "Room is at full capacity.".to_string(),
            Self::NotFound { .. } => "User not found.".to_string(),
        }
    }

    /// Check if the scan changed the record.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CheckedIn { .. } | Self::CheckedOut { .. })
    }
}

/// Storage engine for the roster.
///
/// Clones share the same connection.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("roster database lock poisoned"))
    }

    /// Replace the whole roster with `records` in one transaction.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the previous roster is then
    /// left untouched.
    pub fn replace_all(&self, records: &[UserRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute("DELETE FROM users", [])?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO users
                    (identifier, name, passport, nationality, extra, status, login_time, logout_time)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )?;
            for record in records {
                stmt.execute(params![
                    record.identifier,
                    record.name,
                    record.passport,
                    record.nationality,
                    serde_json::to_string(&record.extra)?,
                    record.status.to_string(),
                    record.login_time.map(|t| t.to_rfc3339()),
                    record.logout_time.map(|t| t.to_rfc3339()),
                ])?;
            }
        }
        tx.commit()?;

        info!(written = records.len(), replaced = removed, "Roster replaced");
        Ok(records.len())
    }

    /// Delete every roster record.
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear(&self) -> Result<usize> {
        let affected = self.lock()?.execute("DELETE FROM users", [])?;
        info!(deleted = affected, "Roster cleared");
        Ok(affected)
    }

    /// Get every record in upload order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn records(&self) -> Result<Vec<UserRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_USER_COLUMNS} ORDER BY seq ASC"))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Get a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let conn = self.lock()?;
        Self::fetch(&conn, identifier)
    }

    fn fetch(conn: &Connection, identifier: &str) -> Result<Option<UserRecord>> {
        let record = conn
            .query_row(
                &format!("{SELECT_USER_COLUMNS} WHERE identifier = ?1"),
                [identifier],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Set a record's status and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has the identifier, or
    /// an error if the database operation fails.
    pub fn set_status(
        &self,
        identifier: &str,
        status: Status,
        login_time: Option<DateTime<Utc>>,
        logout_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let affected = self.lock()?.execute(
            "UPDATE users SET status = ?1, login_time = ?2, logout_time = ?3 WHERE identifier = ?4",
            params![
                status.to_string(),
                login_time.map(|t| t.to_rfc3339()),
                logout_time.map(|t| t.to_rfc3339()),
                identifier,
            ],
        )?;

        if affected == 0 {
            return Err(Error::record_not_found(identifier));
        }
        debug!(%identifier, %status, "Status updated");
        Ok(())
    }

    /// Flip a record between IN and OUT.
    ///
    /// The read, the capacity check and the write happen in one immediate
    /// transaction under the connection lock. With `capacity` set, a
    /// check-in is refused once that many records are IN.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn toggle_status(&self, identifier: &str, capacity: Option<usize>) -> Result<ToggleOutcome> {
        let identifier = identifier.trim();
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(mut record) = Self::fetch(&tx, identifier)? else {
            warn!(%identifier, "Scan for unknown identifier");
            return Ok(ToggleOutcome::NotFound {
                identifier: identifier.to_string(),
            });
        };

        if !record.is_in() {
            if let Some(capacity) = capacity {
                let occupancy = Self::count_status(&tx, Status::In)?;
                if occupancy >= capacity {
                    warn!(%identifier, occupancy, capacity, "Check-in denied, room full");
                    return Ok(ToggleOutcome::Denied {
                        occupancy,
                        capacity,
                    });
                }
            }
        }

        let status = record.toggle(Utc::now());
        tx.execute(
            "UPDATE users SET status = ?1, login_time = ?2, logout_time = ?3 WHERE identifier = ?4",
            params![
                status.to_string(),
                record.login_time.map(|t| t.to_rfc3339()),
                record.logout_time.map(|t| t.to_rfc3339()),
                identifier,
            ],
        )?;
        tx.commit()?;

        info!(%identifier, %status, "Scan recorded");
        Ok(match status {
            Status::In => ToggleOutcome::CheckedIn { record },
            Status::Out => ToggleOutcome::CheckedOut { record },
        })
    }

    /// Count roster records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Count records currently IN.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn occupancy(&self) -> Result<usize> {
        let conn = self.lock()?;
        Self::count_status(&conn, Status::In)
    }

    fn count_status(conn: &Connection, status: Status) -> Result<usize> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE status = ?1",
            [status.to_string()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Convert a database row to a `UserRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<UserRecord> {
        let identifier: String = row.get(0)?;
        let extra_json: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let login_time: Option<String> = row.get(6)?;
        let logout_time: Option<String> = row.get(7)?;

        let extra: BTreeMap<String, String> =
            serde_json::from_str(&extra_json).unwrap_or_else(|e| {
                warn!(%identifier, error = %e, "Unreadable extra fields, ignoring");
                BTreeMap::new()
            });

        let status = match status_str.as_str() {
            "IN" => Status::In,
            "OUT" => Status::Out,
            _ => {
                warn!(%identifier, status = %status_str, "Unknown status, defaulting to OUT");
                Status::Out
            }
        };

        Ok(UserRecord {
            identifier,
            name: row.get(1)?,
            passport: row.get(2)?,
            nationality: row.get(3)?,
            extra,
            status,
            login_time: login_time.as_deref().and_then(parse_timestamp),
            logout_time: logout_time.as_deref().and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
