//! Async persistence seam for the roster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Storage, ToggleOutcome};
use crate::error::{Error, Result};
use crate::roster::{Status, UserRecord};

/// Persistence collaborator used by the kiosk.
///
/// The `SQLite` implementation runs each call on tokio's blocking pool.
///
/// Implementations must make `write_all` and `toggle` atomic: a concurrent
/// `read_all` sees either the old roster or the new one, and two toggles of
/// the same identifier never both observe the same starting status.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Replace the roster with `records`. Returns the number written.
    async fn write_all(&self, records: &[UserRecord]) -> Result<usize>;

    /// Delete the whole roster. Returns the number deleted.
    async fn delete_all(&self) -> Result<usize>;

    /// Snapshot of every record in upload order.
    async fn read_all(&self) -> Result<Vec<UserRecord>>;

    /// Overwrite one record's status and timestamps.
    async fn update_status(
        &self,
        identifier: &str,
        status: Status,
        login_time: Option<DateTime<Utc>>,
        logout_time: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Atomically flip one record between IN and OUT.
    async fn toggle(&self, identifier: &str, capacity: Option<usize>) -> Result<ToggleOutcome>;
}

impl Storage {
    /// Run a storage call on the blocking pool so `SQLite` I/O and the
    /// connection lock never stall the async workers.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl RosterStore for Storage {
    async fn write_all(&self, records: &[UserRecord]) -> Result<usize> {
        let records = records.to_vec();
        self.blocking(move |s| s.replace_all(&records)).await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.blocking(Storage::clear).await
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        self.blocking(Storage::records).await
    }

    async fn update_status(
        &self,
        identifier: &str,
        status: Status,
        login_time: Option<DateTime<Utc>>,
        logout_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let identifier = identifier.to_string();
        self.blocking(move |s| s.set_status(&identifier, status, login_time, logout_time))
            .await
    }

    async fn toggle(&self, identifier: &str, capacity: Option<usize>) -> Result<ToggleOutcome> {
        let identifier = identifier.to_string();
        self.blocking(move |s| s.toggle_status(&identifier, capacity))
            .await
    }
}
