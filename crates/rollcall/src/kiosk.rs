//! The kiosk context.
//!
//! [`Kiosk`] owns everything a running kiosk needs: the configuration, the
//! roster store and the in-memory presence store. It is opened once at
//! startup, passed explicitly to whatever handles a command, and shut down
//! at exit.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::auth;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::presence::{PresenceStore, ScanOutcome};
use crate::roster::{Cell, RosterImporter, UserRecord};
use crate::storage::{RosterStore, Storage, ToggleOutcome};

/// Read a roster grid from a JSON file holding an array of rows.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an array of arrays.
pub fn read_grid(path: impl AsRef<Path>) -> Result<Vec<Vec<Cell>>> {
    let path = path.as_ref();
    debug!("Reading roster grid from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let grid: Vec<Vec<Cell>> = serde_json::from_str(&contents)?;
    Ok(grid)
}

/// Running kiosk state.
pub struct Kiosk {
    config: Config,
    store: Arc<dyn RosterStore>,
    importer: RosterImporter,
    presence: PresenceStore,
}

impl std::fmt::Debug for Kiosk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kiosk")
            .field("config", &self.config)
            .field("importer", &self.importer)
            .field("presence", &self.presence)
            .finish_non_exhaustive()
    }
}

impl Kiosk {
    /// Open the kiosk against the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        Ok(Self::with_store(config, Arc::new(storage)))
    }

    /// Build a kiosk around an existing roster store.
    #[must_use]
    pub fn with_store(config: Config, store: Arc<dyn RosterStore>) -> Self {
        let importer = RosterImporter::with_config(config.import_config());
        let presence = PresenceStore::new(config.presence.capacity);
        info!(capacity = config.presence.capacity, "Kiosk opened");
        Self {
            config,
            store,
            importer,
            presence,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The walk-up presence store.
    #[must_use]
    pub fn presence(&self) -> &PresenceStore {
        &self.presence
    }

    /// Mutable access to the walk-up presence store, e.g. to subscribe.
    pub fn presence_mut(&mut self) -> &mut PresenceStore {
        &mut self.presence
    }

    /// Check an admin credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`](crate::Error::Unauthorized) if the credential is rejected.
    pub fn authorize(&self, email: &str, password: &str) -> Result<()> {
        auth::authorize(&self.config.admin, email, password)
    }

    /// Validate a grid and replace the roster with it.
    ///
    /// Nothing is written when validation fails. Returns the roster as
    /// stored after the write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Import`](crate::Error::Import) for a rejected grid, or a storage error.
    pub async fn import_roster(&self, grid: &[Vec<Cell>]) -> Result<Vec<UserRecord>> {
        let records = self.importer.import(grid)?;
        let written = self.store.write_all(&records).await?;
        info!(written, "Roster imported");
        self.store.read_all().await
    }

    /// Read a grid file and import it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the import fails.
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<Vec<UserRecord>> {
        let grid = read_grid(path)?;
        self.import_roster(&grid).await
    }

    /// Delete the whole roster. Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn clear_roster(&self) -> Result<usize> {
        self.store.delete_all().await
    }

    /// Snapshot of the stored roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn roster(&self) -> Result<Vec<UserRecord>> {
        self.store.read_all().await
    }

    /// Toggle a roster member by identifier, as a QR scan does.
    ///
    /// A blank, unknown or refused identifier is an outcome, not an error;
    /// blank input never reaches storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn scan_identifier(&self, identifier: &str) -> Result<ToggleOutcome> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            debug!("Ignoring blank scan");
            return Ok(ToggleOutcome::NotFound {
                identifier: String::new(),
            });
        }
        self.store
            .toggle(identifier, self.config.scan_capacity())
            .await
    }

    /// Build the admin dashboard, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn dashboard(&self, search: Option<&str>) -> Result<Dashboard> {
        let records = self.store.read_all().await?;
        let dashboard = Dashboard::from_records(&records);
        Ok(match search {
            Some(query) => dashboard.filtered(query),
            None => dashboard,
        })
    }

    /// Record a walk-up scan by name in the presence store.
    pub fn walk_up(&mut self, name: &str) -> ScanOutcome {
        self.presence.scan(name)
    }

    /// Close the kiosk.
    pub fn shutdown(self) {
        info!(
            inside = self.presence.count(),
            denied = self.presence.denied_count(),
            "Kiosk shut down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessAction;
    use crate::error::{Error, ImportError};
    use crate::roster::Status;
    use serde_json::json;

    fn kiosk() -> Kiosk {
        kiosk_with(Config::default())
    }

    fn kiosk_with(config: Config) -> Kiosk {
        let storage = Storage::open_in_memory().unwrap();
        Kiosk::with_store(config, Arc::new(storage))
    }

    fn grid(ids: &[&str]) -> Vec<Vec<Cell>> {
        let mut rows = vec![vec![json!("Iqama"), json!("Name")]];
        rows.extend(
            ids.iter()
                .map(|id| vec![json!(id), json!(format!("User {id}"))]),
        );
        rows
    }

    fn ids(records: &[UserRecord]) -> Vec<String> {
        records.iter().map(|r| r.identifier.clone()).collect()
    }

    #[tokio::test]
    async fn test_import_then_read() {
        let kiosk = kiosk();
        let records = kiosk.import_roster(&grid(&["A1", "B2"])).await.unwrap();

        assert_eq!(ids(&records), ["A1", "B2"]);
        assert!(records.iter().all(|r| r.status == Status::Out));
    }

    #[tokio::test]
    async fn test_rejected_import_writes_nothing() {
        let kiosk = kiosk();
        kiosk.import_roster(&grid(&["A1"])).await.unwrap();

        let err = kiosk
            .import_roster(&grid(&["B2", "B2"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Import(ImportError::DuplicateIdentifier(_))
        ));
        assert_eq!(ids(&kiosk.roster().await.unwrap()), ["A1"]);
    }

    #[tokio::test]
    async fn test_clear_then_import_yields_only_new_identities() {
        let kiosk = kiosk();
        kiosk.import_roster(&grid(&["A1", "B2"])).await.unwrap();
        kiosk.scan_identifier("A1").await.unwrap();

        assert_eq!(kiosk.clear_roster().await.unwrap(), 2);
        let records = kiosk.import_roster(&grid(&["C3"])).await.unwrap();

        assert_eq!(ids(&records), ["C3"]);
        assert_eq!(kiosk.dashboard(None).await.unwrap().stats.occupancy, 0);
    }

    #[tokio::test]
    async fn test_scan_identifier_toggles() {
        let kiosk = kiosk();
        kiosk.import_roster(&grid(&["A1"])).await.unwrap();

        let first = kiosk.scan_identifier(" A1 ").await.unwrap();
        assert!(matches!(first, ToggleOutcome::CheckedIn { .. }));

        let second = kiosk.scan_identifier("A1").await.unwrap();
        assert!(matches!(second, ToggleOutcome::CheckedOut { .. }));

        let missing = kiosk.scan_identifier("Z9").await.unwrap();
        assert!(matches!(missing, ToggleOutcome::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_scan_blank_identifier() {
        let kiosk = kiosk();
        kiosk.import_roster(&grid(&["A1"])).await.unwrap();

        let outcome = kiosk.scan_identifier("   ").await.unwrap();
        assert_eq!(
            outcome,
            ToggleOutcome::NotFound {
                identifier: String::new()
            }
        );
        assert_eq!(outcome.message(), "User not found.");
        assert_eq!(kiosk.dashboard(None).await.unwrap().stats.occupancy, 0);
    }

    #[tokio::test]
    async fn test_scan_capacity_from_config() {
        let mut config = Config::default();
        config.presence.capacity = 1;
        let kiosk = kiosk_with(config);
        kiosk.import_roster(&grid(&["A1", "B2"])).await.unwrap();

        assert!(kiosk.scan_identifier("A1").await.unwrap().is_success());
        assert_eq!(
            kiosk.scan_identifier("B2").await.unwrap(),
            ToggleOutcome::Denied {
                occupancy: 1,
                capacity: 1
            }
        );
    }

    #[tokio::test]
    async fn test_scan_capacity_not_enforced() {
        let mut config = Config::default();
        config.presence.capacity = 1;
        config.presence.enforce_capacity_on_scan = false;
        let kiosk = kiosk_with(config);
        kiosk.import_roster(&grid(&["A1", "B2"])).await.unwrap();

        assert!(kiosk.scan_identifier("A1").await.unwrap().is_success());
        assert!(kiosk.scan_identifier("B2").await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_dashboard_search() {
        let kiosk = kiosk();
        kiosk.import_roster(&grid(&["A1", "B2"])).await.unwrap();
        kiosk.scan_identifier("A1").await.unwrap();
        kiosk.scan_identifier("B2").await.unwrap();

        let all = kiosk.dashboard(None).await.unwrap();
        assert_eq!(all.stats.occupancy, 2);

        let filtered = kiosk.dashboard(Some("user a1")).await.unwrap();
        assert_eq!(filtered.occupants.len(), 1);
        assert_eq!(filtered.occupants[0].identifier, "A1");
    }

    #[test]
    fn test_walk_up_uses_configured_capacity() {
        let mut config = Config::default();
        config.presence.capacity = 1;
        let mut kiosk = kiosk_with(config);

        assert_eq!(kiosk.walk_up("Alice").action, AccessAction::In);
        assert_eq!(kiosk.walk_up("Bob").action, AccessAction::Denied);
        assert_eq!(kiosk.presence().denied_count(), 1);
        kiosk.shutdown();
    }

    #[test]
    fn test_authorize_uses_admin_config() {
        let mut config = Config::default();
        config.admin.password_hash = Some(auth::hash_password("pw"));
        let kiosk = kiosk_with(config);

        assert!(kiosk.authorize("admin@employee.com", "pw").is_ok());
        assert!(kiosk.authorize("admin@employee.com", "nope").is_err());
    }

    #[tokio::test]
    async fn test_import_file() {
        let path = std::env::temp_dir().join(format!("rollcall_grid_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[["Employee Roster"], ["Iqama No", "Full Name", "Nationality"], [2345678901, "Ahmed", "Egypt"]]"#,
        )
        .unwrap();

        let kiosk = kiosk();
        let records = kiosk.import_file(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "2345678901");
        assert_eq!(records[0].nationality, "Egypt");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_read_grid_rejects_non_grid() {
        let path = std::env::temp_dir().join(format!("rollcall_bad_grid_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"rows": []}"#).unwrap();

        assert!(matches!(read_grid(&path), Err(Error::Json(_))));

        let _ = std::fs::remove_file(&path);
    }
}
