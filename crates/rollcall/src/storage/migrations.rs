//! Schema versioning for the roster database.
//!
//! The version lives in the `metadata` table. Each step runs inside its own
//! transaction together with the version bump, so an interrupted upgrade
//! leaves the database at the last completed version.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, V1_STATEMENTS};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Bring the database schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if the stored version is unreadable, newer than this
/// build understands, or a migration step fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for target in (version + 1)..=CURRENT_VERSION {
        let tx = conn.unchecked_transaction()?;
        for statement in steps_for(target)? {
            tx.execute(statement, [])?;
        }
        set_schema_version(&tx, target)?;
        tx.commit()?;
        info!(version = target, "Applied schema migration");
    }

    debug!(version = CURRENT_VERSION, "Schema up to date");
    Ok(())
}

/// Statements introduced by a schema version.
fn steps_for(version: i32) -> Result<&'static [&'static str]> {
    match version {
        1 => Ok(V1_STATEMENTS),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Read the schema version; 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
