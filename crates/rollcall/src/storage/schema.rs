//! `SQLite` schema definitions for rollcall.
//!
//! Statements are grouped by the schema version that introduced them; the
//! migration runner applies each group once, in order.

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the users table.
///
/// `seq` preserves upload order; `identifier` is the roster key.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    passport TEXT NOT NULL DEFAULT '',
    nationality TEXT NOT NULL DEFAULT '',
    extra TEXT NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'OUT',
    login_time TEXT,
    logout_time TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on status for occupancy counts.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_users_status ON users(status)
";

/// Version 1: roster table and status index.
pub const V1_STATEMENTS: &[&str] = &[CREATE_USERS_TABLE, CREATE_STATUS_INDEX];
