//! Roster records and spreadsheet ingestion.
//!
//! A roster is the full set of users uploaded by the admin. Each
//! [`UserRecord`] is keyed by its identifier (the value a badge QR code
//! carries) and toggles between [`Status::In`] and [`Status::Out`].
//!
//! # Example
//!
//! ```
//! use rollcall::roster::{RosterImporter, Status};
//! use serde_json::json;
//!
//! let grid = vec![
//!     vec![json!("Iqama"), json!("Name")],
//!     vec![json!(2_345_678_901_u64), json!("Alice")],
//! ];
//!
//! let records = RosterImporter::new().import(&grid).unwrap();
//! assert_eq!(records[0].identifier, "2345678901");
//! assert_eq!(records[0].status, Status::Out);
//! ```

mod importer;
mod keywords;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{AccessAction, AccessEvent};

pub use importer::{Cell, ImportConfig, RosterImporter};
pub use keywords::{field_keywords, FieldKeywords};

/// Presence status of a roster record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Currently inside.
    In,
    /// Currently outside.
    #[default]
    Out,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
        }
    }
}

/// A column the importer knows how to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterField {
    /// Unique key (national ID / Iqama number).
    Identifier,
    /// Display name.
    Name,
    /// Passport number.
    Passport,
    /// Nationality.
    Nationality,
}

impl RosterField {
    /// All fields, in resolution order.
    pub const ALL: [Self; 4] = [Self::Identifier, Self::Name, Self::Passport, Self::Nationality];

    /// Title-case label used in user-facing messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Name => "Name",
            Self::Passport => "Passport",
            Self::Nationality => "Nationality",
        }
    }

    /// Whether an import fails when this column is absent.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, Self::Identifier | Self::Name)
    }
}

impl std::fmt::Display for RosterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Name => write!(f, "name"),
            Self::Passport => write!(f, "passport"),
            Self::Nationality => write!(f, "nationality"),
        }
    }
}

/// A single user on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique key.
    pub identifier: String,

    /// Display name.
    pub name: String,

    /// Passport number, empty when not provided.
    #[serde(default)]
    pub passport: String,

    /// Nationality, empty when not provided.
    #[serde(default)]
    pub nationality: String,

    /// Columns the importer did not map, keyed by header text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,

    /// Current presence status.
    #[serde(default)]
    pub status: Status,

    /// When the user last checked in.
    #[serde(default)]
    pub login_time: Option<DateTime<Utc>>,

    /// When the user last checked out.
    #[serde(default)]
    pub logout_time: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Create a record that is outside with no timestamps.
    #[must_use]
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            passport: String::new(),
            nationality: String::new(),
            extra: BTreeMap::new(),
            status: Status::Out,
            login_time: None,
            logout_time: None,
        }
    }

    /// Check if the user is currently inside.
    #[must_use]
    pub fn is_in(&self) -> bool {
        self.status == Status::In
    }

    /// Mark the user as inside since `at`. Clears the logout time.
    pub fn check_in(&mut self, at: DateTime<Utc>) {
        self.status = Status::In;
        self.login_time = Some(at);
        self.logout_time = None;
    }

    /// Mark the user as outside since `at`. Keeps the login time.
    pub fn check_out(&mut self, at: DateTime<Utc>) {
        self.status = Status::Out;
        self.logout_time = Some(at);
    }

    /// Flip the status, stamping the transition with `at`.
    ///
    /// Returns the new status.
    pub fn toggle(&mut self, at: DateTime<Utc>) -> Status {
        if self.is_in() {
            self.check_out(at);
        } else {
            self.check_in(at);
        }
        self.status
    }

    /// Access events implied by this record's timestamps.
    #[must_use]
    pub fn access_events(&self) -> Vec<AccessEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(at) = self.login_time {
            events.push(AccessEvent::new(&self.name, AccessAction::In, at));
        }
        if let Some(at) = self.logout_time {
            events.push(AccessEvent::new(&self.name, AccessAction::Out, at));
        }
        events
    }
}
