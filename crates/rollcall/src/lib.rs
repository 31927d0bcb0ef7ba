//! `rollcall` - Employee check-in/out kiosk
//!
//! This library provides roster import with header inference, a
//! capacity-bounded presence tracker, `SQLite` roster persistence and the
//! admin dashboard behind the `rollcall` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod access;
pub mod auth;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod kiosk;
pub mod logging;
pub mod presence;
pub mod roster;
pub mod storage;

pub use access::{AccessAction, AccessEvent};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{Error, ImportError, Notice, Result};
pub use kiosk::Kiosk;
pub use logging::init_logging;
pub use presence::{PresenceStore, ScanOutcome};
pub use roster::{RosterImporter, UserRecord};
pub use storage::{RosterStore, Storage, ToggleOutcome};
