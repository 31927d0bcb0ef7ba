//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Admin credential accepted by admin-only commands.
#[derive(Debug, Clone, Args)]
pub struct AdminArgs {
    /// Admin email
    #[arg(long, env = "ROLLCALL_ADMIN_EMAIL")]
    pub email: String,

    /// Admin password
    #[arg(long, env = "ROLLCALL_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Roster management commands.
#[derive(Debug, Subcommand)]
pub enum RosterCommand {
    /// Replace the roster with the rows of a grid file
    ///
    /// The file is a JSON array of rows, each row an array of cells as
    /// exported from a spreadsheet.
    Import {
        /// Path to the grid file
        file: PathBuf,

        /// Admin credential
        #[command(flatten)]
        admin: AdminArgs,
    },

    /// List the stored roster
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Admin credential
        #[command(flatten)]
        admin: AdminArgs,
    },

    /// Delete every roster record
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,

        /// Admin credential
        #[command(flatten)]
        admin: AdminArgs,
    },
}

impl RosterCommand {
    /// The credential supplied with the command.
    #[must_use]
    pub fn admin(&self) -> &AdminArgs {
        match self {
            Self::Import { admin, .. } | Self::List { admin, .. } | Self::Clear { admin, .. } => {
                admin
            }
        }
    }
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Identifier carried by the QR code
    pub identifier: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Only show people whose name contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Refresh on the configured poll interval until interrupted
    #[arg(short, long)]
    pub watch: bool,

    /// Admin credential
    #[command(flatten)]
    pub admin: AdminArgs,
}

/// Walk-up kiosk arguments.
#[derive(Debug, Args)]
pub struct KioskCommand {
    /// Override the configured room capacity
    #[arg(long)]
    pub capacity: Option<usize>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the hash to store as admin.password_hash
    HashPassword {
        /// The password to hash
        password: String,
    },
}
