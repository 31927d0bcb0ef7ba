//! Command-line interface for rollcall.
//!
//! This module provides the CLI structure for the `rollcall` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    AdminArgs, ConfigCommand, DashboardCommand, KioskCommand, RosterCommand, ScanCommand,
};

/// rollcall - Employee check-in/out kiosk
///
/// Import a roster from a spreadsheet export, toggle people in and out by
/// the identifier on their QR code, and watch who is inside.
#[derive(Debug, Parser)]
#[command(name = "rollcall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the roster (admin)
    #[command(subcommand)]
    Roster(RosterCommand),

    /// Check a roster member in or out by identifier
    Scan(ScanCommand),

    /// Show occupancy and the access log (admin)
    Dashboard(DashboardCommand),

    /// Run the walk-up kiosk, reading one name per line from stdin
    Kiosk(KioskCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
