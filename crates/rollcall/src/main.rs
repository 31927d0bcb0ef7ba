//! `rollcall` - CLI for the check-in/out kiosk
//!
//! This binary provides the command-line interface for importing the roster,
//! scanning people in and out, and watching occupancy.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use rollcall::auth::hash_password;
use rollcall::cli::{
    AdminArgs, Cli, Command, ConfigCommand, DashboardCommand, KioskCommand, RosterCommand,
    ScanCommand,
};
use rollcall::dashboard::Dashboard;
use rollcall::{init_logging, Config, Kiosk};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<rollcall::Error>() {
                Some(e) => eprintln!("{}", e.notice()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Config commands load the file themselves so a broken file can be inspected.
        Command::Config(cmd) => handle_config(cli.config, cmd),
        Command::Roster(cmd) => handle_roster(Config::load_from(cli.config)?, cmd).await,
        Command::Scan(cmd) => handle_scan(Config::load_from(cli.config)?, cmd).await,
        Command::Dashboard(cmd) => handle_dashboard(Config::load_from(cli.config)?, cmd).await,
        Command::Kiosk(cmd) => handle_kiosk(Config::load_from(cli.config)?, cmd).await,
    }
}

fn open_as_admin(config: Config, admin: &AdminArgs) -> anyhow::Result<Kiosk> {
    let kiosk = Kiosk::open(config)?;
    kiosk.authorize(&admin.email, &admin.password)?;
    Ok(kiosk)
}

async fn handle_roster(config: Config, cmd: RosterCommand) -> anyhow::Result<()> {
    let kiosk = open_as_admin(config, cmd.admin())?;

    match cmd {
        RosterCommand::Import { file, .. } => {
            let records = kiosk.import_file(&file).await?;
            println!(
                "Imported {} users from {}.",
                records.len(),
                file.display()
            );
        }
        RosterCommand::List { json, .. } => {
            let records = kiosk.roster().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("The roster is empty.");
            } else {
                println!(
                    "{:<16} {:<28} {:<14} {:<16} {}",
                    "IDENTIFIER", "NAME", "PASSPORT", "NATIONALITY", "STATUS"
                );
                for r in &records {
                    println!(
                        "{:<16} {:<28} {:<14} {:<16} {}",
                        r.identifier, r.name, r.passport, r.nationality, r.status
                    );
                }
            }
        }
        RosterCommand::Clear { yes, .. } => {
            if !yes {
                bail!("This deletes every roster record. Use --yes to confirm.");
            }
            let deleted = kiosk.clear_roster().await?;
            println!("Deleted {deleted} users.");
        }
    }

    kiosk.shutdown();
    Ok(())
}

async fn handle_scan(config: Config, cmd: ScanCommand) -> anyhow::Result<()> {
    let kiosk = Kiosk::open(config)?;
    let outcome = kiosk.scan_identifier(&cmd.identifier).await?;

    if cmd.json {
        let out = serde_json::json!({
            "success": outcome.is_success(),
            "message": outcome.message(),
            "result": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", outcome.message());
    }

    kiosk.shutdown();
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(dashboard)?);
    } else {
        print!("{}", dashboard.render());
    }
    Ok(())
}

async fn handle_dashboard(config: Config, cmd: DashboardCommand) -> anyhow::Result<()> {
    let interval = config.poll_interval();
    let kiosk = open_as_admin(config, &cmd.admin)?;
    let search = cmd.search.as_deref();

    if !cmd.watch {
        print_dashboard(&kiosk.dashboard(search).await?, cmd.json)?;
        kiosk.shutdown();
        return Ok(());
    }

    info!(interval_ms = interval.as_millis(), "Watching dashboard");
    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let dashboard = kiosk.dashboard(search).await?;
                if !cmd.json {
                    // Clear the terminal between refreshes.
                    print!("\x1B[2J\x1B[H");
                }
                print_dashboard(&dashboard, cmd.json)?;
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted, leaving watch mode");
                break;
            }
        }
    }

    kiosk.shutdown();
    Ok(())
}

async fn handle_kiosk(mut config: Config, cmd: KioskCommand) -> anyhow::Result<()> {
    if let Some(capacity) = cmd.capacity {
        config.presence.capacity = capacity;
        config.validate()?;
    }

    let mut kiosk = Kiosk::open(config)?;
    kiosk.presence_mut().subscribe(|update| {
        debug!(
            identity = %update.event.identity,
            action = %update.event.action,
            occupancy = update.occupancy,
            "Presence changed"
        );
    });

    let capacity = kiosk.presence().capacity();
    let (_, mut updates) = kiosk.presence_mut().subscribe_channel(64);
    let display = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            println!(
                "  [{}] {} {}  ({}/{} inside)",
                update.event.timestamp.format("%H:%M:%S"),
                update.event.action,
                update.event.identity,
                update.occupancy,
                capacity
            );
        }
    });

    println!("Kiosk ready ({capacity} places). Enter a name per line, Ctrl-D to stop.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                let outcome = kiosk.walk_up(&line);
                println!("{}", outcome.message);
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted, closing kiosk");
                break;
            }
        }
    }

    let occupants = kiosk.presence().occupants();
    kiosk.shutdown();
    // The channel closes once the kiosk is dropped.
    let _ = display.await;

    if !occupants.is_empty() {
        println!("Still inside:");
        for occupant in occupants {
            println!(
                "  {} (since {})",
                occupant.name,
                occupant.entry_time.format("%H:%M:%S")
            );
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Presence]");
                println!("  Capacity:           {}", config.presence.capacity);
                println!(
                    "  Enforce on scan:    {}",
                    config.presence.enforce_capacity_on_scan
                );
                println!();
                println!("[Import]");
                println!("  Header scan rows:   {}", config.import.header_scan_rows);
                println!();
                println!("[Dashboard]");
                println!("  Poll interval (ms): {}", config.dashboard.poll_interval_ms);
                println!();
                println!("[Admin]");
                println!("  Email:              {}", config.admin.email);
                println!(
                    "  Password set:       {}",
                    config.admin.password_hash.is_some()
                );
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path))?;
            println!("Configuration is valid.");
        }
        ConfigCommand::HashPassword { password } => {
            println!("{}", hash_password(&password));
        }
    }
    Ok(())
}
