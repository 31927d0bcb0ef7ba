//! Admin dashboard view over a roster snapshot.
//!
//! The dashboard never talks to storage itself. It is built from whatever
//! `read_all` returned, which keeps it a pure function of the snapshot and
//! makes polling a matter of rebuilding it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access::{sort_newest_first, AccessAction, AccessEvent};
use crate::roster::UserRecord;

/// Someone currently inside, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardOccupant {
    /// Roster identifier.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// When they checked in.
    pub since: Option<DateTime<Utc>>,
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Records on the roster.
    pub roster_size: usize,
    /// Records currently IN.
    pub occupancy: usize,
    /// Check-in events in the log.
    pub total_entries: usize,
}

/// Occupancy, access log and statistics derived from one roster snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Headline numbers, computed before any search filter.
    pub stats: DashboardStats,
    /// People inside, earliest arrival first.
    pub occupants: Vec<DashboardOccupant>,
    /// Access events, newest first.
    pub events: Vec<AccessEvent>,
}

impl Dashboard {
    /// Build the dashboard from a roster snapshot.
    #[must_use]
    pub fn from_records(records: &[UserRecord]) -> Self {
        let mut occupants: Vec<DashboardOccupant> = records
            .iter()
            .filter(|r| r.is_in())
            .map(|r| DashboardOccupant {
                identifier: r.identifier.clone(),
                name: r.name.clone(),
                since: r.login_time,
            })
            .collect();
        occupants.sort_by_key(|o| o.since);

        let mut events: Vec<AccessEvent> =
            records.iter().flat_map(UserRecord::access_events).collect();
        sort_newest_first(&mut events);

        let stats = DashboardStats {
            roster_size: records.len(),
            occupancy: occupants.len(),
            total_entries: events
                .iter()
                .filter(|e| e.action == AccessAction::In)
                .count(),
        };

        Self {
            stats,
            occupants,
            events,
        }
    }

    /// Keep only occupants and events whose name contains `query`,
    /// ignoring case. A blank query keeps everything.
    #[must_use]
    pub fn filtered(mut self, query: &str) -> Self {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self;
        }

        self.occupants
            .retain(|o| o.name.to_lowercase().contains(&query));
        self.events
            .retain(|e| e.identity.to_lowercase().contains(&query));
        self
    }

    /// Render the dashboard as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "rollcall dashboard");
        let _ = writeln!(out, "------------------");
        let _ = writeln!(out, "Roster:     {}", self.stats.roster_size);
        let _ = writeln!(out, "Inside:     {}", self.stats.occupancy);
        let _ = writeln!(out, "Entries:    {}", self.stats.total_entries);

        let _ = writeln!(out);
        let _ = writeln!(out, "Currently inside ({}):", self.occupants.len());
        if self.occupants.is_empty() {
            let _ = writeln!(out, "  (nobody)");
        }
        for occupant in &self.occupants {
            let since = occupant
                .since
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
            let _ = writeln!(
                out,
                "  {:<24} {:<16} since {since}",
                occupant.name, occupant.identifier
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Access log ({}):", self.events.len());
        if self.events.is_empty() {
            let _ = writeln!(out, "  (no activity)");
        }
        for event in &self.events {
            let _ = writeln!(
                out,
                "  {}  {:<7} {}",
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.action.to_string(),
                event.identity
            );
        }
        out
    }
}
