//! In-memory presence tracking for the walk-up kiosk.
//!
//! [`PresenceStore`] keeps the set of identities currently inside, bounded
//! by a fixed capacity, together with an append-only access log. Every scan
//! toggles one identity between inside and outside.
//!
//! Subscribers are notified synchronously, in registration order, after the
//! state and log have been updated and before `scan` returns. A listener
//! therefore blocks the scan for as long as it runs; use
//! [`PresenceStore::subscribe_channel`] for a consumer that may lag, whose
//! updates are dropped rather than waited on.
//!
//! # Example
//!
//! ```
//! use rollcall::access::AccessAction;
//! use rollcall::presence::PresenceStore;
//!
//! let mut store = PresenceStore::new(2);
//! assert_eq!(store.scan("Alice").action, AccessAction::In);
//! assert_eq!(store.scan("Bob").action, AccessAction::In);
//! assert_eq!(store.scan("Carol").action, AccessAction::Denied);
//! assert_eq!(store.scan("Alice").action, AccessAction::Out);
//! assert_eq!(store.count(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::access::{AccessAction, AccessEvent};

/// Default room capacity.
pub const DEFAULT_CAPACITY: usize = 50;

/// Result of a single scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    /// What the scan did.
    pub action: AccessAction,
    /// Whether the identity was let in or out.
    pub success: bool,
    /// Message to show at the kiosk.
    pub message: String,
}

impl ScanOutcome {
    fn new(action: AccessAction, success: bool, message: impl Into<String>) -> Self {
        Self {
            action,
            success,
            message: message.into(),
        }
    }
}

/// Someone currently inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupant {
    /// Identity as scanned (trimmed).
    pub name: String,
    /// When they checked in.
    pub entry_time: DateTime<Utc>,
}

/// Notification delivered to subscribers after each recorded scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceUpdate {
    /// The log entry that was just appended.
    pub event: AccessEvent,
    /// Occupancy after the scan.
    pub occupancy: usize,
}

/// Handle returned by [`PresenceStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&PresenceUpdate) + Send>;

#[derive(Debug, Clone)]
struct LogEntry {
    seq: u64,
    event: AccessEvent,
}

/// Capacity-bounded check-in/out tracker.
pub struct PresenceStore {
    capacity: usize,
    inside: HashMap<String, DateTime<Utc>>,
    log: Vec<LogEntry>,
    next_seq: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for PresenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceStore")
            .field("capacity", &self.capacity)
            .field("occupancy", &self.inside.len())
            .field("log_len", &self.log.len())
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PresenceStore {
    /// Create an empty store with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inside: HashMap::new(),
            log: Vec::new(),
            next_seq: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Toggle an identity in or out.
    ///
    /// Blank identities are refused without touching state, the log, or
    /// subscribers.
    pub fn scan(&mut self, identity: &str) -> ScanOutcome {
        let name = identity.trim();
        if name.is_empty() {
            debug!("Ignoring blank scan");
            return ScanOutcome::new(AccessAction::Denied, false, "Invalid name");
        }

        let now = Utc::now();
        let outcome = if self.inside.remove(name).is_some() {
            self.append(name, AccessAction::Out, now);
            ScanOutcome::new(
                AccessAction::Out,
                true,
                format!("Goodbye, {name}. Checked out."),
            )
        } else if self.inside.len() >= self.capacity {
            warn!(identity = %name, capacity = self.capacity, "Check-in denied, room full");
            self.append(name, AccessAction::Denied, now);
            ScanOutcome::new(AccessAction::Denied, false, "Room is at full capacity.")
        } else {
            self.inside.insert(name.to_string(), now);
            self.append(name, AccessAction::In, now);
            ScanOutcome::new(
                AccessAction::In,
                true,
                format!("Welcome, {name}. Checked in."),
            )
        };

        info!(
            identity = %name,
            action = %outcome.action,
            occupancy = self.inside.len(),
            "Scan recorded"
        );
        self.notify();
        outcome
    }

    fn append(&mut self, name: &str, action: AccessAction, at: DateTime<Utc>) {
        self.log.push(LogEntry {
            seq: self.next_seq,
            event: AccessEvent::new(name, action, at),
        });
        self.next_seq += 1;
    }

    fn notify(&self) {
        let Some(last) = self.log.last() else {
            return;
        };
        let update = PresenceUpdate {
            event: last.event.clone(),
            occupancy: self.inside.len(),
        };
        for (_, listener) in &self.listeners {
            listener(&update);
        }
    }

    /// Register a listener called after every recorded scan.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&PresenceUpdate) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Register a channel subscriber with room for `buffer` pending updates.
    ///
    /// Delivery is fire-and-forget: updates that do not fit, or that arrive
    /// after the receiver is dropped, are discarded.
    pub fn subscribe_channel(
        &mut self,
        buffer: usize,
    ) -> (SubscriptionId, mpsc::Receiver<PresenceUpdate>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let id = self.subscribe(move |update| {
            if let Err(e) = tx.try_send(update.clone()) {
                debug!(error = %e, "Dropped presence update");
            }
        });
        (id, rx)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Everyone currently inside, earliest entry first.
    #[must_use]
    pub fn occupants(&self) -> Vec<Occupant> {
        let mut occupants: Vec<Occupant> = self
            .inside
            .iter()
            .map(|(name, entry_time)| Occupant {
                name: name.clone(),
                entry_time: *entry_time,
            })
            .collect();
        occupants.sort_by(|a, b| {
            a.entry_time
                .cmp(&b.entry_time)
                .then_with(|| a.name.cmp(&b.name))
        });
        occupants
    }

    /// The access log, newest first.
    #[must_use]
    pub fn log(&self) -> Vec<AccessEvent> {
        let mut entries: Vec<&LogEntry> = self.log.iter().collect();
        entries.sort_by(|a, b| {
            b.event
                .timestamp
                .cmp(&a.event.timestamp)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.event.clone()).collect()
    }

    /// Number of identities inside.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inside.len()
    }

    /// Maximum simultaneous occupancy.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the room is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inside.len() >= self.capacity
    }

    /// Check if an identity is inside.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.inside.contains_key(identity.trim())
    }

    /// Number of refused check-ins so far.
    #[must_use]
    pub fn denied_count(&self) -> usize {
        self.log
            .iter()
            .filter(|e| e.event.action == AccessAction::Denied)
            .count()
    }
}
