//! Access events shown in the admin log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened on a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessAction {
    /// The identity checked in.
    In,
    /// The identity checked out.
    Out,
    /// The check-in was refused.
    Denied,
}

impl std::fmt::Display for AccessAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Denied => write!(f, "DENIED"),
        }
    }
}

/// A single entry of the access log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Who scanned (display name).
    pub identity: String,
    /// What the scan did.
    pub action: AccessAction,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

impl AccessEvent {
    /// Create an event for the given identity.
    #[must_use]
    pub fn new(identity: impl Into<String>, action: AccessAction, timestamp: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            action,
            timestamp,
        }
    }
}

/// Sort events newest first.
pub fn sort_newest_first(events: &mut [AccessEvent]) {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_action_display() {
        assert_eq!(AccessAction::In.to_string(), "IN");
        assert_eq!(AccessAction::Out.to_string(), "OUT");
        assert_eq!(AccessAction::Denied.to_string(), "DENIED");
    }

    #[test]
    fn test_action_serializes_uppercase() {
        let json = serde_json::to_string(&AccessAction::Denied).unwrap();
        assert_eq!(json, "\"DENIED\"");
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let mut events = vec![
            AccessEvent::new("a", AccessAction::In, now - Duration::minutes(5)),
            AccessEvent::new("b", AccessAction::Out, now),
            AccessEvent::new("c", AccessAction::In, now - Duration::minutes(1)),
        ];
        sort_newest_first(&mut events);
        let order: Vec<_> = events.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }
}
