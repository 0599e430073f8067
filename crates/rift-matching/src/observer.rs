//! Match observers: the logging seam of the matching engine.
//!
//! Engine code never logs through a global; every comparison reports typed
//! [`MatchEvent`]s to the observer carried by its
//! [`MatchContext`](crate::context::MatchContext). [`TracingObserver`] forwards
//! them to `tracing`, [`RecordingObserver`] keeps them for inspection.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::context::KeyMatchStyle;

/// Something notable that happened while evaluating a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// A regex pattern failed to compile; the clause never matches.
    InvalidRegex { pattern: String, error: String },
    /// A schema pattern failed to parse or compile; the clause never matches.
    InvalidSchema { schema: String, error: String },
    /// No matched entry satisfied a required matcher entry.
    EntryNotMatched { key: String, value: String },
    /// A negated matcher key was present, un-negated, on the matched side.
    NegatedKeyPresent { key: String },
    /// Fewer matched entries were used than there are required matcher entries.
    InsufficientMatches { used: usize, required: usize },
    /// Matching by key found no values for a required key.
    KeyMissing { key: String },
    /// Matching by key found a value no matcher value accounts for.
    ValueNotAccounted { key: String, value: String },
    /// A whole containment check passed.
    ContainmentMatched {
        style: KeyMatchStyle,
        matcher_entries: usize,
        matched_entries: usize,
    },
    /// The matched side of a group could not be built.
    MalformedGroup { group: &'static str, error: String },
    /// Verdict for one attribute group (headers, cookies, ...).
    GroupVerdict { group: &'static str, matched: bool },
}

impl MatchEvent {
    /// Whether this event explains a failed match.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            MatchEvent::ContainmentMatched { .. } | MatchEvent::GroupVerdict { matched: true, .. }
        )
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEvent::InvalidRegex { pattern, error } => {
                write!(f, "invalid regex \"{pattern}\": {error}")
            }
            MatchEvent::InvalidSchema { schema, error } => {
                write!(f, "invalid schema {schema}: {error}")
            }
            MatchEvent::EntryNotMatched { key, value } => {
                write!(f, "no entry matched {key}: {value}")
            }
            MatchEvent::NegatedKeyPresent { key } => {
                write!(f, "negated key {key} is present")
            }
            MatchEvent::InsufficientMatches { used, required } => {
                write!(f, "matched {used} entries but {required} are required")
            }
            MatchEvent::KeyMissing { key } => write!(f, "no values found for key {key}"),
            MatchEvent::ValueNotAccounted { key, value } => {
                write!(f, "value {value} for key {key} matched no configured value")
            }
            MatchEvent::ContainmentMatched {
                style,
                matcher_entries,
                matched_entries,
            } => write!(
                f,
                "{style} containment matched {matcher_entries} matcher entries against {matched_entries} entries"
            ),
            MatchEvent::MalformedGroup { group, error } => {
                write!(f, "{group} could not be compared: {error}")
            }
            MatchEvent::GroupVerdict { group, matched } => {
                let verdict = if *matched { "matched" } else { "didn't match" };
                write!(f, "{group} {verdict}")
            }
        }
    }
}

/// Receives match events.
///
/// Implementations must be cheap and must not panic: they are called on the
/// request path.
pub trait MatchObserver: Send + Sync {
    fn on_event(&self, correlation_id: Option<&str>, event: &MatchEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_event(&self, correlation_id: Option<&str>, event: &MatchEvent) {
        let correlation_id = correlation_id.unwrap_or("-");
        match event {
            MatchEvent::InvalidRegex { .. }
            | MatchEvent::InvalidSchema { .. }
            | MatchEvent::MalformedGroup { .. } => {
                warn!(correlation_id, "{}", event);
            }
            MatchEvent::ContainmentMatched { .. } => {
                trace!(correlation_id, "{}", event);
            }
            _ => {
                debug!(correlation_id, "{}", event);
            }
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl MatchObserver for SilentObserver {
    fn on_event(&self, _correlation_id: Option<&str>, _event: &MatchEvent) {}
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MatchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<MatchEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<MatchEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl MatchObserver for RecordingObserver {
    fn on_event(&self, _correlation_id: Option<&str>, event: &MatchEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(None, &MatchEvent::KeyMissing { key: "a".into() });
        observer.on_event(
            Some("req-1"),
            &MatchEvent::NegatedKeyPresent { key: "b".into() },
        );

        assert_eq!(
            observer.events(),
            vec![
                MatchEvent::KeyMissing { key: "a".into() },
                MatchEvent::NegatedKeyPresent { key: "b".into() },
            ]
        );
        assert_eq!(observer.take().len(), 2);
        assert!(observer.is_empty());
    }

    #[test]
    fn test_failure_classification() {
        assert!(MatchEvent::KeyMissing { key: "a".into() }.is_failure());
        assert!(MatchEvent::GroupVerdict {
            group: "headers",
            matched: false
        }
        .is_failure());
        assert!(!MatchEvent::GroupVerdict {
            group: "headers",
            matched: true
        }
        .is_failure());
    }

    #[traced_test]
    #[test]
    fn test_tracing_observer_warns_on_invalid_regex() {
        TracingObserver.on_event(
            Some("req-7"),
            &MatchEvent::InvalidRegex {
                pattern: "(".into(),
                error: "unclosed group".into(),
            },
        );
        assert!(logs_contain("invalid regex \"(\""));
        assert!(logs_contain("req-7"));
    }
}
