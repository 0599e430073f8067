//! Match context threaded through every comparison.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observer::{MatchEvent, MatchObserver, TracingObserver};

/// Containment style applied to one attribute group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyMatchStyle {
    /// Every required matcher entry is satisfied by some matched entry.
    #[default]
    SubSet,
    /// Every matched value under a matcher key is accounted for by a matcher value.
    MatchingKey,
}

impl fmt::Display for KeyMatchStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMatchStyle::SubSet => f.write_str("SUB_SET"),
            KeyMatchStyle::MatchingKey => f.write_str("MATCHING_KEY"),
        }
    }
}

/// Trust mode, containment style and observer for one evaluation.
///
/// `control_plane` is true only when two expectation definitions are compared
/// with each other (management API). During live traffic matching it is false
/// and the matched side is always treated as plain text.
#[derive(Clone)]
pub struct MatchContext {
    pub control_plane: bool,
    pub key_match_style: KeyMatchStyle,
    pub correlation_id: Option<String>,
    observer: Arc<dyn MatchObserver>,
}

impl MatchContext {
    pub fn new(control_plane: bool, key_match_style: KeyMatchStyle) -> Self {
        Self {
            control_plane,
            key_match_style,
            correlation_id: None,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Live traffic matching with `SUB_SET` containment.
    pub fn data_plane() -> Self {
        Self::new(false, KeyMatchStyle::SubSet)
    }

    /// Expectation-to-expectation matching with `SUB_SET` containment.
    pub fn control_plane() -> Self {
        Self::new(true, KeyMatchStyle::SubSet)
    }

    pub fn with_style(mut self, key_match_style: KeyMatchStyle) -> Self {
        self.key_match_style = key_match_style;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn observer(&self) -> &Arc<dyn MatchObserver> {
        &self.observer
    }

    #[inline]
    pub(crate) fn emit(&self, event: MatchEvent) {
        self.observer
            .on_event(self.correlation_id.as_deref(), &event);
    }
}

impl Default for MatchContext {
    fn default() -> Self {
        Self::data_plane()
    }
}

impl fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchContext")
            .field("control_plane", &self.control_plane)
            .field("key_match_style", &self.key_match_style)
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}
