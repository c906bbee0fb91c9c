//! Peak-demand events.
//!
//! The utility announces peak-demand intervals a few hours ahead of time.
//! [`feed`] fetches and caches the public announcement feed; [`seen`] keeps a
//! small on-disk record of which events have already been reported to the
//! operator. The scheduler only ever consumes the validated, chronologically
//! sorted list produced here.

pub mod feed;
pub mod seen;

use chrono::{DateTime, FixedOffset};

/// A single peak-demand interval. `start < end` always holds for events
/// produced by this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakEvent {
    /// Start of the peak demand event.
    pub start: DateTime<FixedOffset>,
    /// End of the peak demand event.
    pub end: DateTime<FixedOffset>,
}

impl std::fmt::Display for PeakEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl PeakEvent {
    /// Stable identifier used by the seen-event store.
    pub fn id(&self) -> String {
        format!("{}{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
