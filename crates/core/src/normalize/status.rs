//! Status classification.
//!
//! A fixed-priority decision list evaluated top to bottom; the first matching
//! rule wins. The order is load-bearing: a completed record that was also
//! transmitted to the client is `Archived`, never `Completed`.

use serde::{Deserialize, Serialize};

use crate::entity::Status;

/// Whether status depends on the record having a usable location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGating {
    /// Status is computed from the lifecycle fields alone.
    #[default]
    Ungated,
    /// Records without address and raw coordinates are `Unknown`.
    RequireLocation,
}

/// Lifecycle facts read off a raw record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSignals {
    /// Address non-empty and both raw coordinates present.
    pub has_location: bool,
    pub cancelled: bool,
    pub cancellation_date: bool,
    pub suspended: bool,
    pub transmitted: bool,
    pub suspension_released: bool,
    pub completed: bool,
}

/// Classify a record. Exactly one status is always returned.
pub fn classify(signals: &StatusSignals, gating: StatusGating) -> Status {
    let s = signals;

    if gating == StatusGating::RequireLocation && !s.has_location {
        return Status::Unknown;
    }
    if s.cancelled && s.cancellation_date {
        return Status::Cancelled;
    }
    if s.suspended && !s.transmitted && !s.suspension_released {
        return Status::Suspended;
    }
    if s.transmitted && !s.cancelled {
        return Status::Archived;
    }
    if s.completed {
        return Status::Completed;
    }
    if !s.transmitted && !s.cancelled && !s.cancellation_date && !s.suspended {
        return Status::Live;
    }

    Status::Unknown
}
