use std::fmt;

use crate::record::Record;
use crate::schema::RowVerdict;

/// Why a harvest run ended. None of these are errors: the records gathered
/// up to that point are always returned alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CapReached,
    Exhausted,
    NoTable,
    NavigationFailure,
    Cancelled,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::CapReached => "cap_reached",
            StopReason::Exhausted => "exhausted",
            StopReason::NoTable => "no_table",
            StopReason::NavigationFailure => "navigation_failure",
            StopReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeOutcome {
    Unchanged,
    Changed,
    Unavailable,
    /// The change was requested but the refresh was never observed.
    Unconfirmed,
}

/// Per-row diagnostics. Rejected rows never fail a page; they are only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowStats {
    pub accepted: usize,
    pub spacers: usize,
    pub unknown_layout: usize,
    pub missing_required: usize,
    pub unreadable: usize,
}

impl RowStats {
    pub fn note(&mut self, verdict: &RowVerdict) {
        match verdict {
            RowVerdict::Record(_) => self.accepted += 1,
            RowVerdict::Spacer => self.spacers += 1,
            RowVerdict::UnknownLayout { .. } => self.unknown_layout += 1,
            RowVerdict::MissingRequired { .. } => self.missing_required += 1,
        }
    }

    pub fn note_unreadable(&mut self) {
        self.unreadable += 1;
    }

    pub fn merge(&mut self, other: RowStats) {
        self.accepted += other.accepted;
        self.spacers += other.spacers;
        self.unknown_layout += other.unknown_layout;
        self.missing_required += other.missing_required;
        self.unreadable += other.unreadable;
    }

    pub fn rejected(&self) -> usize {
        self.unknown_layout + self.missing_required + self.unreadable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub records: Vec<Record>,
    pub pages_scraped: u32,
    pub last_page: u32,
    pub stop_reason: StopReason,
    pub page_size: PageSizeOutcome,
    pub rows: RowStats,
}
