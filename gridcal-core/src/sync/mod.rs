//! The two one-directional reconcilers.

pub mod from_calendar;
pub mod to_calendar;

use crate::error::SyncResult;

/// Statistics from a calendar→grid run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    /// The grid had no usable header and the canonical one was
    /// installed; the driver should apply its column formatting.
    pub header_installed: bool,
}

/// Statistics from a grid→calendar run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Rows skipped for validation errors or the blank-row setting.
    pub skipped: usize,
}

/// Checkpoint target for store-assigned ids during a grid→calendar run.
///
/// `ids` is the full id column, aligned with the grid's rows (header
/// included). Flushed mid-run when the time budget is exceeded so a
/// forced restart does not recreate events whose ids were never saved,
/// and once more at the end of the run.
pub trait IdColumnSink {
    fn write_ids(&mut self, ids: &[String]) -> SyncResult<()>;
}
