//! User-facing reporting seam.
//!
//! Reconcilers never talk to a terminal or dialog directly; they go
//! through this trait. The driver decides what an alert looks like, and
//! tests substitute a recording implementation.

/// Blocking alerts and confirmations surfaced to the invoking user.
pub trait SyncReporter {
    /// Report a condition the user should see. Blocking, no answer.
    fn alert(&self, message: &str);

    /// Report a row-scoped validation problem. `row` is the 1-based row
    /// number as the user sees it in their sheet.
    fn alert_row(&self, message: &str, title: &str, row: usize) {
        self.alert(&format!(
            "Skipping row: {message} in event \"{title}\", row {row}"
        ));
    }

    /// Ask a yes/no question. `false` on decline or no answer.
    fn confirm(&self, message: &str) -> bool;
}
