//! Core reconciliation engine keeping a spreadsheet-style grid and a
//! calendar store convergent.
//!
//! The engine is store-agnostic: calendars come in through the
//! [`calendar::CalendarStore`] and [`calendar::CalendarEvent`] traits,
//! grids as plain [`grid::Grid`] cell matrices. The two reconcilers live
//! in [`sync`]: `from_calendar` makes the grid match the calendar,
//! `to_calendar` makes the calendar match the grid.

pub mod calendar;
pub mod cell;
pub mod columns;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod grid;
pub mod report;
pub mod sync;
pub mod throttle;

#[cfg(test)]
pub(crate) mod testutil;

pub use calendar::{CalendarEvent, CalendarStore, EventRecord, MemoryCalendar, NewEvent};
pub use cell::Cell;
pub use columns::{ColumnMap, Field};
pub use config::{AllDayPolicy, SyncOptions};
pub use date_range::DateRange;
pub use error::{SyncError, SyncResult};
pub use event::{Event, EventColor};
pub use grid::Grid;
pub use report::SyncReporter;
pub use sync::{IdColumnSink, PullOutcome, PushOutcome};
pub use throttle::{SystemClock, Throttle, ThrottleOptions, TimeSource};
