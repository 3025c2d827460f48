//! Shared fixtures for the crate's test modules.

use std::cell::{Cell as StdCell, RefCell};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::cell::Cell;
use crate::error::SyncResult;
use crate::grid::Grid;
use crate::report::SyncReporter;
use crate::sync::IdColumnSink;
use crate::throttle::TimeSource;

/// Deterministic clock. `sleep` records the requested duration and
/// advances the clock by it, so throttled pauses show up in `elapsed`.
pub struct FakeClock {
    now: StdCell<Instant>,
    slept: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            now: StdCell::new(Instant::now()),
            slept: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl TimeSource for FakeClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
        self.advance(duration);
    }
}

/// Reporter that records alerts and confirmation prompts and answers
/// every confirmation with a scripted yes or no.
pub struct RecordingReporter {
    alerts: RefCell<Vec<String>>,
    confirms: RefCell<Vec<String>>,
    answer: bool,
}

impl RecordingReporter {
    pub fn answering(answer: bool) -> Self {
        RecordingReporter {
            alerts: RefCell::new(Vec::new()),
            confirms: RefCell::new(Vec::new()),
            answer,
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.borrow().clone()
    }
}

impl SyncReporter for RecordingReporter {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.borrow_mut().push(message.to_string());
        self.answer
    }
}

/// Id-column sink that keeps every flushed column.
#[derive(Default)]
pub struct RecordingSink {
    writes: Vec<Vec<String>>,
}

impl RecordingSink {
    pub fn writes(&self) -> Vec<Vec<String>> {
        self.writes.clone()
    }
}

impl IdColumnSink for RecordingSink {
    fn write_ids(&mut self, ids: &[String]) -> SyncResult<()> {
        self.writes.push(ids.to_vec());
        Ok(())
    }
}

pub fn text_row(labels: &[&str]) -> Vec<Cell> {
    labels.iter().map(|s| Cell::Text(s.to_string())).collect()
}

/// A grid holding only the header row, id column first:
/// Id, Title, Description, Location, Guests, Color, All Day,
/// Start Time, End Time.
pub fn grid_with_header() -> Grid {
    Grid::new(vec![text_row(&[
        "Id",
        "Title",
        "Description",
        "Location",
        "Guests",
        "Color",
        "All Day",
        "Start Time",
        "End Time",
    ])])
}

/// One data row matching [`grid_with_header`]'s column order, with
/// description, guests, and color blank and All Day false.
pub fn sheet_row(
    id: &str,
    title: &str,
    location: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<Cell> {
    vec![
        Cell::Text(id.to_string()),
        Cell::Text(title.to_string()),
        Cell::Empty,
        Cell::Text(location.to_string()),
        Cell::Empty,
        Cell::Empty,
        Cell::Bool(false),
        Cell::DateTime(start),
        Cell::DateTime(end),
    ]
}

/// A window covering all of 2024, where the fixture events live.
/// Fixtures must not rely on the wall-clock-relative default window.
pub fn window_2024() -> crate::date_range::DateRange {
    crate::date_range::DateRange::from_args(Some("2024-01-01"), Some("2024-12-31")).unwrap()
}
