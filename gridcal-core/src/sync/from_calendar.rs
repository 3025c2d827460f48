//! Calendar → grid reconciliation.
//!
//! Makes the grid reflect the calendar: events already in the grid are
//! overwritten in place, unknown events append new rows, and rows whose
//! event vanished from the calendar are removed. Pre-existing row order
//! is never changed; new rows land at the bottom in store enumeration
//! order.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::calendar::CalendarEvent;
use crate::columns::{field_labels, ColumnMap};
use crate::config::SyncOptions;
use crate::error::{SyncError, SyncResult};
use crate::event::{local_wall_clock, Event};
use crate::grid::Grid;
use crate::sync::PullOutcome;

/// Row identity in the calendar→grid direction: the event id plus the
/// start time, so instances of a recurring series sharing one base id
/// occupy distinct rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RowKey {
    id: String,
    start_ms: Option<i64>,
}

impl RowKey {
    fn new(id: String, start: Option<NaiveDateTime>) -> Option<RowKey> {
        if id.is_empty() {
            return None;
        }
        Some(RowKey {
            id,
            start_ms: start.map(|dt| dt.and_utc().timestamp_millis()),
        })
    }
}

fn row_key(row: &[crate::cell::Cell], map: &ColumnMap) -> Option<RowKey> {
    let id = map
        .position(crate::columns::Field::Id)
        .and_then(|idx| row.get(idx))
        .map(|cell| cell.text())
        .unwrap_or_default();
    let start = map
        .position(crate::columns::Field::StartTime)
        .and_then(|idx| row.get(idx))
        .and_then(|cell| cell.date_time());
    RowKey::new(id, start)
}

/// Reconcile the grid against the given window of calendar events.
/// The caller persists the mutated grid afterwards (one bulk write plus
/// one trailing delete of removed rows).
pub fn run(
    grid: &mut Grid,
    events: &[Rc<dyn CalendarEvent>],
    options: &SyncOptions,
) -> SyncResult<PullOutcome> {
    let mut outcome = PullOutcome::default();

    if grid.has_placeholder_header() {
        grid.install_canonical_header();
        outcome.header_installed = true;
        debug!("installed canonical header row");
    }

    let map = ColumnMap::build(&grid.rows[Grid::HEADER_ROW]);
    let missing = map.required_missing(options.all_day.requires_column());
    if !missing.is_empty() {
        return Err(SyncError::MissingColumns(field_labels(&missing)));
    }

    // Identity of every pre-existing data row; first occurrence wins.
    let original_len = grid.rows.len();
    let keys: Vec<Option<RowKey>> = grid
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            if idx < Grid::FIRST_DATA_ROW {
                None
            } else {
                row_key(row, &map)
            }
        })
        .collect();
    let mut index: HashMap<&RowKey, usize> = HashMap::new();
    for (idx, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_insert(idx);
        }
    }

    let mut visited = vec![false; original_len];
    for native in events {
        let event = Event::from_calendar(native.as_ref(), options.timezone);
        let key = RowKey::new(
            event.id.clone(),
            Some(local_wall_clock(native.start(), options.timezone)),
        );
        match key.as_ref().and_then(|k| index.get(k)) {
            Some(&row_idx) => {
                visited[row_idx] = true;
                event.to_row(&map, &mut grid.rows[row_idx]);
                outcome.updated += 1;
            }
            None => {
                let row_idx = grid.push_blank_row(map.len());
                event.to_row(&map, &mut grid.rows[row_idx]);
                outcome.added += 1;
            }
        }
    }

    // Remove unvisited rows from the bottom up, but only rows that ever
    // had an identity; always-blank rows are unused template rows, not
    // stray data.
    for idx in (Grid::FIRST_DATA_ROW..original_len).rev() {
        if !visited[idx] && keys[idx].is_some() {
            grid.rows.remove(idx);
            outcome.deleted += 1;
        }
    }

    debug!(
        added = outcome.added,
        updated = outcome.updated,
        deleted = outcome.deleted,
        "pull reconciliation done"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarStore, EventRecord, MemoryCalendar};
    use crate::cell::Cell;
    use crate::columns::Field;
    use crate::config::AllDayPolicy;
    use crate::testutil::{grid_with_header, text_row, window_2024};
    use chrono::NaiveDate;

    fn record(id: &str, title: &str, day: u32, hour: u32) -> EventRecord {
        let start = NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        EventRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            location: String::new(),
            guests: vec![],
            color: String::new(),
            all_day: false,
            start: start.and_utc(),
            end: (start + chrono::Duration::hours(1)).and_utc(),
        }
    }

    fn events_of(records: Vec<EventRecord>) -> Vec<std::rc::Rc<dyn CalendarEvent>> {
        MemoryCalendar::from_records(records)
            .list_events(&window_2024())
            .unwrap()
    }

    #[test]
    fn test_appends_rows_for_unknown_events() {
        let mut grid = grid_with_header();
        let events = events_of(vec![record("a", "Standup", 3, 9), record("b", "Retro", 4, 15)]);
        let outcome = run(&mut grid, &events, &SyncOptions::default()).unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.updated, 0);
        assert_eq!(grid.rows.len(), 3);
        let title_idx = 1; // header order: Title second per testutil header
        assert_eq!(grid.rows[1][title_idx], Cell::Text("Standup".to_string()));
        assert_eq!(grid.rows[2][title_idx], Cell::Text("Retro".to_string()));
    }

    #[test]
    fn test_updates_matching_row_in_place() {
        let mut grid = grid_with_header();
        // Seed the grid from one pull, then change the store title
        let events = events_of(vec![record("a", "Standup", 3, 9)]);
        run(&mut grid, &events, &SyncOptions::default()).unwrap();

        let events = events_of(vec![record("a", "Renamed", 3, 9)]);
        let outcome = run(&mut grid, &events, &SyncOptions::default()).unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.deleted, 0);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1][1], Cell::Text("Renamed".to_string()));
    }

    #[test]
    fn test_removes_rows_for_vanished_events_only() {
        let mut grid = grid_with_header();
        let events = events_of(vec![record("a", "Standup", 3, 9), record("b", "Retro", 4, 15)]);
        run(&mut grid, &events, &SyncOptions::default()).unwrap();
        // A template row with no id survives; the vanished event's row goes
        grid.rows.push(vec![Cell::Empty; grid.rows[0].len()]);

        let events = events_of(vec![record("a", "Standup", 3, 9)]);
        let outcome = run(&mut grid, &events, &SyncOptions::default()).unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(grid.rows.len(), 3); // header + "a" + blank template row
        assert_eq!(grid.rows[1][1], Cell::Text("Standup".to_string()));
        assert!(grid.rows[2].iter().all(|c| c.is_blank()));
    }

    #[test]
    fn test_same_id_different_start_gets_its_own_row() {
        let mut grid = grid_with_header();
        // Two instances of a recurring series share a base id
        let events = events_of(vec![record("series", "Weekly", 3, 9), record("series", "Weekly", 10, 9)]);
        let outcome = run(&mut grid, &events, &SyncOptions::default()).unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(grid.rows.len(), 3);
    }

    #[test]
    fn test_installs_header_into_empty_grid() {
        let mut grid = Grid::default();
        let events = events_of(vec![record("a", "Standup", 3, 9)]);
        let outcome = run(&mut grid, &events, &SyncOptions::default()).unwrap();
        assert!(outcome.header_installed);
        assert_eq!(grid.rows[0][0], Cell::Text("Title".to_string()));
        assert_eq!(outcome.added, 1);
    }

    #[test]
    fn test_missing_required_column_aborts_without_mutation() {
        let mut grid = Grid::new(vec![text_row(&["Title", "Start Time"])]);
        let before = grid.clone();
        let events = events_of(vec![record("a", "Standup", 3, 9)]);
        let err = run(&mut grid, &events, &SyncOptions::default()).unwrap_err();
        match err {
            SyncError::MissingColumns(cols) => {
                assert!(cols.contains("\"Id\""));
                assert!(cols.contains("\"End Time\""));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
        assert_eq!(grid, before);
    }

    #[test]
    fn test_all_day_column_required_only_under_use_column_policy() {
        let labels: Vec<&str> = Field::ALL
            .iter()
            .filter(|f| **f != Field::AllDay)
            .map(|f| f.label())
            .collect();
        let mut grid = Grid::new(vec![text_row(&labels)]);
        let events = events_of(vec![]);

        assert!(matches!(
            run(&mut grid, &events, &SyncOptions::default()),
            Err(SyncError::MissingColumns(_))
        ));

        let options = SyncOptions {
            all_day: AllDayPolicy::NeverAllDay,
            ..SyncOptions::default()
        };
        assert!(run(&mut grid, &events, &options).is_ok());
    }
}
