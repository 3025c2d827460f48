//! Grid → calendar reconciliation.
//!
//! Walks data rows top to bottom, validating each into an [`Event`] and
//! deciding between no-op, in-place update, and create. A matched event
//! with one or two field differences is updated in place; three or more
//! (without guests) is cheaper to delete and recreate. Store events
//! never matched by any row become deletion candidates, removed only
//! after explicit confirmation.
//!
//! One bad row never aborts the run: validation failures alert and skip.
//! Store errors propagate; the id-column checkpoint bounds how much a
//! killed run can duplicate on retry.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::calendar::{CalendarStore, NewEvent};
use crate::columns::{field_labels, ColumnMap, Field};
use crate::config::SyncOptions;
use crate::date_range::DateRange;
use crate::error::{SyncError, SyncResult};
use crate::event::{all_day_end_exclusive, start_of_day, to_utc, Event};
use crate::grid::Grid;
use crate::report::SyncReporter;
use crate::sync::{IdColumnSink, PushOutcome};
use crate::throttle::Throttle;

/// In-place update is worth it below this many field differences; at or
/// above it, delete-and-recreate takes fewer store calls. The guest
/// clamp in [`Event::diff_count`] keeps guested events below it.
const RECREATE_DIFF_THRESHOLD: usize = 3;

/// Reconcile the calendar against the grid. The grid itself is not
/// mutated; newly assigned event ids go through `ids`, which the caller
/// backs with the sheet's id column.
pub fn run(
    grid: &Grid,
    calendar: &dyn CalendarStore,
    window: &DateRange,
    options: &SyncOptions,
    throttle: &Throttle,
    ids: &mut dyn IdColumnSink,
    reporter: &dyn SyncReporter,
) -> SyncResult<PushOutcome> {
    if grid.rows.len() < Grid::FIRST_DATA_ROW + 1 {
        return Err(SyncError::EmptySheet);
    }

    let map = ColumnMap::build(&grid.rows[Grid::HEADER_ROW]);
    let missing = map.required_missing(options.all_day.requires_column());
    if !missing.is_empty() {
        return Err(SyncError::MissingColumns(field_labels(&missing)));
    }
    let defaults = map.all_missing();
    let Some(id_idx) = map.position(Field::Id) else {
        return Err(SyncError::MissingColumns(field_labels(&[Field::Id])));
    };

    let events = calendar.list_events(window)?;
    // Every fetched event starts as a deletion candidate; matching a row
    // clears it, replacing one re-marks it.
    let mut candidates: HashMap<String, usize> = events
        .iter()
        .enumerate()
        .map(|(idx, event)| (event.id(), idx))
        .collect();

    let mut id_buffer: Vec<String> = grid
        .rows
        .iter()
        .map(|row| row.get(id_idx).map(|cell| cell.text()).unwrap_or_default())
        .collect();
    let mut ids_dirty = false;

    let mut outcome = PushOutcome::default();
    for (row_idx, row) in grid.rows.iter().enumerate().skip(Grid::FIRST_DATA_ROW) {
        // Budget check at the row boundary: checkpoint ids written so
        // far, keep going. The surrounding environment enforces the hard
        // kill; this only bounds duplicate work after it.
        if ids_dirty && throttle.over_budget() {
            ids.write_ids(&id_buffer)?;
            ids_dirty = false;
        }

        let sheet_event = Event::from_row(row, &map, &defaults, options.all_day);
        if options.skip_blank_rows && sheet_event.start.is_none() && sheet_event.end.is_none() {
            outcome.skipped += 1;
            continue;
        }

        let display_row = row_idx + 1;
        if sheet_event.title.trim().is_empty() {
            reporter.alert_row("must have a title", &sheet_event.title, display_row);
            outcome.skipped += 1;
            continue;
        }
        let Some(start) = sheet_event.start else {
            reporter.alert_row(
                "start time must be a date/time",
                &sheet_event.title,
                display_row,
            );
            outcome.skipped += 1;
            continue;
        };
        let Some(end) = sheet_event.end else {
            reporter.alert_row(
                "end time must be a date/time",
                &sheet_event.title,
                display_row,
            );
            outcome.skipped += 1;
            continue;
        };
        if end < start {
            reporter.alert_row(
                "end time must be after start time",
                &sheet_event.title,
                display_row,
            );
            outcome.skipped += 1;
            continue;
        }

        let start_utc = to_utc(start, options.timezone);
        let end_utc = to_utc(end, options.timezone);
        if window.excludes(start_utc, end_utc) {
            debug!(row = display_row, "row outside sync window");
            continue;
        }

        let mut add_event = true;
        if !sheet_event.id.is_empty() {
            if let Some(event_idx) = candidates.remove(&sheet_event.id) {
                add_event = false;
                let native = &events[event_idx];
                let snapshot = Event::from_calendar(native.as_ref(), options.timezone);
                let diffs = snapshot.diff_count(&sheet_event);
                if diffs > 0 {
                    if diffs < RECREATE_DIFF_THRESHOLD {
                        let mutations =
                            snapshot.apply_diff(&sheet_event, native.as_ref(), options.timezone)?;
                        throttle.pause_weighted(mutations);
                        outcome.updated += 1;
                        debug!(row = display_row, mutations, "updated event in place");
                    } else {
                        // Cheaper to recreate; the old event rejoins the
                        // deletion candidates and goes at the end.
                        add_event = true;
                        candidates.insert(sheet_event.id.clone(), event_idx);
                        debug!(row = display_row, diffs, "recreating heavily changed event");
                    }
                }
            }
        }

        if add_event {
            let created = calendar.create_event(&new_event(&sheet_event, start, end, options))?;
            id_buffer[row_idx] = created.id();
            ids_dirty = true;
            if sheet_event.color.code().is_some() {
                created.set_color_token(&sheet_event.color.store_token())?;
            }
            throttle.pause();
            outcome.created += 1;
        }
    }

    if ids_dirty {
        ids.write_ids(&id_buffer)?;
    }

    if !candidates.is_empty() {
        let message = format!(
            "Delete {} calendar event(s) not found in spreadsheet?",
            candidates.len()
        );
        if reporter.confirm(&message) {
            let mut doomed: Vec<usize> = candidates.into_values().collect();
            doomed.sort_unstable();
            for event_idx in doomed {
                events[event_idx].delete()?;
                throttle.pause();
                outcome.deleted += 1;
            }
        } else {
            warn!(
                candidates = candidates.len(),
                "deletion declined, unmatched events left in place"
            );
        }
    }

    debug!(
        created = outcome.created,
        updated = outcome.updated,
        deleted = outcome.deleted,
        skipped = outcome.skipped,
        "push reconciliation done"
    );
    Ok(outcome)
}

fn new_event(
    sheet_event: &Event,
    start: chrono::NaiveDateTime,
    end: chrono::NaiveDateTime,
    options: &SyncOptions,
) -> NewEvent {
    let (start, end) = if sheet_event.all_day {
        (start_of_day(start), all_day_end_exclusive(end))
    } else {
        (start, end)
    };
    NewEvent {
        title: sheet_event.title.clone(),
        start: to_utc(start, options.timezone),
        end: to_utc(end, options.timezone),
        all_day: sheet_event.all_day,
        description: sheet_event.description.clone(),
        location: sheet_event.location.clone(),
        guests: sheet_event.guest_set().into_iter().collect(),
        send_invites: options.send_invites,
    }
}
