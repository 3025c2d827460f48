//! The canonical event model.
//!
//! `Event` is the provider-neutral meeting point of the two worlds: the
//! calendar store's native events on one side and grid rows on the
//! other. Conversions in both directions live here, along with the
//! field-level diff that drives reconciliation.
//!
//! Datetimes are wall-clock (`NaiveDateTime`) in the run's single
//! reference time zone; the conversions to and from the store's UTC
//! instants happen at this boundary and nowhere else.

use std::collections::BTreeSet;
use std::num::NonZeroU8;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::calendar::CalendarEvent;
use crate::cell::Cell;
use crate::columns::{ColumnMap, Field};
use crate::config::AllDayPolicy;
use crate::error::{SyncError, SyncResult};

/// Event color, canonically a numeric code 1..=11 or unset.
///
/// The ambiguity of the two string forms stops here: the calendar
/// boundary serializes with [`EventColor::store_token`] (numeric string)
/// and the grid boundary with [`EventColor::display_token`] (palette
/// name). Anything unparseable reads as unset, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventColor(Option<NonZeroU8>);

const COLOR_NAMES: [&str; 11] = [
    "PALE_BLUE",
    "PALE_GREEN",
    "MAUVE",
    "PALE_RED",
    "YELLOW",
    "ORANGE",
    "CYAN",
    "GRAY",
    "BLUE",
    "GREEN",
    "RED",
];

impl EventColor {
    pub fn none() -> Self {
        EventColor(None)
    }

    /// Valid codes are 1..=11; anything else is unset.
    pub fn from_code(code: u8) -> Self {
        if (1..=11).contains(&code) {
            EventColor(NonZeroU8::new(code))
        } else {
            EventColor(None)
        }
    }

    /// Accepts either the numeric form ("6") or the palette name
    /// ("ORANGE"), case-insensitively.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            return EventColor(None);
        }
        if let Ok(code) = token.parse::<u8>() {
            return EventColor::from_code(code);
        }
        let upper = token.to_uppercase();
        match COLOR_NAMES.iter().position(|name| *name == upper) {
            Some(idx) => EventColor::from_code(idx as u8 + 1),
            None => EventColor(None),
        }
    }

    pub fn code(&self) -> Option<u8> {
        self.0.map(NonZeroU8::get)
    }

    /// Numeric string for the calendar boundary ("6"), empty when unset.
    pub fn store_token(&self) -> String {
        self.code().map(|c| c.to_string()).unwrap_or_default()
    }

    /// Palette name for the grid boundary ("ORANGE"), empty when unset.
    pub fn display_token(&self) -> &'static str {
        match self.code() {
            Some(code) => COLOR_NAMES[code as usize - 1],
            None => "",
        }
    }

    pub fn palette_names() -> &'static [&'static str] {
        &COLOR_NAMES
    }
}

/// One calendar event, as both sides of a sync see it.
///
/// For an all-day event `start` and `end` are midnights and `end` is the
/// *last day the event is active* (inclusive), even though the store
/// represents the end as the midnight after.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Store-assigned, empty until first creation.
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Comma-joined guest emails; order is irrelevant for comparison.
    pub guests: String,
    pub color: EventColor,
    pub all_day: bool,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Event {
    /// Read an event out of the calendar store.
    ///
    /// All-day normalization: the store's exclusive end (midnight after
    /// the last day) comes back as the inclusive last-day midnight.
    pub fn from_calendar(native: &dyn CalendarEvent, tz: Tz) -> Event {
        let all_day = native.is_all_day();
        let start = local_wall_clock(native.start(), tz);
        let mut end = local_wall_clock(native.end(), tz);
        if all_day && end.hour() == 0 && end.minute() == 0 && end.second() == 0 {
            end -= Duration::days(1);
        }
        Event {
            id: native.id(),
            title: native.title(),
            description: native.description(),
            location: native.location(),
            guests: native.guest_emails().join(","),
            color: EventColor::parse(&native.color_token()),
            all_day,
            start: Some(start),
            end: Some(end),
        }
    }

    /// Project a grid row into an event via the column mapping.
    ///
    /// Cells that fail date coercion become `None`, never an error.
    /// `fields_to_default` names fields downstream code needs that have
    /// no column in this grid; they take their zero values. A non-column
    /// all-day policy overrides whatever the row's own cell says.
    pub fn from_row(
        row: &[Cell],
        map: &ColumnMap,
        fields_to_default: &[Field],
        all_day_policy: AllDayPolicy,
    ) -> Event {
        let mut event = Event::default();
        for (idx, slot) in map.slots().iter().enumerate() {
            let Some(field) = slot else { continue };
            let cell = row.get(idx).cloned().unwrap_or_default();
            event.set_field(*field, &cell);
        }
        for field in fields_to_default {
            event.set_field(*field, &Cell::Empty);
        }
        match all_day_policy {
            AllDayPolicy::UseColumn => {}
            AllDayPolicy::AlwaysAllDay => event.all_day = true,
            AllDayPolicy::NeverAllDay => event.all_day = false,
        }
        event
    }

    fn set_field(&mut self, field: Field, cell: &Cell) {
        match field {
            Field::Id => self.id = cell.text(),
            Field::Title => self.title = cell.text(),
            Field::Description => self.description = cell.text(),
            Field::Location => self.location = cell.text(),
            Field::Guests => self.guests = cell.text(),
            Field::Color => self.color = EventColor::parse(&cell.text()),
            Field::AllDay => self.all_day = matches!(cell, Cell::Bool(true)),
            Field::StartTime => self.start = cell.date_time(),
            Field::EndTime => self.end = cell.date_time(),
        }
    }

    /// Write this event into the mapped positions of a row, leaving
    /// unmapped positions untouched. All-day dates are written as locale
    /// date text so a re-read cannot shift them across a zone boundary.
    pub fn to_row(&self, map: &ColumnMap, row: &mut Vec<Cell>) {
        if row.len() < map.len() {
            row.resize(map.len(), Cell::Empty);
        }
        for (idx, slot) in map.slots().iter().enumerate() {
            let Some(field) = slot else { continue };
            row[idx] = match field {
                Field::Id => Cell::Text(self.id.clone()),
                Field::Title => Cell::Text(self.title.clone()),
                Field::Description => Cell::Text(self.description.clone()),
                Field::Location => Cell::Text(self.location.clone()),
                Field::Guests => Cell::Text(self.guests.clone()),
                Field::Color => match self.color.code() {
                    Some(_) => Cell::Text(self.color.display_token().to_string()),
                    None => Cell::Empty,
                },
                Field::AllDay => Cell::Bool(self.all_day),
                Field::StartTime => self.date_cell(self.start),
                Field::EndTime => self.date_cell(self.end),
            };
        }
    }

    fn date_cell(&self, value: Option<NaiveDateTime>) -> Cell {
        match value {
            None => Cell::Empty,
            Some(dt) if self.all_day => Cell::Text(dt.format("%-m/%-d/%Y").to_string()),
            Some(dt) => Cell::DateTime(dt),
        }
    }

    /// Guest emails as a set: trimmed, empties dropped, order ignored.
    pub fn guest_set(&self) -> BTreeSet<String> {
        self.guests
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Number of differing fields between `self` and `other`.
    ///
    /// When the count is nonzero and this event has guests, it is forced
    /// to exactly 1: any change to a guested event must go through an
    /// in-place update, because delete-and-recreate would make every
    /// guest re-confirm attendance.
    pub fn diff_count(&self, other: &Event) -> usize {
        let mut diffs = 0;
        diffs += usize::from(self.title != other.title);
        diffs += usize::from(self.description != other.description);
        diffs += usize::from(self.location != other.location);
        diffs += usize::from(self.start != other.start);
        diffs += usize::from(self.end != other.end);
        diffs += usize::from(self.guest_set() != other.guest_set());
        diffs += usize::from(self.color != other.color);
        diffs += usize::from(self.all_day != other.all_day);
        if diffs > 0 && !self.guest_set().is_empty() {
            return 1;
        }
        diffs
    }

    /// Update the native store event in place so it matches `target`,
    /// where `self` is the current calendar-side snapshot. Issues one
    /// store mutation per differing field (guest reconciliation is one
    /// mutation per added or removed email) and returns the count, which
    /// is the caller's throttling weight.
    ///
    /// A target color outside the valid range is skipped silently.
    pub fn apply_diff(
        &self,
        target: &Event,
        native: &dyn CalendarEvent,
        tz: Tz,
    ) -> SyncResult<usize> {
        let mut mutations = 0;

        let time_changed = self.start != target.start
            || self.end != target.end
            || self.all_day != target.all_day;
        if time_changed {
            let (start, end) = target.require_times()?;
            if target.all_day {
                native.set_all_day_dates(
                    to_utc(start_of_day(start), tz),
                    to_utc(all_day_end_exclusive(end), tz),
                )?;
            } else {
                native.set_time(to_utc(start, tz), to_utc(end, tz))?;
            }
            mutations += 1;
        }
        if self.title != target.title {
            native.set_title(&target.title)?;
            mutations += 1;
        }
        if self.description != target.description {
            native.set_description(&target.description)?;
            mutations += 1;
        }
        if self.location != target.location {
            native.set_location(&target.location)?;
            mutations += 1;
        }
        if self.color != target.color && target.color.code().is_some() {
            native.set_color_token(&target.color.store_token())?;
            mutations += 1;
        }
        let current = self.guest_set();
        let wanted = target.guest_set();
        for email in wanted.difference(&current) {
            native.add_guest(email)?;
            mutations += 1;
        }
        for email in current.difference(&wanted) {
            native.remove_guest(email)?;
            mutations += 1;
        }
        Ok(mutations)
    }

    pub(crate) fn require_times(&self) -> SyncResult<(NaiveDateTime, NaiveDateTime)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(SyncError::InvalidEvent(format!(
                "event \"{}\" is missing a start or end time",
                self.title
            ))),
        }
    }
}

/// The store's exclusive all-day end for an inclusive last-day value:
/// midnight of the following day. A hand-entered 23:59[:59] end rounds
/// up to the same boundary.
pub(crate) fn all_day_end_exclusive(end: NaiveDateTime) -> NaiveDateTime {
    (end.date() + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap()
}

pub(crate) fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date().and_hms_opt(0, 0, 0).unwrap()
}

/// A store instant as wall-clock time in the reference zone.
pub(crate) fn local_wall_clock(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// A reference-zone wall-clock time as a store instant. A time falling
/// in a DST gap resolves to the earliest valid interpretation.
pub(crate) fn to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}
