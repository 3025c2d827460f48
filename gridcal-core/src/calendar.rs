//! Calendar store capability interfaces.
//!
//! The engine only ever sees a calendar through these two traits: a
//! store that can list and create events, and a narrow per-event handle
//! that can read fields, mutate fields, and delete. A production adapter
//! wraps a real calendar API behind them; [`MemoryCalendar`] is a fully
//! in-memory implementation used by the CLI's file-backed store and by
//! tests.

use std::cell::{Cell as StdCell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::{SyncError, SyncResult};

/// Handle to one native store event: read fields, mutate fields, delete.
/// Mutations take effect in the backing store immediately; each setter
/// is one rate-limited store call.
pub trait CalendarEvent {
    fn id(&self) -> String;
    fn title(&self) -> String;
    fn description(&self) -> String;
    fn location(&self) -> String;
    fn guest_emails(&self) -> Vec<String>;
    /// Numeric color token ("1".."11"), or empty when unset.
    fn color_token(&self) -> String;
    fn is_all_day(&self) -> bool;
    fn start(&self) -> DateTime<Utc>;
    /// For all-day events this is the store's exclusive end (midnight
    /// after the last active day).
    fn end(&self) -> DateTime<Utc>;

    fn set_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<()>;
    fn set_all_day_dates(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<()>;
    fn set_title(&self, title: &str) -> SyncResult<()>;
    fn set_description(&self, description: &str) -> SyncResult<()>;
    fn set_location(&self, location: &str) -> SyncResult<()>;
    fn set_color_token(&self, token: &str) -> SyncResult<()>;
    fn add_guest(&self, email: &str) -> SyncResult<()>;
    fn remove_guest(&self, email: &str) -> SyncResult<()>;
    fn delete(&self) -> SyncResult<()>;
}

/// Payload for creating a store event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    /// Exclusive end for all-day events, as the store expects.
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub description: String,
    pub location: String,
    pub guests: Vec<String>,
    pub send_invites: bool,
}

/// A calendar the engine can reconcile against.
pub trait CalendarStore {
    /// List events overlapping the window, in store enumeration order.
    fn list_events(&self, range: &DateRange) -> SyncResult<Vec<Rc<dyn CalendarEvent>>>;

    /// Create an event; the returned handle carries the store-assigned id.
    fn create_event(&self, new_event: &NewEvent) -> SyncResult<Rc<dyn CalendarEvent>>;
}

/// Serializable snapshot of one stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub guests: Vec<String>,
    /// Numeric color token, empty when unset.
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub all_day: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

struct MemoryEvent {
    record: RefCell<EventRecord>,
    deleted: StdCell<bool>,
}

impl MemoryEvent {
    fn check_alive(&self) -> SyncResult<()> {
        if self.deleted.get() {
            return Err(SyncError::Store("event was deleted".to_string()));
        }
        Ok(())
    }
}

impl CalendarEvent for MemoryEvent {
    fn id(&self) -> String {
        self.record.borrow().id.clone()
    }

    fn title(&self) -> String {
        self.record.borrow().title.clone()
    }

    fn description(&self) -> String {
        self.record.borrow().description.clone()
    }

    fn location(&self) -> String {
        self.record.borrow().location.clone()
    }

    fn guest_emails(&self) -> Vec<String> {
        self.record.borrow().guests.clone()
    }

    fn color_token(&self) -> String {
        self.record.borrow().color.clone()
    }

    fn is_all_day(&self) -> bool {
        self.record.borrow().all_day
    }

    fn start(&self) -> DateTime<Utc> {
        self.record.borrow().start
    }

    fn end(&self) -> DateTime<Utc> {
        self.record.borrow().end
    }

    fn set_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<()> {
        self.check_alive()?;
        let mut record = self.record.borrow_mut();
        record.start = start;
        record.end = end;
        record.all_day = false;
        Ok(())
    }

    fn set_all_day_dates(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<()> {
        self.check_alive()?;
        let mut record = self.record.borrow_mut();
        record.start = start;
        record.end = end;
        record.all_day = true;
        Ok(())
    }

    fn set_title(&self, title: &str) -> SyncResult<()> {
        self.check_alive()?;
        self.record.borrow_mut().title = title.to_string();
        Ok(())
    }

    fn set_description(&self, description: &str) -> SyncResult<()> {
        self.check_alive()?;
        self.record.borrow_mut().description = description.to_string();
        Ok(())
    }

    fn set_location(&self, location: &str) -> SyncResult<()> {
        self.check_alive()?;
        self.record.borrow_mut().location = location.to_string();
        Ok(())
    }

    fn set_color_token(&self, token: &str) -> SyncResult<()> {
        self.check_alive()?;
        self.record.borrow_mut().color = token.to_string();
        Ok(())
    }

    fn add_guest(&self, email: &str) -> SyncResult<()> {
        self.check_alive()?;
        let mut record = self.record.borrow_mut();
        if !record.guests.iter().any(|g| g == email) {
            record.guests.push(email.to_string());
        }
        Ok(())
    }

    fn remove_guest(&self, email: &str) -> SyncResult<()> {
        self.check_alive()?;
        self.record.borrow_mut().guests.retain(|g| g != email);
        Ok(())
    }

    fn delete(&self) -> SyncResult<()> {
        self.check_alive()?;
        self.deleted.set(true);
        Ok(())
    }
}

/// In-memory calendar store. Single-threaded by design, matching the
/// engine's execution model.
#[derive(Default)]
pub struct MemoryCalendar {
    events: RefCell<Vec<Rc<MemoryEvent>>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        MemoryCalendar::default()
    }

    pub fn from_records(records: Vec<EventRecord>) -> Self {
        let events = records
            .into_iter()
            .map(|record| {
                Rc::new(MemoryEvent {
                    record: RefCell::new(record),
                    deleted: StdCell::new(false),
                })
            })
            .collect();
        MemoryCalendar {
            events: RefCell::new(events),
        }
    }

    /// Snapshot of all live events, in enumeration order.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.events
            .borrow()
            .iter()
            .filter(|e| !e.deleted.get())
            .map(|e| e.record.borrow().clone())
            .collect()
    }
}

impl CalendarStore for MemoryCalendar {
    fn list_events(&self, range: &DateRange) -> SyncResult<Vec<Rc<dyn CalendarEvent>>> {
        Ok(self
            .events
            .borrow()
            .iter()
            .filter(|e| !e.deleted.get())
            .filter(|e| {
                let record = e.record.borrow();
                range.overlaps(record.start, record.end)
            })
            .map(|e| Rc::clone(e) as Rc<dyn CalendarEvent>)
            .collect())
    }

    fn create_event(&self, new_event: &NewEvent) -> SyncResult<Rc<dyn CalendarEvent>> {
        // send_invites is accepted but has no effect here; invitation
        // fan-out belongs to a real calendar backend.
        let record = EventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: new_event.title.clone(),
            description: new_event.description.clone(),
            location: new_event.location.clone(),
            guests: new_event.guests.clone(),
            color: String::new(),
            all_day: new_event.all_day,
            start: new_event.start,
            end: new_event.end,
        };
        let event = Rc::new(MemoryEvent {
            record: RefCell::new(record),
            deleted: StdCell::new(false),
        });
        self.events.borrow_mut().push(Rc::clone(&event));
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::window_2024;
    use chrono::TimeZone;

    fn record(id: &str, start_hour: u32) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            title: format!("Event {id}"),
            description: String::new(),
            location: String::new(),
            guests: vec![],
            color: String::new(),
            all_day: false,
            start: Utc.with_ymd_and_hms(2024, 6, 1, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 6, 1, start_hour + 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_list_filters_by_window() {
        let calendar = MemoryCalendar::from_records(vec![record("a", 10), record("b", 12)]);
        let window = DateRange {
            from: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap()),
        };
        let events = calendar.list_events(&window).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id(), "a");
    }

    #[test]
    fn test_create_assigns_id_and_persists() {
        let calendar = MemoryCalendar::new();
        let created = calendar
            .create_event(&NewEvent {
                title: "Meeting".to_string(),
                start: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap(),
                all_day: false,
                description: String::new(),
                location: String::new(),
                guests: vec!["a@example.com".to_string()],
                send_invites: false,
            })
            .unwrap();
        assert!(!created.id().is_empty());
        let snapshot = calendar.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].guests, vec!["a@example.com".to_string()]);
    }

    #[test]
    fn test_deleted_events_disappear_from_listing_and_snapshot() {
        let calendar = MemoryCalendar::from_records(vec![record("a", 10)]);
        let events = calendar.list_events(&window_2024()).unwrap();
        events[0].delete().unwrap();
        assert!(calendar.list_events(&window_2024()).unwrap().is_empty());
        assert!(calendar.snapshot().is_empty());
        // Mutating a deleted event is a store error
        assert!(events[0].set_title("zombie").is_err());
    }

    #[test]
    fn test_add_guest_is_idempotent() {
        let calendar = MemoryCalendar::from_records(vec![record("a", 10)]);
        let events = calendar.list_events(&window_2024()).unwrap();
        events[0].add_guest("x@example.com").unwrap();
        events[0].add_guest("x@example.com").unwrap();
        assert_eq!(events[0].guest_emails(), vec!["x@example.com".to_string()]);
    }
}
