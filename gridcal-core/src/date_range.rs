//! Date range bounding one sync run.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{SyncError, SyncResult};

/// Days synced in each direction when no explicit window is given.
const DEFAULT_SYNC_DAYS: i64 = 365;

/// The window of events a run considers.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for DateRange {
    /// Default range: ±DEFAULT_SYNC_DAYS from now
    fn default() -> Self {
        let now = Utc::now();
        DateRange {
            from: Some(now - Duration::days(DEFAULT_SYNC_DAYS)),
            to: Some(now + Duration::days(DEFAULT_SYNC_DAYS)),
        }
    }
}

impl DateRange {
    /// Parse window arguments into a DateRange.
    /// - `from`: "start" for unbounded, or YYYY-MM-DD
    /// - `to`: YYYY-MM-DD, defaults to +DEFAULT_SYNC_DAYS if not specified
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> SyncResult<Self> {
        let now = Utc::now();

        let from_dt = match from {
            Some("start") => None, // Unbounded past
            Some(s) => Some(parse_date_start(s)?),
            None => Some(now - Duration::days(DEFAULT_SYNC_DAYS)),
        };

        let to_dt = match to {
            Some(s) => Some(parse_date_end(s)?),
            None => Some(now + Duration::days(DEFAULT_SYNC_DAYS)),
        };

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    /// True when an event spanning `[start, end]` falls entirely outside
    /// this window: it starts after the window closes or ends before the
    /// window opens.
    pub fn excludes(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if let Some(to) = self.to {
            if start > to {
                return true;
            }
        }
        if let Some(from) = self.from {
            if end < from {
                return true;
            }
        }
        false
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !self.excludes(start, end)
    }
}

/// Parse YYYY-MM-DD as start of day in UTC
fn parse_date_start(s: &str) -> SyncResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| SyncError::Config(format!("invalid date '{s}' (expected YYYY-MM-DD)")))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

/// Parse YYYY-MM-DD as end of day in UTC
fn parse_date_end(s: &str) -> SyncResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| SyncError::Config(format!("invalid date '{s}' (expected YYYY-MM-DD)")))?;
    Ok(date.and_hms_opt(23, 59, 59).unwrap().and_utc())
}
