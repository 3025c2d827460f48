//! Per-run engine options.
//!
//! One immutable value built by the driver per invocation; the engine
//! never reads ambient state.

use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::throttle::ThrottleOptions;

/// How the all-day flag is determined for rows coming out of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllDayPolicy {
    /// Read the row's own "All Day" column (which must then exist).
    #[default]
    UseColumn,
    /// Every row is an all-day event; the column, if any, is ignored.
    AlwaysAllDay,
    /// No row is an all-day event; the column, if any, is ignored.
    NeverAllDay,
}

impl AllDayPolicy {
    /// Whether this policy requires an "All Day" column in the header.
    pub fn requires_column(self) -> bool {
        self == AllDayPolicy::UseColumn
    }
}

impl FromStr for AllDayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "use_column" => Ok(AllDayPolicy::UseColumn),
            "always" | "always_all_day" => Ok(AllDayPolicy::AlwaysAllDay),
            "never" | "never_all_day" => Ok(AllDayPolicy::NeverAllDay),
            other => Err(format!(
                "invalid all-day policy '{other}' (expected use-column, always, or never)"
            )),
        }
    }
}

/// Settings for one reconciliation run. Fixed for the run's duration.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// The single reference time zone all-day dates are expressed in,
    /// independent of wherever the process happens to run.
    pub timezone: Tz,
    pub all_day: AllDayPolicy,
    /// Send email invites to guests when an event is created.
    pub send_invites: bool,
    /// Silently skip rows whose start and end are both blank instead of
    /// reporting a validation error.
    pub skip_blank_rows: bool,
    pub throttle: ThrottleOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            timezone: Tz::UTC,
            all_day: AllDayPolicy::UseColumn,
            send_invites: false,
            skip_blank_rows: false,
            throttle: ThrottleOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_day_policy_from_str() {
        assert_eq!(
            "use-column".parse::<AllDayPolicy>(),
            Ok(AllDayPolicy::UseColumn)
        );
        assert_eq!("always".parse::<AllDayPolicy>(), Ok(AllDayPolicy::AlwaysAllDay));
        assert_eq!(
            "NEVER_ALL_DAY".parse::<AllDayPolicy>(),
            Ok(AllDayPolicy::NeverAllDay)
        );
        assert!("sometimes".parse::<AllDayPolicy>().is_err());
    }
}
