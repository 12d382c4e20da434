//! Active hours for a module
//!
//! Outside its schedule the sign is blanked and the loop idles.

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};
use serde::Deserialize;

/// Schedule as written in a module file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleSpec {
    /// Inclusive `[first, last]` hour of the day, 0-23
    pub hours: Option<[u32; 2]>,

    /// Day names accepted by chrono (`mon`, `Tuesday`, ...)
    pub weekdays: Option<Vec<String>>,
}

/// Validated schedule; no constraints means always active
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    hours: Option<(u32, u32)>,
    weekdays: Option<Vec<Weekday>>,
}

impl TryFrom<ScheduleSpec> for Schedule {
    type Error = String;

    fn try_from(spec: ScheduleSpec) -> Result<Self, Self::Error> {
        let hours = match spec.hours {
            Some([first, last]) => {
                if first > 23 || last > 23 {
                    return Err(format!("hours must be within 0-23, got [{}, {}]", first, last));
                }
                Some((first, last))
            }
            None => None,
        };

        let weekdays = match spec.weekdays {
            Some(names) => Some(
                names
                    .iter()
                    .map(|n| {
                        n.trim()
                            .parse::<Weekday>()
                            .map_err(|_| format!("unknown weekday '{}'", n))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(Self { hours, weekdays })
    }
}

impl Schedule {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn is_active(&self, now: &DateTime<Local>) -> bool {
        if let Some(days) = &self.weekdays {
            if !days.contains(&now.weekday()) {
                return false;
            }
        }

        match self.hours {
            // A range like [22, 6] wraps past midnight
            Some((first, last)) if first <= last => (first..=last).contains(&now.hour()),
            Some((first, last)) => now.hour() >= first || now.hour() <= last,
            None => true,
        }
    }
}
