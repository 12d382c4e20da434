//! Duration values in module files
//!
//! Supports plain seconds (`300`) and humantime strings (`"5m"`, `"2 hours"`).

use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Duration read from a module file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

/// Parse a human-readable duration.
///
/// # Examples
/// ```
/// use simplesign::modules::duration::parse_duration;
///
/// assert_eq!(parse_duration("5m").unwrap().as_secs(), 300);
/// assert_eq!(parse_duration("90").unwrap().as_secs(), 90);
/// assert_eq!(parse_duration("2 hours").unwrap().as_secs(), 7200);
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(trimmed).map_err(|e| format!("Invalid duration '{}': {}", input, e))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Seconds(secs) => Ok(HumanDuration(Duration::from_secs(secs))),
            RawDuration::Text(text) => parse_duration(&text)
                .map(HumanDuration)
                .map_err(serde::de::Error::custom),
        }
    }
}
