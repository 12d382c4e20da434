//! Message and sequence records
//!
//! Attribute names (`ROTATE`, `RED`, `SPEED_1`, ...) are the upper-case names
//! the sign documentation uses. They are accepted case-insensitively and
//! rejected when unknown.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Duration used when a module returns nothing to display
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// Sequence validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("Unknown {kind} '{value}'")]
    UnknownAttribute { kind: &'static str, value: String },

    #[error("Duration must be a positive number of seconds, got {0}")]
    InvalidDuration(String),
}

macro_rules! named_attribute {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in documentation order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Upper-case name used in JSON, TOML and the web form
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = SequenceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| SequenceError::UnknownAttribute {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

named_attribute! {
    /// How the sign transitions a message onto the display
    Mode {
        Rotate => "ROTATE",
        Hold => "HOLD",
        Flash => "FLASH",
        RollUp => "ROLL_UP",
        RollDown => "ROLL_DOWN",
        RollLeft => "ROLL_LEFT",
        RollRight => "ROLL_RIGHT",
        WipeUp => "WIPE_UP",
        WipeDown => "WIPE_DOWN",
        WipeLeft => "WIPE_LEFT",
        WipeRight => "WIPE_RIGHT",
        Scroll => "SCROLL",
        AutoMode => "AUTOMODE",
        RollIn => "ROLL_IN",
        RollOut => "ROLL_OUT",
        WipeIn => "WIPE_IN",
        WipeOut => "WIPE_OUT",
        CompressedRotate => "COMPRESSED_ROTATE",
        Explode => "EXPLODE",
        Clock => "CLOCK",
        Twinkle => "TWINKLE",
        Sparkle => "SPARKLE",
        Snow => "SNOW",
        Interlock => "INTERLOCK",
        Switch => "SWITCH",
        Slide => "SLIDE",
        Spray => "SPRAY",
        Starburst => "STARBURST",
        Welcome => "WELCOME",
        SlotMachine => "SLOT_MACHINE",
    }
}

named_attribute! {
    /// Text color
    Color {
        Red => "RED",
        Green => "GREEN",
        Amber => "AMBER",
        DimRed => "DIM_RED",
        DimGreen => "DIM_GREEN",
        Brown => "BROWN",
        Orange => "ORANGE",
        Yellow => "YELLOW",
        Rainbow1 => "RAINBOW_1",
        Rainbow2 => "RAINBOW_2",
        ColorMix => "COLOR_MIX",
        AutoColor => "AUTOCOLOR",
    }
}

named_attribute! {
    /// Transition speed, `SPEED_1` is the slowest
    Speed {
        Speed1 => "SPEED_1",
        Speed2 => "SPEED_2",
        Speed3 => "SPEED_3",
        Speed4 => "SPEED_4",
        Speed5 => "SPEED_5",
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Rotate
    }
}

/// A single message shown in one text file of the sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<Speed>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: None,
            color: None,
            speed: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Mode the sign should use, `ROTATE` unless the message says otherwise
    pub fn effective_mode(&self) -> Mode {
        self.mode.unwrap_or_default()
    }
}

/// A duration plus an ordered list of messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Seconds to leave the sequence on the sign
    #[serde(deserialize_with = "deserialize_duration")]
    pub duration: u32,

    pub messages: Vec<Message>,
}

impl Sequence {
    /// Build a sequence, rejecting a zero duration
    pub fn new(duration: u32, messages: Vec<Message>) -> Result<Self, SequenceError> {
        if duration == 0 {
            return Err(SequenceError::InvalidDuration(duration.to_string()));
        }
        Ok(Self { duration, messages })
    }

    /// Nothing to show for the default duration
    pub fn empty() -> Self {
        Self {
            duration: DEFAULT_DURATION_SECS,
            messages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }
}

/// Parse a duration given either as an integer or a numeric string.
pub fn parse_duration_secs(raw: &str) -> Result<u32, SequenceError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(secs) => positive_secs(secs),
        Err(_) => Err(SequenceError::InvalidDuration(raw.to_string())),
    }
}

fn positive_secs(secs: i64) -> Result<u32, SequenceError> {
    if secs <= 0 || secs > i64::from(u32::MAX) {
        return Err(SequenceError::InvalidDuration(secs.to_string()));
    }
    Ok(secs as u32)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(i64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => positive_secs(secs),
        RawDuration::Text(text) => parse_duration_secs(&text),
    };
    parsed.map_err(serde::de::Error::custom)
}
