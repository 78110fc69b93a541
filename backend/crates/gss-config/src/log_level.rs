//! Verbosity of the supervisor's own log output (`logging.level` / `GSS_LOG_LEVEL`).
//!
//! Never a startup error: anything unrecognised falls back to `info`.

use crate::DEFAULT_LOG_LEVEL;

use std::convert::Infallible;
use std::ops::Deref;
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Deserializer};

/// `log` level filter that parses leniently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);

impl Default for LogLevel {
    fn default() -> Self {
        Self(DEFAULT_LOG_LEVEL)
    }
}

impl FromStr for LogLevel {
    type Err = Infallible;

    /// Case-insensitive; `warning` is accepted for `warn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("warning") {
            return Ok(Self(LevelFilter::Warn));
        }
        Ok(LevelFilter::from_str(name).map(Self).unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // `level = 3` and friends degrade to the default too
        let Ok(raw) = String::deserialize(deserializer) else {
            return Ok(Self::default());
        };
        let Ok(level) = raw.parse();
        Ok(level)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

impl Deref for LogLevel {
    type Target = LevelFilter;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
