// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Severity levels and the masks a [`Dispatcher`](crate::Dispatcher) filters with.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::Error;

const DEFAULT_LEVEL_ENV: &str = "LOGDISPATCH_LEVEL";

bitflags::bitflags! {
    /// A set of severities.
    ///
    /// An event passes a dispatcher's filter when `mask.intersects(level.mask())`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LevelMask: u8 {
        const FATAL = 1;
        const ERROR = 1 << 1;
        const WARN = 1 << 2;
        const INFO = 1 << 3;
        const DEBUG = 1 << 4;
        const TRACE = 1 << 5;
    }
}

impl LevelMask {
    /// The mask that accepts nothing.
    pub const NONE: LevelMask = LevelMask::empty();
    /// The mask that accepts every severity.
    pub const ALL: LevelMask = LevelMask::all();

    /// Whether an event of `level` passes this mask.
    pub fn accepts(self, level: Level) -> bool {
        self.intersects(level.mask())
    }

    /// Read a mask from the environment variable `LOGDISPATCH_LEVEL`.
    ///
    /// Falls back to [`LevelMask::ALL`] if the variable is unset or unparsable.
    pub fn from_default_env() -> LevelMask {
        LevelMask::from_env_or(DEFAULT_LEVEL_ENV, LevelMask::ALL)
    }

    /// Read a mask from the given environment variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use logdispatch::LevelMask;
    ///
    /// let mask = LevelMask::from_env("MY_APP_LOG_LEVEL").unwrap_or(LevelMask::ERROR);
    /// ```
    pub fn from_env<'a>(name: impl Into<Cow<'a, str>>) -> Option<LevelMask> {
        let name = name.into();
        let value = std::env::var(&*name).ok()?;
        match value.parse() {
            Ok(mask) => Some(mask),
            Err(err) => {
                log::warn!("ignoring {name}: {err}");
                None
            }
        }
    }

    /// Read a mask from the given environment variable, or use `default`.
    pub fn from_env_or<'a>(name: impl Into<Cow<'a, str>>, default: LevelMask) -> LevelMask {
        LevelMask::from_env(name).unwrap_or(default)
    }
}

impl Default for LevelMask {
    fn default() -> Self {
        LevelMask::ALL
    }
}

impl From<Level> for LevelMask {
    fn from(level: Level) -> Self {
        level.mask()
    }
}

impl fmt::Display for LevelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        if self.is_all() {
            return f.write_str("All");
        }

        let mut first = true;
        for level in Level::ALL {
            if self.contains(level.mask()) {
                if !first {
                    f.write_str("|")?;
                }
                first = false;
                write!(f, "{level}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for LevelMask {
    type Err = Error;

    /// Parse names separated by `|` or `,`, e.g. `"Error|Info"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = LevelMask::NONE;
        for part in s.split(['|', ',']).map(str::trim) {
            if part.is_empty() {
                continue;
            }
            if part.eq_ignore_ascii_case("none") {
                continue;
            }
            if part.eq_ignore_ascii_case("all") {
                mask |= LevelMask::ALL;
                continue;
            }
            let level = part
                .parse::<Level>()
                .map_err(|_| Error::parse("level mask", s))?;
            mask |= level.mask();
        }
        Ok(mask)
    }
}

impl Serialize for LevelMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LevelMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Cow::<'de, str>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The severity of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    #[default]
    Trace,
}

impl Level {
    /// Every level, most severe first.
    pub const ALL: [Level; 6] = [
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    /// The single bit of this level.
    pub const fn mask(self) -> LevelMask {
        match self {
            Level::Fatal => LevelMask::FATAL,
            Level::Error => LevelMask::ERROR,
            Level::Warn => LevelMask::WARN,
            Level::Info => LevelMask::INFO,
            Level::Debug => LevelMask::DEBUG,
            Level::Trace => LevelMask::TRACE,
        }
    }

    /// The canonical name printed inside the `[...]` tag.
    pub const fn name(self) -> &'static str {
        match self {
            Level::Fatal => "Fatal",
            Level::Error => "Error",
            Level::Warn => "Warn",
            Level::Info => "Info",
            Level::Debug => "Debug",
            Level::Trace => "Trace",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::parse("level", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_union_of_every_level() {
        let union = Level::ALL
            .into_iter()
            .fold(LevelMask::NONE, |acc, level| acc | level.mask());
        assert_eq!(union, LevelMask::ALL);
        assert_eq!(LevelMask::ALL.bits(), 63);
    }

    #[test]
    fn none_accepts_nothing() {
        for level in Level::ALL {
            assert!(!LevelMask::NONE.accepts(level));
            assert!(LevelMask::ALL.accepts(level));
        }
    }

    #[test]
    fn mask_filters_by_intersection() {
        let mask = LevelMask::ERROR | LevelMask::INFO;
        assert_eq!(mask.bits(), 10);
        assert!(mask.accepts(Level::Error));
        assert!(mask.accepts(Level::Info));
        assert!(!mask.accepts(Level::Warn));
        assert!(!mask.accepts(Level::Trace));
    }

    #[test]
    fn default_level_is_trace() {
        assert_eq!(Level::default(), Level::Trace);
    }

    #[test]
    fn parse_and_display() {
        let mask: LevelMask = "error | Info".parse().unwrap();
        assert_eq!(mask, LevelMask::ERROR | LevelMask::INFO);
        assert_eq!(mask.to_string(), "Error|Info");

        assert_eq!("all".parse::<LevelMask>().unwrap(), LevelMask::ALL);
        assert_eq!("None".parse::<LevelMask>().unwrap(), LevelMask::NONE);
        assert_eq!(LevelMask::ALL.to_string(), "All");
        assert_eq!(LevelMask::NONE.to_string(), "None");

        assert!("Error|Verbose".parse::<LevelMask>().is_err());
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
    }
}
