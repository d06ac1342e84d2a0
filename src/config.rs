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

//! Dispatcher configuration.

use std::time::Duration;

use colored::Color;
use jiff::Zoned;
use jiff::tz::TimeZone;
use serde::Deserialize;
use serde::Serialize;

use crate::Encoding;
use crate::Error;
use crate::LevelMask;
use crate::console::LevelColor;
use crate::gate::GateScope;

/// Short date plus long time, e.g. `3/14/2024 9:26:53 PM`.
pub const DEFAULT_TIME_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

const ENV_LEVEL: &str = "LOGDISPATCH_LEVEL";
const ENV_CONSOLE: &str = "LOGDISPATCH_CONSOLE";
const ENV_DEBUG: &str = "LOGDISPATCH_DEBUG";
const ENV_TIME_FORMAT: &str = "LOGDISPATCH_TIME_FORMAT";
const ENV_NO_COLOR: &str = "LOGDISPATCH_NO_COLOR";

/// Everything that shapes how a [`Dispatcher`](crate::Dispatcher) filters and formats.
///
/// Colors and the time zone are runtime-only and are skipped by serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Encoding of the bytes written to sinks.
    pub encoding: Encoding,
    /// Severities that pass the filter.
    pub level: LevelMask,
    /// A `strftime`-style pattern for the line timestamp.
    pub time_format: String,
    /// Render timestamps in this zone instead of the system one.
    #[serde(skip)]
    pub time_zone: Option<TimeZone>,
    /// Console color of the timestamp segment.
    #[serde(skip, default = "default_time_color")]
    pub time_color: Color,
    /// Console color of the `[Level]` segment.
    #[serde(skip)]
    pub level_colors: LevelColor,
    /// Write every event to the console.
    pub console: bool,
    /// Write console lines as plain text without color codes.
    pub no_color: bool,
    /// Write every event to the debug channel.
    pub debug: bool,
    /// How widely sink writes are serialized. Applies to sinks added afterwards.
    pub gate_scope: GateScope,
    /// Fail a sink write that takes longer than this. `None` waits forever.
    pub write_timeout: Option<Duration>,
}

fn default_time_color() -> Color {
    Color::White
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            encoding: Encoding::default(),
            level: LevelMask::ALL,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            time_zone: None,
            time_color: default_time_color(),
            level_colors: LevelColor::default(),
            console: false,
            no_color: false,
            debug: false,
            gate_scope: GateScope::default(),
            write_timeout: None,
        }
    }
}

impl DispatcherConfig {
    /// The default configuration with environment overrides applied.
    ///
    /// Reads `LOGDISPATCH_LEVEL`, `LOGDISPATCH_CONSOLE`, `LOGDISPATCH_NO_COLOR`,
    /// `LOGDISPATCH_DEBUG` and `LOGDISPATCH_TIME_FORMAT`. Unparsable values are logged and ignored.
    pub fn from_env() -> DispatcherConfig {
        DispatcherConfig::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> DispatcherConfig {
        if let Some(level) = LevelMask::from_env(ENV_LEVEL) {
            self.level = level;
        }
        if let Some(console) = env_flag(ENV_CONSOLE) {
            self.console = console;
        }
        if let Some(no_color) = env_flag(ENV_NO_COLOR) {
            self.no_color = no_color;
        }
        if let Some(debug) = env_flag(ENV_DEBUG) {
            self.debug = debug;
        }
        if let Ok(format) = std::env::var(ENV_TIME_FORMAT) {
            self.time_format = format;
        }
        self
    }

    /// Render `now` with the configured pattern and zone.
    pub fn format_time(&self, now: &Zoned) -> Result<String, Error> {
        let now = match &self.time_zone {
            Some(tz) => now.with_time_zone(tz.clone()),
            None => now.clone(),
        };
        Ok(jiff::fmt::strtime::format(&self.time_format, &now)?)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("ignoring {name}: {}", Error::parse("flag", value));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.level, LevelMask::ALL);
        assert_eq!(config.encoding, Encoding::Utf8);
        assert_eq!(config.gate_scope, GateScope::Global);
        assert!(!config.console);
        assert!(!config.no_color);
        assert!(!config.debug);
        assert!(config.write_timeout.is_none());
    }

    #[test]
    fn default_time_format() {
        let now = date(2024, 3, 4)
            .at(21, 6, 5, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        let config = DispatcherConfig::default();
        assert_eq!(config.format_time(&now).unwrap(), "3/4/2024 9:06:05 PM");
    }

    #[test]
    fn time_zone_override() {
        let now = date(2024, 3, 4)
            .at(21, 6, 5, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        let config = DispatcherConfig {
            time_format: "%H:%M %z".to_string(),
            time_zone: Some(TimeZone::fixed(jiff::tz::offset(2))),
            ..DispatcherConfig::default()
        };
        assert_eq!(config.format_time(&now).unwrap(), "23:06 +0200");
    }

    #[test]
    fn deserialize_partial() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{ "level": "Error|Info", "console": true, "no_color": true, "encoding": "utf-16le" }"#)
                .unwrap();
        assert_eq!(config.level, LevelMask::ERROR | LevelMask::INFO);
        assert!(config.console);
        assert!(config.no_color);
        assert_eq!(config.encoding, Encoding::Utf16Le);
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(config.time_color, Color::White);
    }
}
