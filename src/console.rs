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

//! Colored console output.

use std::io;
use std::io::Write;

use colored::Color;
use colored::ColoredString;
use colored::Colorize;

use crate::Level;

/// Colors for different log levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelColor {
    /// Color for fatal level logs.
    pub fatal: Color,
    /// Color for error level logs.
    pub error: Color,
    /// Color for warning level logs.
    pub warn: Color,
    /// Color for info level logs.
    pub info: Color,
    /// Color for debug level logs.
    pub debug: Color,
    /// Color for trace level logs.
    pub trace: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            fatal: Color::Red,
            error: Color::BrightRed,
            warn: Color::BrightYellow,
            info: Color::BrightCyan,
            debug: Color::BrightBlack,
            trace: Color::BrightWhite,
        }
    }
}

impl LevelColor {
    pub fn color(&self, level: Level) -> Color {
        match level {
            Level::Fatal => self.fatal,
            Level::Error => self.error,
            Level::Warn => self.warn,
            Level::Info => self.info,
            Level::Debug => self.debug,
            Level::Trace => self.trace,
        }
    }
}

/// One console line, split into its colored segments.
#[derive(Debug)]
pub(crate) struct ConsoleLine<'a> {
    pub timestamp: &'a str,
    pub timestamp_color: Color,
    pub level: Level,
    pub level_color: Color,
    pub message: &'a str,
    pub message_color: Option<Color>,
    pub no_color: bool,
}

impl ConsoleLine<'_> {
    pub(crate) fn render(&self) -> String {
        if self.no_color {
            return format!("{} [{}] {}\n", self.timestamp, self.level, self.message);
        }
        let timestamp = self.timestamp.color(self.timestamp_color);
        let level = ColoredString::from(format!(" [{}] ", self.level)).color(self.level_color);
        match self.message_color {
            Some(color) => format!("{timestamp}{level}{}\n", self.message.color(color)),
            None => format!("{timestamp}{level}{}\n", self.message),
        }
    }

    /// Write the line to stdout while holding the stdout lock.
    pub(crate) fn write(&self) -> io::Result<()> {
        let rendered = self.render();
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_colors_are_distinct() {
        let colors = LevelColor::default();
        for (i, a) in Level::ALL.into_iter().enumerate() {
            for b in Level::ALL.into_iter().skip(i + 1) {
                assert_ne!(colors.color(a), colors.color(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn render_keeps_segments_intact() {
        let line = ConsoleLine {
            timestamp: "1/2/2024 3:04:05 PM",
            timestamp_color: Color::White,
            level: Level::Warn,
            level_color: LevelColor::default().warn,
            message: "disk almost full",
            message_color: Some(Color::Magenta),
            no_color: false,
        };
        let rendered = line.render();
        assert!(rendered.contains("1/2/2024 3:04:05 PM"));
        assert!(rendered.contains(" [Warn] "));
        assert!(rendered.contains("disk almost full"));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn render_without_color_is_plain_text() {
        let line = ConsoleLine {
            timestamp: "T",
            timestamp_color: Color::White,
            level: Level::Warn,
            level_color: LevelColor::default().warn,
            message: "msg",
            message_color: Some(Color::Magenta),
            no_color: true,
        };
        assert_eq!(line.render(), "T [Warn] msg\n");
    }
}
