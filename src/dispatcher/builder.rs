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

use std::sync::Arc;
use std::time::Duration;

use colored::Color;
use jiff::tz::TimeZone;

use super::Dispatcher;
use crate::Encoding;
use crate::Error;
use crate::LevelMask;
use crate::MessageKey;
use crate::config::DispatcherConfig;
use crate::console::LevelColor;
use crate::gate::GateScope;
use crate::sink::Sink;

/// A builder for configuring a [`Dispatcher`].
#[must_use = "call `build` to construct the dispatcher"]
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    messages: Vec<(MessageKey, String)>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl DispatcherBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Start from `config` instead of the default configuration.
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the severities that pass the filter.
    ///
    /// Default to [`LevelMask::ALL`].
    pub fn level(mut self, level: LevelMask) -> Self {
        self.config.level = level;
        self
    }

    /// Set the encoding of the bytes written to sinks.
    ///
    /// Default to [`Encoding::Utf8`].
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Set the `strftime`-style timestamp pattern.
    pub fn time_format(mut self, format: impl Into<String>) -> Self {
        self.config.time_format = format.into();
        self
    }

    pub fn time_zone(mut self, tz: TimeZone) -> Self {
        self.config.time_zone = Some(tz);
        self
    }

    pub fn time_color(mut self, color: Color) -> Self {
        self.config.time_color = color;
        self
    }

    pub fn level_colors(mut self, colors: LevelColor) -> Self {
        self.config.level_colors = colors;
        self
    }

    /// Write every event to the console.
    pub fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Write console lines without color codes.
    pub fn no_color(mut self, no_color: bool) -> Self {
        self.config.no_color = no_color;
        self
    }

    /// Write every event to the debug channel.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Set how widely sink writes are serialized.
    ///
    /// Default to [`GateScope::Global`].
    pub fn gate_scope(mut self, scope: GateScope) -> Self {
        self.config.gate_scope = scope;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = Some(timeout);
        self
    }

    /// Register a message template.
    pub fn message(mut self, key: impl Into<MessageKey>, template: impl Into<String>) -> Self {
        self.messages.push((key.into(), template.into()));
        self
    }

    /// Add a sink.
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if two templates share a key.
    pub fn build(self) -> Result<Dispatcher, Error> {
        let Self {
            config,
            messages,
            sinks,
        } = self;

        let dispatcher = Dispatcher::with_config(config);
        for (key, template) in messages {
            dispatcher.register_message(key, template)?;
        }
        for sink in sinks {
            dispatcher.add_sink(sink);
        }
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn builds_with_messages_and_sinks() {
        let dispatcher = DispatcherBuilder::new()
            .level(LevelMask::FATAL)
            .console(true)
            .no_color(true)
            .message("a", "{0}")
            .sink(Arc::new(MemorySink::new()))
            .build()
            .unwrap();
        assert_eq!(dispatcher.config().level, LevelMask::FATAL);
        assert!(dispatcher.config().console);
        assert!(dispatcher.config().no_color);
        assert_eq!(dispatcher.messages().len(), 1);
        assert_eq!(dispatcher.sink_count(), 1);
    }

    #[test]
    fn duplicate_message_fails_build() {
        let result = DispatcherBuilder::new()
            .message("a", "{0}")
            .message("a", "{1}")
            .build();
        assert!(matches!(result, Err(Error::DuplicateKey(_))));
    }
}
