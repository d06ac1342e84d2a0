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

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use jiff::Zoned;

use crate::Error;
use crate::Level;
use crate::LogEvent;
use crate::Message;
use crate::MessageKey;
use crate::config::DispatcherConfig;
use crate::console::ConsoleLine;
use crate::gate::AdmissionGate;
use crate::gate::GateScope;
use crate::message::MessageRegistry;
use crate::sink::FileSink;
use crate::sink::Sink;
use crate::sink::SinkRegistry;

mod builder;

pub use self::builder::DispatcherBuilder;

/// The `log` target of the debug channel.
pub const DEBUG_TARGET: &str = "logdispatch::debug";

/// Filters, formats and fans out [`LogEvent`]s.
///
/// A dispatcher owns a registry of message templates, a registry of sinks and its
/// configuration. Every method takes `&self`, so a dispatcher is usually shared behind an
/// [`Arc`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use logdispatch::Dispatcher;
/// use logdispatch::Level;
/// use logdispatch::LevelMask;
/// use logdispatch::LogEvent;
/// use logdispatch::sink::MemorySink;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let sink = Arc::new(MemorySink::new());
/// let dispatcher = Dispatcher::builder()
///     .level(LevelMask::ERROR | LevelMask::WARN)
///     .message("greet", "Hello {0}")
///     .sink(sink.clone())
///     .build()
///     .unwrap();
///
/// LogEvent::indexed("greet", ["World"])
///     .unwrap()
///     .with_level(Level::Warn)
///     .dispatch(&dispatcher)
///     .await
///     .unwrap();
///
/// assert!(sink.text().ends_with("[Warn] Hello World\n"));
/// # });
/// ```
pub struct Dispatcher {
    config: ArcSwap<DispatcherConfig>,
    messages: MessageRegistry,
    sinks: SinkRegistry,
    gate: AdmissionGate,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config.load_full())
            .field("messages", &self.messages.len())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Dispatcher {
    /// A dispatcher with the default configuration, no templates and no sinks.
    pub fn new() -> Dispatcher {
        Dispatcher::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Dispatcher {
        Dispatcher {
            config: ArcSwap::from_pointee(config),
            messages: MessageRegistry::new(),
            sinks: SinkRegistry::new(),
            gate: AdmissionGate::new(),
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// The current configuration.
    pub fn config(&self) -> Arc<DispatcherConfig> {
        self.config.load_full()
    }

    /// Replace the configuration. Dispatches already in flight keep the one they started with.
    pub fn set_config(&self, config: DispatcherConfig) {
        self.config.store(Arc::new(config));
    }

    /// Update the configuration in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use logdispatch::Dispatcher;
    /// use logdispatch::LevelMask;
    ///
    /// let dispatcher = Dispatcher::new();
    /// dispatcher.update_config(|config| config.level = LevelMask::ERROR);
    /// assert_eq!(dispatcher.config().level, LevelMask::ERROR);
    /// ```
    pub fn update_config(&self, f: impl Fn(&mut DispatcherConfig)) {
        self.config.rcu(|current| {
            let mut config = DispatcherConfig::clone(current);
            f(&mut config);
            config
        });
    }

    pub fn messages(&self) -> &MessageRegistry {
        &self.messages
    }

    /// Register a message template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if `key` is already registered.
    pub fn register_message(
        &self,
        key: impl Into<MessageKey>,
        template: impl Into<String>,
    ) -> Result<&Self, Error> {
        self.messages.register(key, template)?;
        Ok(self)
    }

    /// Add a sink. Its writes pass through the gate chosen by the configured [`GateScope`].
    pub fn add_sink(&self, sink: Arc<dyn Sink>) -> &Self {
        let gate = match self.config.load().gate_scope {
            GateScope::Global => AdmissionGate::global(),
            GateScope::PerDispatcher => self.gate.clone(),
            GateScope::PerSink => AdmissionGate::new(),
        };
        self.sinks.add(sink, gate);
        self
    }

    /// Open `path` for appending and add it as a sink.
    pub fn add_file_sink(&self, path: impl AsRef<Path>) -> Result<&Self, Error> {
        let sink = FileSink::open(path)?;
        Ok(self.add_sink(Arc::new(sink)))
    }

    /// Remove every registration of `sink`.
    pub fn remove_sink<S: Sink + ?Sized>(&self, sink: &Arc<S>) -> &Self {
        self.sinks.remove(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Close every sink; failures are logged, never returned.
    pub async fn close_all(&self) {
        self.sinks.close_all().await;
    }

    /// Filter, format and write `event`.
    ///
    /// An event whose level is not in the configured mask is dropped without side effects.
    /// Otherwise the line `{timestamp} [{Level}] {message}\n` is written to the console and
    /// debug channel when enabled, then to every sink. The call completes once every sink
    /// write has finished.
    ///
    /// # Errors
    ///
    /// Template resolution errors ([`Error::KeyNotFound`], [`Error::Format`]) and timestamp
    /// errors are returned before anything is written. A failed sink write is returned as
    /// [`Error::Io`] after the other sinks finished.
    pub async fn dispatch(&self, event: LogEvent) -> Result<(), Error> {
        let config = self.config.load_full();
        let level = event.level();
        if !config.level.accepts(level) {
            return Ok(());
        }

        let message = self.resolve(event.message())?;
        let timestamp = config.format_time(&Zoned::now())?;
        let line = format_line(&timestamp, level, &message);

        if config.console || event.console_enabled() {
            let console = ConsoleLine {
                timestamp: &timestamp,
                timestamp_color: config.time_color,
                level,
                level_color: config.level_colors.color(level),
                message: &message,
                message_color: event.console_color(),
                no_color: config.no_color,
            };
            if let Err(err) = console.write() {
                log::warn!("failed to write log line to console: {err}");
            }
        }

        if config.debug || event.debug_enabled() {
            log::debug!(target: DEBUG_TARGET, "{}", line.trim_end());
        }

        let bytes = config.encoding.encode(&line);
        self.sinks.write_all(&bytes, config.write_timeout).await?;
        Ok(())
    }

    /// Format the template under `key` and write it to every sink as-is, without level
    /// filtering, timestamp or line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] or [`Error::Format`] before anything is written, or
    /// [`Error::Io`] if a sink write failed.
    pub async fn write_indexed<S: AsRef<str>>(
        &self,
        key: impl Into<MessageKey>,
        args: &[S],
    ) -> Result<(), Error> {
        let message = self.messages.resolve(&key.into(), args)?;
        self.write_raw(&message).await
    }

    /// Write `text` to every sink as-is, without level filtering, timestamp or line terminator.
    pub async fn write_raw(&self, text: &str) -> Result<(), Error> {
        let config = self.config.load_full();
        let bytes = config.encoding.encode(text);
        self.sinks.write_all(&bytes, config.write_timeout).await?;
        Ok(())
    }

    fn resolve<'a>(&self, message: &'a Message) -> Result<Cow<'a, str>, Error> {
        match message {
            Message::Literal(text) => Ok(Cow::Borrowed(text)),
            Message::Indexed { key, args } => self.messages.resolve(key, args).map(Cow::Owned),
        }
    }
}

/// `{timestamp} [{Level}] {message}\n`
pub(crate) fn format_line(timestamp: &str, level: Level, message: &str) -> String {
    format!("{timestamp} [{level}] {message}\n")
}
