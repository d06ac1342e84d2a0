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

//! The value describing one log occurrence.

use std::error::Error as StdError;
use std::fmt;

use colored::Color;
use serde::Serialize;

use crate::Dispatcher;
use crate::Error;
use crate::Level;
use crate::MessageKey;

mod finite;

/// The text of a [`LogEvent`]: either literal, or a reference to a registered template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The text is written as-is.
    Literal(String),
    /// The text is the template registered under `key`, formatted with `args`.
    Indexed { key: MessageKey, args: Vec<String> },
}

/// One occurrence to be recorded.
///
/// Events are built with a constructor plus chained `with_*` calls, then moved into a
/// [`Dispatcher`] with [`LogEvent::dispatch`] or [`Dispatcher::dispatch`].
///
/// # Examples
///
/// ```
/// use logdispatch::Level;
/// use logdispatch::LogEvent;
///
/// let event = LogEvent::literal("disk almost full")
///     .with_level(Level::Warn)
///     .with_console();
/// assert_eq!(event.level(), Level::Warn);
/// ```
#[derive(Debug, Clone)]
pub struct LogEvent {
    message: Message,
    level: Level,
    console: bool,
    console_color: Option<Color>,
    debug: bool,
}

impl LogEvent {
    fn new(message: Message) -> LogEvent {
        LogEvent {
            message,
            level: Level::default(),
            console: false,
            console_color: None,
            debug: false,
        }
    }

    /// A literal event at the default level ([`Level::Trace`]).
    pub fn literal(message: impl Into<String>) -> LogEvent {
        LogEvent::new(Message::Literal(message.into()))
    }

    /// A literal event at `level`.
    pub fn literal_with_level(message: impl Into<String>, level: Level) -> LogEvent {
        LogEvent::literal(message).with_level(level)
    }

    /// An [`Level::Error`] event describing `err`.
    ///
    /// With `include_trace`, every error in the `source()` chain is appended on its own
    /// `caused by:` line.
    pub fn from_error<E>(err: &E, include_trace: bool) -> LogEvent
    where
        E: StdError + ?Sized,
    {
        let mut text = err.to_string();
        if include_trace {
            let mut source = err.source();
            while let Some(cause) = source {
                text.push_str(&format!("\n    caused by: {cause}"));
                source = cause.source();
            }
        }
        LogEvent::literal_with_level(text, Level::Error)
    }

    /// A literal event holding the JSON rendering of `value`.
    ///
    /// If `value` cannot be serialized, its [`Debug`](fmt::Debug) text is used instead.
    pub fn from_value<T>(value: &T) -> LogEvent
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        LogEvent::literal(serialize_or_debug(value))
    }

    /// An event referring to the template registered under `key`.
    ///
    /// Every argument is serialized like [`LogEvent::from_value`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if `key` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use logdispatch::LogEvent;
    ///
    /// let event = LogEvent::indexed("user.login", ["alice"]).unwrap().with_arg(42);
    /// assert!(LogEvent::indexed("", [1, 2]).is_err());
    /// ```
    pub fn indexed<K, I>(key: K, args: I) -> Result<LogEvent, Error>
    where
        K: Into<MessageKey>,
        I: IntoIterator,
        I::Item: Serialize + fmt::Debug,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::Argument("message key must not be empty"));
        }

        let args = args
            .into_iter()
            .map(|arg| serialize_or_debug(&arg))
            .collect();
        Ok(LogEvent::new(Message::Indexed { key, args }))
    }

    /// An event referring to the template registered under `key`, without arguments.
    pub fn template(key: impl Into<MessageKey>) -> Result<LogEvent, Error> {
        LogEvent::indexed(key, std::iter::empty::<&str>())
    }

    /// Append one more template argument.
    ///
    /// Literal events have no arguments; the value is ignored for them.
    pub fn with_arg<T>(mut self, value: T) -> LogEvent
    where
        T: Serialize + fmt::Debug,
    {
        if let Message::Indexed { args, .. } = &mut self.message {
            args.push(serialize_or_debug(&value));
        }
        self
    }

    pub fn with_level(mut self, level: Level) -> LogEvent {
        self.level = level;
        self
    }

    /// Also write this event to the console.
    pub fn with_console(mut self) -> LogEvent {
        self.console = true;
        self
    }

    /// Also write this event to the console, with the message in `color`.
    pub fn with_console_color(mut self, color: Color) -> LogEvent {
        self.console = true;
        self.console_color = Some(color);
        self
    }

    /// Also write this event to the debug channel.
    pub fn with_debug(mut self) -> LogEvent {
        self.debug = true;
        self
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn console_enabled(&self) -> bool {
        self.console
    }

    pub fn console_color(&self) -> Option<Color> {
        self.console_color
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Hand this event to `dispatcher`. See [`Dispatcher::dispatch`].
    pub async fn dispatch(self, dispatcher: &Dispatcher) -> Result<(), Error> {
        dispatcher.dispatch(self).await
    }
}

// Strings are kept verbatim rather than quoted.
pub(crate) fn serialize_or_debug<T>(value: &T) -> String
where
    T: Serialize + fmt::Debug + ?Sized,
{
    let rendered = finite::check(value).and_then(|()| serde_json::to_string_pretty(value));
    match rendered {
        Ok(json) if json.starts_with('"') => serde_json::from_str(&json).unwrap_or(json),
        Ok(json) => json,
        Err(err) => {
            log::warn!("failed to serialize log value, falling back to its debug text: {err}");
            format!("{value:?}")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use super::*;

    #[test]
    fn literal_defaults() {
        let event = LogEvent::literal("hello");
        assert_eq!(event.message(), &Message::Literal("hello".to_string()));
        assert_eq!(event.level(), Level::Trace);
        assert!(!event.console_enabled());
        assert!(!event.debug_enabled());
        assert_eq!(event.console_color(), None);
    }

    #[test]
    fn fluent_mutators() {
        let event = LogEvent::literal_with_level("hello", Level::Info)
            .with_console_color(Color::Green)
            .with_debug();
        assert_eq!(event.level(), Level::Info);
        assert!(event.console_enabled());
        assert_eq!(event.console_color(), Some(Color::Green));
        assert!(event.debug_enabled());
    }

    #[test]
    fn value_is_rendered_as_json() {
        let mut value = BTreeMap::new();
        value.insert("id", 7);
        let event = LogEvent::from_value(&value);
        assert_eq!(
            event.message(),
            &Message::Literal("{\n  \"id\": 7\n}".to_string())
        );
    }

    #[test]
    fn unserializable_value_falls_back_to_debug() {
        // JSON object keys must be strings
        let mut value = BTreeMap::new();
        value.insert((1, 2), "pair");
        let event = LogEvent::from_value(&value);
        assert_eq!(event.message(), &Message::Literal(format!("{value:?}")));
    }

    #[derive(Debug, Serialize)]
    struct User {
        name: &'static str,
        age: u32,
        zone: &'static str,
        active: bool,
    }

    #[test]
    fn struct_fields_keep_declared_order() {
        let user = User {
            name: "alice",
            age: 30,
            zone: "eu",
            active: true,
        };
        let event = LogEvent::from_value(&user);
        assert_eq!(
            event.message(),
            &Message::Literal(
                "{\n  \"name\": \"alice\",\n  \"age\": 30,\n  \"zone\": \"eu\",\n  \"active\": true\n}"
                    .to_string()
            )
        );
    }

    #[test]
    fn non_finite_floats_fall_back_to_debug() {
        let event = LogEvent::from_value(&f64::NAN);
        assert_eq!(event.message(), &Message::Literal("NaN".to_string()));

        let event = LogEvent::indexed("ratio", [1.5, f64::INFINITY]).unwrap();
        let Message::Indexed { args, .. } = event.message() else {
            panic!("expected an indexed message");
        };
        assert_eq!(args, &["1.5", "inf"]);
    }

    #[test]
    fn strings_with_escapes_are_unquoted() {
        let event = LogEvent::from_value("say \"hi\"\n");
        assert_eq!(event.message(), &Message::Literal("say \"hi\"\n".to_string()));
    }

    #[test]
    fn indexed_arguments_are_serialized() {
        let event = LogEvent::indexed("greet", ["World"])
            .unwrap()
            .with_arg(3)
            .with_arg(vec![1, 2]);
        let Message::Indexed { key, args } = event.message() else {
            panic!("expected an indexed message");
        };
        assert_eq!(key.as_str(), "greet");
        assert_eq!(args, &["World", "3", "[\n  1,\n  2\n]"]);
    }

    #[test]
    fn indexed_requires_key() {
        let err = LogEvent::indexed("", ["x"]).unwrap_err();
        assert!(matches!(err, Error::Argument(_)));
        assert!(LogEvent::template(String::new()).is_err());
    }

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failed to load settings")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn error_event() {
        let err = Outer(io::Error::new(io::ErrorKind::NotFound, "settings.json missing"));

        let event = LogEvent::from_error(&err, true);
        assert_eq!(event.level(), Level::Error);
        assert_eq!(
            event.message(),
            &Message::Literal(
                "failed to load settings\n    caused by: settings.json missing".to_string()
            )
        );

        let event = LogEvent::from_error(&err, false);
        assert_eq!(
            event.message(),
            &Message::Literal("failed to load settings".to_string())
        );
    }
}
