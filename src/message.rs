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

//! Keyed message templates.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::fmt::Write;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Error;

/// The key a message template is registered under.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey(Cow<'static, str>);

impl MessageKey {
    /// Create a key from a static string.
    pub const fn new_static(key: &'static str) -> MessageKey {
        MessageKey(Cow::Borrowed(key))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for MessageKey {
    fn from(key: &'static str) -> Self {
        MessageKey(Cow::Borrowed(key))
    }
}

impl From<String> for MessageKey {
    fn from(key: String) -> Self {
        MessageKey(Cow::Owned(key))
    }
}

impl From<&MessageKey> for MessageKey {
    fn from(key: &MessageKey) -> Self {
        key.clone()
    }
}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grow-only mapping from [`MessageKey`] to format templates.
///
/// Templates use positional placeholders: `{0}`, `{1,-8}` (padded to eight columns, left
/// aligned), `{2:x}` (the format text is accepted and ignored). Literal braces are written as
/// `{{` and `}}`.
#[derive(Debug, Default)]
pub struct MessageRegistry {
    templates: RwLock<HashMap<MessageKey, String>>,
}

impl MessageRegistry {
    pub fn new() -> MessageRegistry {
        MessageRegistry::default()
    }

    /// Register `template` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if `key` is already registered; the existing template is
    /// kept.
    pub fn register(
        &self,
        key: impl Into<MessageKey>,
        template: impl Into<String>,
    ) -> Result<(), Error> {
        let key = key.into();
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        match templates.entry(key) {
            Entry::Occupied(entry) => Err(Error::DuplicateKey(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(template.into());
                Ok(())
            }
        }
    }

    /// Format the template registered under `key` with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if nothing is registered under `key`, and
    /// [`Error::Format`] if the template is malformed or refers to a missing argument.
    pub fn resolve<S: AsRef<str>>(&self, key: &MessageKey, args: &[S]) -> Result<String, Error> {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        let template = templates
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))?;
        format_template(template, args)
    }

    /// The template registered under `key`, if any.
    pub fn template(&self, key: &MessageKey) -> Option<String> {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates.get(key).cloned()
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let templates = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Substitute `args` into the positional placeholders of `template`.
pub fn format_template<S: AsRef<str>>(template: &str, args: &[S]) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let start = pos + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some((_, '{')) | None => {
                            return Err(Error::format(format!(
                                "unclosed placeholder at offset {pos} in {template:?}"
                            )));
                        }
                        Some(_) => {}
                    }
                };

                let placeholder = Placeholder::parse(&template[start..end])?;
                let arg = args.get(placeholder.index).ok_or_else(|| {
                    Error::format(format!(
                        "placeholder {{{}}} refers past the {} supplied argument(s)",
                        placeholder.index,
                        args.len()
                    ))
                })?;
                placeholder.write(&mut out, arg.as_ref())?;
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(Error::format(format!(
                        "unmatched '}}' at offset {pos} in {template:?}"
                    )));
                }
                out.push('}');
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

const MAX_ALIGNMENT: usize = 1_000_000;

struct Placeholder {
    index: usize,
    alignment: isize,
}

impl Placeholder {
    // `index[,alignment][:format]`
    fn parse(spec: &str) -> Result<Placeholder, Error> {
        let head = spec.split_once(':').map_or(spec, |(head, _)| head);
        let (index, alignment) = match head.split_once(',') {
            Some((index, alignment)) => (index, Some(alignment)),
            None => (head, None),
        };

        let index = index
            .trim()
            .parse::<usize>()
            .map_err(|_| Error::format(format!("invalid placeholder index in {{{spec}}}")))?;
        let alignment = match alignment {
            Some(alignment) => alignment
                .trim()
                .parse::<isize>()
                .map_err(|_| Error::format(format!("invalid alignment in {{{spec}}}")))?,
            None => 0,
        };
        if alignment.unsigned_abs() >= MAX_ALIGNMENT {
            return Err(Error::format(format!(
                "alignment in {{{spec}}} must be below {MAX_ALIGNMENT}"
            )));
        }

        Ok(Placeholder { index, alignment })
    }

    fn write(&self, out: &mut String, arg: &str) -> Result<(), Error> {
        let width = self.alignment.unsigned_abs();
        let written = if self.alignment < 0 {
            write!(out, "{arg:<width$}")
        } else {
            write!(out, "{arg:>width$}")
        };
        written.map_err(|err| Error::format(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let registry = MessageRegistry::new();
        registry.register("greet", "Hello {0}").unwrap();
        let message = registry.resolve(&"greet".into(), &["World"]).unwrap();
        assert_eq!(message, "Hello World");
    }

    #[test]
    fn duplicate_key_keeps_first_template() {
        let registry = MessageRegistry::new();
        registry.register("greet", "Hello {0}").unwrap();
        let err = registry.register("greet", "Bye {0}").unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(ref key) if key.as_str() == "greet"));
        assert_eq!(
            registry.template(&"greet".into()).as_deref(),
            Some("Hello {0}")
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_key() {
        let registry = MessageRegistry::new();
        let err = registry.resolve::<&str>(&"missing".into(), &[]).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn too_few_arguments_is_a_format_error() {
        let registry = MessageRegistry::new();
        registry.register("pair", "{0} and {1}").unwrap();
        let err = registry.resolve(&"pair".into(), &["one"]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn placeholders_repeat_and_reorder() {
        let out = format_template("{1}-{0}-{1}", &["a", "b"]).unwrap();
        assert_eq!(out, "b-a-b");
    }

    #[test]
    fn escaped_braces() {
        let out = format_template("{{{0}}}", &["x"]).unwrap();
        assert_eq!(out, "{x}");
    }

    #[test]
    fn alignment_and_ignored_format() {
        assert_eq!(format_template("[{0,5}]", &["ab"]).unwrap(), "[   ab]");
        assert_eq!(format_template("[{0,-5}]", &["ab"]).unwrap(), "[ab   ]");
        assert_eq!(format_template("[{0:N2}]", &["ab"]).unwrap(), "[ab]");
    }

    #[test]
    fn alignment_is_bounded() {
        assert_eq!(format_template("{0,999999}", &["a"]).unwrap().len(), 999_999);
        for template in ["{0,1000000}", "{0,-1000000}", "{0,1000000000000}"] {
            let err = format_template(template, &["a"]).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "{template}");
        }
    }

    #[test]
    fn malformed_templates() {
        for template in ["{0", "0}", "{x}", "{0,y}", "{{0}", "{0{1}"] {
            let err = format_template(template, &["a", "b"]).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "{template}");
        }
    }
}
