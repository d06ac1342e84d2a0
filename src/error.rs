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

use std::io;

use crate::message::MessageKey;

/// The error type of logdispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message template was registered under a key that already has one.
    #[error("message key already registered: {0}")]
    DuplicateKey(MessageKey),
    /// A message key was resolved without a registered template.
    #[error("message key not found: {0}")]
    KeyNotFound(MessageKey),
    /// An argument passed to an event constructor is invalid.
    #[error("invalid argument: {0}")]
    Argument(&'static str),
    /// A template could not be formatted with the supplied arguments.
    #[error("failed to format message: {0}")]
    Format(String),
    /// The timestamp could not be rendered with the configured pattern.
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] jiff::Error),
    /// A level, mask or configuration value could not be parsed.
    #[error("failed to parse {what}: {input:?}")]
    Parse { what: &'static str, input: String },
    /// A sink failed while writing.
    #[error("failed to perform IO action: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn parse(what: &'static str, input: impl Into<String>) -> Self {
        Error::Parse {
            what,
            input: input.into(),
        }
    }
}
