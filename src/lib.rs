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

//! Logdispatch turns log events into timestamped lines and fans them out to any number of
//! byte sinks.
//!
//! # Overview
//!
//! A [`LogEvent`] carries either literal text or a reference to a message template registered
//! with a [`Dispatcher`]. The dispatcher drops events whose [`Level`] is outside its
//! [`LevelMask`], formats the rest as `{timestamp} [{Level}] {message}`, optionally echoes them
//! to the console and the debug channel, then writes the encoded line to every registered
//! [`Sink`](sink::Sink) concurrently.
//!
//! Physical sink writes are serialized through an admission gate. By default the gate is
//! shared by every dispatcher in the process; see [`GateScope`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use logdispatch::Dispatcher;
//! use logdispatch::Level;
//! use logdispatch::LogEvent;
//! use logdispatch::sink::MemorySink;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = Arc::new(MemorySink::new());
//! let dispatcher = Dispatcher::new();
//! dispatcher
//!     .register_message("user.login", "{0} logged in from {1}")
//!     .unwrap()
//!     .add_sink(sink.clone());
//!
//! LogEvent::literal_with_level("service started", Level::Info)
//!     .dispatch(&dispatcher)
//!     .await
//!     .unwrap();
//! LogEvent::indexed("user.login", ["alice", "10.0.0.7"])
//!     .unwrap()
//!     .with_level(Level::Info)
//!     .dispatch(&dispatcher)
//!     .await
//!     .unwrap();
//!
//! let lines = sink.lines();
//! assert!(lines[0].ends_with("[Info] service started"));
//! assert!(lines[1].ends_with("[Info] alice logged in from 10.0.0.7"));
//! # });
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod console;
pub mod gate;
pub mod sink;

mod dispatcher;
mod encoding;
mod error;
mod event;
mod level;
mod message;

pub use colored::Color;

pub use self::config::DispatcherConfig;
pub use self::dispatcher::DEBUG_TARGET;
pub use self::dispatcher::Dispatcher;
pub use self::dispatcher::DispatcherBuilder;
pub use self::encoding::Encoding;
pub use self::error::Error;
pub use self::event::LogEvent;
pub use self::event::Message;
pub use self::gate::GateScope;
pub use self::level::Level;
pub use self::level::LevelMask;
pub use self::message::MessageKey;
pub use self::message::MessageRegistry;
pub use self::message::format_template;
