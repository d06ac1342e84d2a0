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

//! Kept in its own test binary: it installs the global `log` logger.

use std::sync::Mutex;

use log::Log;
use log::Metadata;
use log::Record;
use logdispatch::DEBUG_TARGET;
use logdispatch::Dispatcher;
use logdispatch::Level;
use logdispatch::LogEvent;

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

struct Capture;

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target() == DEBUG_TARGET
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            CAPTURED.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

#[tokio::test]
async fn debug_channel_receives_formatted_lines() {
    log::set_boxed_logger(Box::new(Capture)).unwrap();
    log::set_max_level(log::LevelFilter::Trace);

    let dispatcher = Dispatcher::builder().time_format("T").build().unwrap();

    LogEvent::literal_with_level("quiet", Level::Info)
        .dispatch(&dispatcher)
        .await
        .unwrap();
    LogEvent::literal_with_level("per event", Level::Info)
        .with_debug()
        .dispatch(&dispatcher)
        .await
        .unwrap();

    dispatcher.update_config(|config| config.debug = true);
    LogEvent::literal_with_level("always", Level::Warn)
        .dispatch(&dispatcher)
        .await
        .unwrap();

    let captured = CAPTURED.lock().unwrap().clone();
    assert_eq!(captured, ["T [Info] per event", "T [Warn] always"]);
}
