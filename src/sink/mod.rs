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

//! Output destinations and the registry fanning lines out to them.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use futures::future::join_all;

use crate::gate::AdmissionGate;

mod memory;
mod stream;

pub use self::memory::MemorySink;
pub use self::stream::FileSink;
pub use self::stream::StreamSink;

/// A destination for encoded log lines.
///
/// Sinks are registered as `Arc<dyn Sink>`; the `Arc` identity is what
/// [`Dispatcher::remove_sink`](crate::Dispatcher::remove_sink) matches on.
#[async_trait::async_trait]
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Whether the sink currently accepts writes. Sinks that do not are skipped.
    fn is_writable(&self) -> bool;

    /// Write `bytes` in full.
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Close the sink. Afterwards it is no longer writable.
    async fn close(&self) -> io::Result<()>;
}

#[derive(Debug, Clone)]
struct SinkEntry {
    sink: Arc<dyn Sink>,
    gate: AdmissionGate,
}

impl SinkEntry {
    async fn write(&self, bytes: &[u8], timeout: Option<Duration>) -> io::Result<()> {
        let _permit = self.gate.admit().await?;

        if !self.sink.is_writable() {
            log::trace!("skipping sink that is not writable: {:?}", self.sink);
            return Ok(());
        }

        match timeout {
            None => self.sink.write(bytes).await,
            Some(timeout) => tokio::time::timeout(timeout, self.sink.write(bytes))
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("sink write did not complete within {timeout:?}"),
                    )
                })?,
        }
    }
}

/// An ordered collection of sinks.
#[derive(Debug, Default)]
pub struct SinkRegistry {
    entries: Mutex<Vec<SinkEntry>>,
}

impl SinkRegistry {
    pub fn new() -> SinkRegistry {
        SinkRegistry::default()
    }

    /// Append `sink`; every write to it passes through `gate`.
    pub fn add(&self, sink: Arc<dyn Sink>, gate: AdmissionGate) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(SinkEntry { sink, gate });
    }

    /// Remove every registration of `sink`. Returns how many were removed.
    pub fn remove<S: Sink + ?Sized>(&self, sink: &Arc<S>) -> usize {
        let target = Arc::as_ptr(sink).cast::<()>();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| Arc::as_ptr(&entry.sink).cast::<()>() != target);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<SinkEntry> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clone()
    }

    /// Write `bytes` to every sink registered at the time of the call.
    ///
    /// All writes run concurrently, each admitted through its gate. The call returns once
    /// every write has finished; the first write error, if any, is returned.
    pub async fn write_all(&self, bytes: &[u8], timeout: Option<Duration>) -> io::Result<()> {
        let entries = self.snapshot();
        let results = join_all(entries.iter().map(|entry| entry.write(bytes, timeout))).await;
        results.into_iter().collect()
    }

    /// Close every sink. Failures are logged and otherwise ignored.
    pub async fn close_all(&self) {
        for entry in self.snapshot() {
            if let Err(err) = entry.sink.close().await {
                log::warn!("failed to close sink {:?}: {err}", entry.sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenSink;

    #[async_trait::async_trait]
    impl Sink for BrokenSink {
        fn is_writable(&self) -> bool {
            true
        }

        async fn write(&self, _: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }

        async fn close(&self) -> io::Result<()> {
            Err(io::Error::other("already closed"))
        }
    }

    #[tokio::test]
    async fn fan_out_reaches_every_sink() {
        let registry = SinkRegistry::new();
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        registry.add(first.clone(), AdmissionGate::new());
        registry.add(second.clone(), AdmissionGate::new());

        registry.write_all(b"line\n", None).await.unwrap();
        assert_eq!(first.contents(), b"line\n");
        assert_eq!(second.contents(), b"line\n");
    }

    #[tokio::test]
    async fn remove_matches_identity() {
        let registry = SinkRegistry::new();
        let kept = Arc::new(MemorySink::new());
        let removed = Arc::new(MemorySink::new());
        registry.add(kept.clone(), AdmissionGate::new());
        registry.add(removed.clone(), AdmissionGate::new());
        registry.add(removed.clone(), AdmissionGate::new());

        assert_eq!(registry.remove(&removed), 2);
        assert_eq!(registry.len(), 1);

        registry.write_all(b"x", None).await.unwrap();
        assert_eq!(kept.contents(), b"x");
        assert!(removed.contents().is_empty());
    }

    #[tokio::test]
    async fn closed_sink_is_skipped() {
        let registry = SinkRegistry::new();
        let closed = Arc::new(MemorySink::new());
        let open = Arc::new(MemorySink::new());
        registry.add(closed.clone(), AdmissionGate::new());
        registry.add(open.clone(), AdmissionGate::new());

        closed.close().await.unwrap();
        registry.write_all(b"x", None).await.unwrap();
        assert!(closed.contents().is_empty());
        assert_eq!(open.contents(), b"x");
    }

    #[tokio::test]
    async fn write_failure_propagates_after_other_sinks() {
        let registry = SinkRegistry::new();
        let healthy = Arc::new(MemorySink::new());
        registry.add(Arc::new(BrokenSink), AdmissionGate::new());
        registry.add(healthy.clone(), AdmissionGate::new());

        let err = registry.write_all(b"x", None).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(healthy.contents(), b"x");
    }

    #[tokio::test]
    async fn close_all_ignores_failures() {
        let registry = SinkRegistry::new();
        let open = Arc::new(MemorySink::new());
        registry.add(Arc::new(BrokenSink), AdmissionGate::new());
        registry.add(open.clone(), AdmissionGate::new());

        registry.close_all().await;
        assert!(!open.is_writable());
    }
}
