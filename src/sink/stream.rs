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
use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::fs::File;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::sink::Sink;

/// A sink writing to a file opened in append mode.
pub type FileSink = StreamSink<File>;

/// A sink over any asynchronous byte stream.
///
/// Every write is flushed before it completes. Once closed, the stream is shut down and
/// dropped, and the sink stops accepting writes.
pub struct StreamSink<W> {
    name: Cow<'static, str>,
    writable: AtomicBool,
    stream: Mutex<Option<W>>,
}

impl<W> StreamSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: W) -> StreamSink<W> {
        StreamSink::with_name("stream", stream)
    }

    /// Create a sink with a name that shows up in diagnostics.
    pub fn with_name(name: impl Into<Cow<'static, str>>, stream: W) -> StreamSink<W> {
        StreamSink {
            name: name.into(),
            writable: AtomicBool::new(true),
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take the stream back out of the sink, leaving it closed.
    pub fn into_inner(self) -> Option<W> {
        self.writable.store(false, Ordering::Release);
        self.stream.into_inner()
    }
}

impl StreamSink<File> {
    /// Open `path` for appending, creating the file if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<FileSink> {
        let path = path.as_ref();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(StreamSink::with_name(
            path.display().to_string(),
            File::from_std(file),
        ))
    }
}

impl<W> fmt::Debug for StreamSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("name", &self.name)
            .field("writable", &self.writable.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<W> Sink for StreamSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn is_writable(&self) -> bool {
        self.writable.load(Ordering::Acquire)
    }

    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut stream = self.stream.lock().await;
        // closed between the writability check and now
        let Some(stream) = stream.as_mut() else {
            return Ok(());
        };
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    async fn close(&self) -> io::Result<()> {
        self.writable.store(false, Ordering::Release);
        let stream = self.stream.lock().await.take();
        match stream {
            Some(mut stream) => stream.shutdown().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_through_and_closes() {
        let sink = StreamSink::with_name("buffer", Vec::<u8>::new());
        sink.write(b"one\n").await.unwrap();
        sink.write(b"two\n").await.unwrap();
        assert_eq!(sink.name(), "buffer");
        assert!(sink.is_writable());

        let bytes = sink.into_inner().unwrap();
        assert_eq!(bytes, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let sink = StreamSink::new(Vec::<u8>::new());
        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(!sink.is_writable());
        sink.write(b"ignored").await.unwrap();
        assert!(sink.into_inner().is_none());
    }

    #[tokio::test]
    async fn file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "existing\n").unwrap();

        let sink = FileSink::open(&path).unwrap();
        sink.write(b"appended\n").await.unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "existing\nappended\n");
    }
}
