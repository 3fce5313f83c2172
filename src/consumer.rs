//! The consumer: a background worker that follows a rotated log.
//!
//! The worker opens the file for the current schedule slot, emits every
//! complete line into a bounded queue and, once caught up, asks the change
//! detector what happened next. Growth keeps it on the same file, truncation
//! reopens the same file from the start, and a successor file moves the
//! schedule cursor forward.

use crate::detector::{ChangeDetector, DEFAULT_POLL_INTERVAL, WatchTarget};
use crate::error::{Error, Result};
use crate::events::Change;
use crate::logger::{Logger, TracingLogger};
use crate::naming::{DateTimeLayout, NamingScheme, RotationSchedule, Slot};
use crate::reader::{LineReader, ReadOutcome};
use chrono::{Local, NaiveDateTime};
use futures::Stream;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A resumable read point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekPosition {
    pub path: PathBuf,
    pub offset: u64,
}

impl SeekPosition {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// One item of consumer output.
///
/// A line carrying an error is the last item the consumer ever produces.
#[derive(Debug)]
pub struct LogLine {
    pub text: String,
    pub error: Option<Error>,
    pub source_file: PathBuf,
    /// Offset just past this line in `source_file`.
    pub end_offset: u64,
}

impl LogLine {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Where to resume so that the next line after this one is read first.
    pub fn resume_position(&self) -> SeekPosition {
        SeekPosition::new(self.source_file.clone(), self.end_offset)
    }
}

/// Construction parameters for a [`Consumer`].
#[derive(Clone)]
pub struct Config {
    /// Resume point. Defaults to the start of the current schedule slot.
    pub location: Option<SeekPosition>,
    /// Required naming layout.
    pub layout: Option<DateTimeLayout>,
    /// Sink for lifecycle messages. Defaults to [`TracingLogger`].
    pub logger: Option<Arc<dyn Logger>>,
    pub poll_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: None,
            layout: None,
            logger: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    pub fn new(layout: DateTimeLayout) -> Self {
        Self {
            layout: Some(layout),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: SeekPosition) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("location", &self.location)
            .field("layout", &self.layout)
            .field("logger", &self.logger.as_ref().map(|_| "<dyn Logger>"))
            .field("poll_interval", &self.poll_interval)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

/// State shared between the consumer handle and its worker.
#[derive(Default)]
struct Shared {
    position: Mutex<Option<SeekPosition>>,
    cancel: CancellationToken,
}

impl Shared {
    fn set_position(&self, position: Option<SeekPosition>) {
        let mut current = self.position.lock();
        if !self.cancel.is_cancelled() {
            *current = position;
        }
    }
}

/// Follows a rotated log and yields its lines as a stream.
pub struct Consumer {
    receiver: mpsc::Receiver<LogLine>,
    shared: Arc<Shared>,
    schedule: RotationSchedule,
    logger: Arc<dyn Logger>,
    _task_handle: JoinHandle<()>,
}

impl Consumer {
    /// Validates `config` and starts the background worker.
    ///
    /// Configuration and naming problems are reported here; everything that
    /// goes wrong later arrives as a terminal error line.
    pub async fn new(config: Config) -> Result<Self> {
        let layout = config.layout.ok_or_else(|| Error::Config {
            message: "missing date-time layout".to_string(),
        })?;
        if config.queue_capacity == 0 {
            return Err(Error::Config {
                message: "queue capacity must be positive".to_string(),
            });
        }

        let logger = config
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>);
        let scheme = NamingScheme::new(layout)?;

        let location = config
            .location
            .unwrap_or_else(|| SeekPosition::new(scheme.format(Local::now().naive_local()), 0));
        let cursor = scheme.parse(&location.path)?;
        let granularity = scheme.infer_granularity(&location.path)?;
        let schedule = RotationSchedule::new(scheme, granularity);

        logger.info(&format!(
            "following '{}' in {} ({:?}) from {} at offset {}",
            schedule.scheme().layout().pattern,
            schedule.scheme().layout().directory.display(),
            granularity,
            location.path.display(),
            location.offset
        ));

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let shared = Arc::new(Shared::default());
        let start = schedule.slot(cursor);

        let worker = Worker {
            detector: ChangeDetector::new(schedule.clone(), config.poll_interval),
            schedule: schedule.clone(),
            cursor,
            source: start.path.clone(),
            tx,
            shared: shared.clone(),
            logger: logger.clone(),
        };
        let task_handle = tokio::spawn(worker.run(State::Opening {
            slot: start,
            seek: location.offset,
        }));

        Ok(Consumer {
            receiver: rx,
            shared,
            schedule,
            logger,
            _task_handle: task_handle,
        })
    }

    /// Current read position, or `None` when no file is open.
    ///
    /// The offset is the start of the next line the worker has not yet
    /// handed to the queue.
    pub fn tell(&self) -> Option<SeekPosition> {
        self.shared.position.lock().clone()
    }

    /// Stops the worker and releases its file. Safe to call repeatedly.
    pub fn close(&self) {
        let first = {
            let mut position = self.shared.position.lock();
            let first = !self.shared.cancel.is_cancelled();
            self.shared.cancel.cancel();
            *position = None;
            first
        };

        if first {
            self.logger.debug("closing consumer");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    pub fn schedule(&self) -> &RotationSchedule {
        &self.schedule
    }

    /// Next line, or `None` once the worker has stopped and the queue is empty.
    pub async fn next_line(&mut self) -> Option<LogLine> {
        self.receiver.recv().await
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.close();
    }
}

impl Stream for Consumer {
    type Item = LogLine;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// The open file together with its reader.
struct ActiveFile {
    path: PathBuf,
    reader: LineReader,
}

enum State {
    Opening { slot: Slot, seek: u64 },
    Streaming(ActiveFile),
    Resolving(ActiveFile),
    Switching { from: ActiveFile, to: Slot },
    Closed,
}

/// Sole owner of the cursor and the open file.
struct Worker {
    schedule: RotationSchedule,
    detector: ChangeDetector,
    cursor: NaiveDateTime,
    source: PathBuf,
    tx: mpsc::Sender<LogLine>,
    shared: Arc<Shared>,
    logger: Arc<dyn Logger>,
}

impl Worker {
    async fn run(mut self, mut state: State) {
        loop {
            let next = match state {
                State::Opening { slot, seek } => self.open(slot, seek).await,
                State::Streaming(active) => self.stream(active).await,
                State::Resolving(active) => self.resolve(active).await,
                State::Switching { from, to } => Ok(self.switch(from, to).await),
                State::Closed => break,
            };

            match next {
                Ok(next) => state = next,
                Err(e) => {
                    self.fail(e).await;
                    break;
                }
            }
        }

        self.shared.set_position(None);
    }

    async fn open(&mut self, slot: Slot, seek: u64) -> Result<State> {
        if self.shared.cancel.is_cancelled() {
            return Ok(State::Closed);
        }

        self.source = slot.path.clone();
        let reader = LineReader::open_at(&slot.path, seek).await?;
        self.logger
            .info(&format!("opened {} at offset {}", slot.path.display(), seek));

        self.shared
            .set_position(Some(SeekPosition::new(slot.path.clone(), seek)));
        Ok(State::Streaming(ActiveFile {
            path: slot.path,
            reader,
        }))
    }

    async fn stream(&mut self, mut active: ActiveFile) -> Result<State> {
        loop {
            match active.reader.next_line().await? {
                ReadOutcome::Line(text) => {
                    let end_offset = active.reader.offset();
                    let line = LogLine {
                        text,
                        error: None,
                        source_file: active.path.clone(),
                        end_offset,
                    };
                    if !self.publish(line).await {
                        return Ok(State::Closed);
                    }
                    self.shared
                        .set_position(Some(SeekPosition::new(active.path.clone(), end_offset)));
                }
                ReadOutcome::CaughtUp => return Ok(State::Resolving(active)),
            }
        }
    }

    async fn resolve(&mut self, active: ActiveFile) -> Result<State> {
        let mut events = self.detector.watch(WatchTarget {
            path: active.path.clone(),
            consumed: active.reader.consumed(),
            cursor: self.cursor,
        });

        let change = tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => return Ok(State::Closed),
            change = events.next() => change?,
        };

        match change {
            Change::Grew => {
                self.logger
                    .debug(&format!("{} grew", active.path.display()));
                Ok(State::Streaming(active))
            }
            Change::Truncated => {
                self.logger.warn(&format!(
                    "{} was truncated, reopening from the start",
                    active.path.display()
                ));
                let slot = Slot {
                    path: active.path,
                    timestamp: self.cursor,
                };
                Ok(State::Opening { slot, seek: 0 })
            }
            Change::SuccessorReady(slot) => {
                self.logger
                    .debug(&format!("successor {} is ready", slot.path.display()));
                Ok(State::Switching {
                    from: active,
                    to: slot,
                })
            }
        }
    }

    async fn switch(&mut self, mut from: ActiveFile, to: Slot) -> State {
        // No more bytes will be appended to a file once its successor
        // exists, so an unterminated last line is complete as it stands.
        if let Some(text) = from.reader.take_pending() {
            self.logger.warn(&format!(
                "{} ends without a newline, emitting its last {} bytes as a line",
                from.path.display(),
                text.len()
            ));
            let end_offset = from.reader.offset();
            let line = LogLine {
                text,
                error: None,
                source_file: from.path.clone(),
                end_offset,
            };
            if !self.publish(line).await {
                return State::Closed;
            }
            self.shared
                .set_position(Some(SeekPosition::new(from.path.clone(), end_offset)));
        }

        drop(from);
        self.logger.info(&format!(
            "switching from {} to {}",
            self.source.display(),
            to.path.display()
        ));
        self.cursor = to.timestamp;
        State::Opening { slot: to, seek: 0 }
    }

    async fn fail(&mut self, error: Error) {
        self.logger.error(&format!(
            "stopped following {}: {}",
            self.source.display(),
            error
        ));
        self.shared.set_position(None);

        let line = LogLine {
            text: String::new(),
            error: Some(error),
            source_file: self.source.clone(),
            end_offset: 0,
        };
        self.publish(line).await;
    }

    /// Blocks while the queue is full. Returns `false` once the consumer is
    /// closed or dropped.
    async fn publish(&self, line: LogLine) -> bool {
        tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => false,
            sent = self.tx.send(line) => sent.is_ok(),
        }
    }
}
