//! Coalescing notifications between the change detector and the consumer.

use crate::error::{Error, Result};
use crate::naming::Slot;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A single-slot mailbox.
///
/// At most one value is retained; offering a new value before the previous
/// one was taken replaces it. Offering never blocks.
pub(crate) struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> Mailbox<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    pub(crate) fn offer(&self, value: T) {
        *self.slot.lock() = Some(value);
        self.notify.notify_one();
    }

    pub(crate) fn try_take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub(crate) async fn take(&self) -> T {
        loop {
            if let Some(value) = self.try_take() {
                return value;
            }
            self.notify.notified().await;
        }
    }
}

/// Something the detector observed about the active file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    /// The active file has bytes beyond what was read.
    Grew,
    /// The active file is now shorter than what was read.
    Truncated,
    /// The next scheduled file exists.
    SuccessorReady(Slot),
}

/// One mailbox per event kind, fed by a detector task.
#[derive(Default)]
pub(crate) struct EventSlots {
    grew: Mailbox<()>,
    truncated: Mailbox<()>,
    successor: Mailbox<Slot>,
    failed: Mailbox<Error>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSlots {
    pub(crate) fn notify_grew(&self) {
        self.grew.offer(());
    }

    pub(crate) fn notify_truncated(&self) {
        self.truncated.offer(());
    }

    pub(crate) fn notify_successor(&self, slot: Slot) {
        self.successor.offer(slot);
    }

    pub(crate) fn notify_failed(&self, error: Error) {
        self.failed.offer(error);
    }
}

/// Receiving half handed to the consumer. Dropping it stops the detector task.
pub(crate) struct FileEvents {
    slots: Arc<EventSlots>,
    task: Option<JoinHandle<()>>,
}

impl FileEvents {
    pub(crate) fn new(slots: Arc<EventSlots>, task: JoinHandle<()>) -> Self {
        Self {
            slots,
            task: Some(task),
        }
    }

    /// Waits for the first event. Failures win over changes, and growth wins
    /// over truncation and switching when several are pending.
    pub(crate) async fn next(&mut self) -> Result<Change> {
        let slots = &self.slots;
        tokio::select! {
            biased;
            error = slots.failed.take() => Err(error),
            _ = slots.grew.take() => Ok(Change::Grew),
            _ = slots.truncated.take() => Ok(Change::Truncated),
            slot = slots.successor.take() => Ok(Change::SuccessorReady(slot)),
        }
    }
}

impl Drop for FileEvents {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
