//! Polling change detection for the active file and its successors.

use crate::error::{Error, Result};
use crate::events::{Change, EventSlots, FileEvents};
use crate::naming::{RotationSchedule, Slot};
use chrono::{Local, NaiveDateTime};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What the detector is asked to watch.
#[derive(Debug, Clone)]
pub(crate) struct WatchTarget {
    /// Path of the file currently being read.
    pub(crate) path: PathBuf,
    /// Bytes already pulled from that file.
    pub(crate) consumed: u64,
    /// Schedule timestamp of that file.
    pub(crate) cursor: NaiveDateTime,
}

/// Samples the active file and the schedule at a fixed interval until
/// something actionable happens.
#[derive(Debug, Clone)]
pub(crate) struct ChangeDetector {
    schedule: RotationSchedule,
    poll_interval: Duration,
}

impl ChangeDetector {
    pub(crate) fn new(schedule: RotationSchedule, poll_interval: Duration) -> Self {
        Self {
            schedule,
            poll_interval,
        }
    }

    /// Spawns a polling task for `target`. The task posts exactly one event
    /// and exits; dropping the returned [`FileEvents`] stops it early.
    pub(crate) fn watch(&self, target: WatchTarget) -> FileEvents {
        let slots = Arc::new(EventSlots::default());
        let task = tokio::spawn(poll_for_change(
            self.schedule.clone(),
            target,
            self.poll_interval,
            slots.clone(),
        ));
        FileEvents::new(slots, task)
    }
}

async fn poll_for_change(
    schedule: RotationSchedule,
    target: WatchTarget,
    poll_interval: Duration,
    slots: Arc<EventSlots>,
) {
    loop {
        let now = Local::now().naive_local();
        match sample(&schedule, &target, now).await {
            Ok(Some(Change::Grew)) => return slots.notify_grew(),
            Ok(Some(Change::Truncated)) => return slots.notify_truncated(),
            Ok(Some(Change::SuccessorReady(slot))) => return slots.notify_successor(slot),
            Ok(None) => {}
            Err(e) => return slots.notify_failed(e),
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Takes one sample. `Ok(None)` means nothing conclusive happened yet.
pub(crate) async fn sample(
    schedule: &RotationSchedule,
    target: &WatchTarget,
    now: NaiveDateTime,
) -> Result<Option<Change>> {
    // Earliest existing successor wins, even if later slots exist too.
    let mut successor = None;
    for slot in schedule.next_boundaries(target.cursor, now) {
        if matches!(tokio::fs::try_exists(&slot.path).await, Ok(true)) {
            successor = Some(slot);
            break;
        }
    }

    let size = match tokio::fs::metadata(&target.path).await {
        Ok(metadata) => Some(metadata.len()),
        Err(_) if successor.is_some() => None,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::FileNotFound {
                path: target.path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(classify(size, target.consumed, successor))
}

/// Growth outranks truncation, which outranks switching to a successor.
///
/// Truncation is only visible as a size below `consumed`. A file truncated
/// and then refilled past its old size between two samples is reported as
/// growth, and reading resumes at the old offset.
fn classify(size: Option<u64>, consumed: u64, successor: Option<Slot>) -> Option<Change> {
    match size {
        Some(size) if size > consumed => Some(Change::Grew),
        Some(size) if size < consumed => Some(Change::Truncated),
        _ => successor.map(Change::SuccessorReady),
    }
}
