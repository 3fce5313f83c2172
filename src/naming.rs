//! Mapping between schedule timestamps and on-disk file names.
//!
//! A rotated log is identified by a directory plus a chrono strftime pattern
//! such as `%Y%m%d%H.log`. Rendering a timestamp through the pattern yields
//! the file for that time slot, and parsing a file name back yields the
//! slot's timestamp truncated to the pattern's own resolution.

use crate::error::{Error, Result};
use chrono::format::{Item, Parsed, StrftimeItems, parse as parse_items};
use chrono::{Duration, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Directory and strftime pattern of a rotated log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeLayout {
    pub directory: PathBuf,
    pub pattern: String,
}

impl DateTimeLayout {
    pub fn new(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
        }
    }
}

/// Time between two successive rotated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    /// Length of one schedule slot.
    pub fn step(self) -> Duration {
        match self {
            Granularity::Hourly => Duration::hours(1),
            Granularity::Daily => Duration::days(1),
        }
    }
}

/// A concrete schedule slot: the file for one timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

/// Renders and parses file names for a [`DateTimeLayout`].
#[derive(Debug, Clone)]
pub struct NamingScheme {
    layout: DateTimeLayout,
}

impl NamingScheme {
    /// Validates the layout's pattern and wraps it.
    pub fn new(layout: DateTimeLayout) -> Result<Self> {
        if layout.pattern.is_empty() {
            return Err(Error::Config {
                message: "date-time pattern is empty".to_string(),
            });
        }

        if StrftimeItems::new(&layout.pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Config {
                message: format!("invalid date-time pattern '{}'", layout.pattern),
            });
        }

        Ok(Self { layout })
    }

    pub fn layout(&self) -> &DateTimeLayout {
        &self.layout
    }

    /// Base file name for `timestamp`. Fields absent from the pattern are dropped.
    pub fn file_name(&self, timestamp: NaiveDateTime) -> String {
        timestamp.format(&self.layout.pattern).to_string()
    }

    /// Full path for `timestamp`.
    pub fn format(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.layout.directory.join(self.file_name(timestamp))
    }

    /// Inverse of [`format`](Self::format). Only the base name of `path` is
    /// considered; hour, minute and second default to zero when the pattern
    /// does not carry them.
    pub fn parse(&self, path: &Path) -> Result<NaiveDateTime> {
        let name = base_name(path);
        let parse_error = || Error::Parse {
            name: name.clone(),
            pattern: self.layout.pattern.clone(),
        };

        let mut parsed = Parsed::new();
        parse_items(&mut parsed, &name, StrftimeItems::new(&self.layout.pattern))
            .map_err(|_| parse_error())?;

        // Each setter fails without side effects when the pattern already
        // provided a different value for that field.
        let _ = parsed.set_hour(0);
        let _ = parsed.set_minute(0);
        let _ = parsed.set_second(0);
        let _ = parsed.set_nanosecond(0);

        parsed
            .to_naive_datetime_with_offset(0)
            .map_err(|_| parse_error())
    }

    /// Classifies the pattern by rendering the slot one hour after `sample`.
    /// An unchanged name means the pattern is coarser than an hour.
    pub fn infer_granularity(&self, sample: &Path) -> Result<Granularity> {
        let timestamp = self.parse(sample)?;
        let later = timestamp
            .checked_add_signed(Duration::hours(1))
            .ok_or_else(|| Error::Parse {
                name: base_name(sample),
                pattern: self.layout.pattern.clone(),
            })?;

        if self.file_name(later) == base_name(sample) {
            Ok(Granularity::Daily)
        } else {
            Ok(Granularity::Hourly)
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// A naming scheme together with its inferred granularity.
#[derive(Debug, Clone)]
pub struct RotationSchedule {
    scheme: NamingScheme,
    granularity: Granularity,
}

impl RotationSchedule {
    pub fn new(scheme: NamingScheme, granularity: Granularity) -> Self {
        Self {
            scheme,
            granularity,
        }
    }

    pub fn scheme(&self) -> &NamingScheme {
        &self.scheme
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn slot(&self, timestamp: NaiveDateTime) -> Slot {
        Slot {
            path: self.scheme.format(timestamp),
            timestamp,
        }
    }

    /// Slots strictly after `cursor` that have already started at `now`,
    /// oldest first.
    pub fn next_boundaries(&self, cursor: NaiveDateTime, now: NaiveDateTime) -> Boundaries<'_> {
        Boundaries {
            schedule: self,
            next: cursor.checked_add_signed(self.granularity.step()),
            now,
        }
    }
}

/// Lazy iterator returned by [`RotationSchedule::next_boundaries`].
#[derive(Debug)]
pub struct Boundaries<'a> {
    schedule: &'a RotationSchedule,
    next: Option<NaiveDateTime>,
    now: NaiveDateTime,
}

impl Iterator for Boundaries<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let timestamp = self.next.filter(|ts| *ts <= self.now)?;
        self.next = timestamp.checked_add_signed(self.schedule.granularity.step());
        Some(self.schedule.slot(timestamp))
    }
}
