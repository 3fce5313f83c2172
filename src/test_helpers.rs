//! Test utilities for laying out rotated log files in a temporary directory.

#[cfg(test)]
use chrono::{Duration, Local, NaiveDateTime, Timelike};
#[cfg(test)]
use std::fs::{File, OpenOptions};
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::{Path, PathBuf};

#[cfg(test)]
pub const HOURLY: &str = "%Y%m%d%H.log";

#[cfg(test)]
pub struct TempLogDir {
    _temp_dir: tempfile::TempDir,
    path: PathBuf,
}

#[cfg(test)]
impl TempLogDir {
    /// Create a new empty log directory
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create (or replace) a file with exactly `content`
    pub fn create(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.file(name);
        let mut file = File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(path)
    }

    /// Append raw bytes without adding a terminator
    pub fn append_raw(&self, name: &str, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.file(name))?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Append one newline-terminated line
    pub fn append_line(&self, name: &str, content: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.file(name))?;
        writeln!(file, "{}", content)?;
        file.flush()?;
        Ok(())
    }

    /// Truncate the file in place
    pub fn truncate(&self, name: &str) -> std::io::Result<()> {
        File::create(self.file(name))?;
        Ok(())
    }
}

/// The start of the current local hour shifted by `hours`
#[cfg(test)]
pub fn hour_slot(hours: i64) -> NaiveDateTime {
    let now = Local::now().naive_local();
    let start = now
        .date()
        .and_hms_opt(now.hour(), 0, 0)
        .expect("valid hour");
    start + Duration::hours(hours)
}

#[cfg(test)]
pub fn hourly_name(slot: NaiveDateTime) -> String {
    slot.format(HOURLY).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_log_dir_creation() {
        let dir = TempLogDir::new().unwrap();
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_create_and_append() {
        let dir = TempLogDir::new().unwrap();
        dir.create("a.log", "first\n").unwrap();
        dir.append_line("a.log", "second").unwrap();
        dir.append_raw("a.log", "par").unwrap();

        let content = std::fs::read_to_string(dir.file("a.log")).unwrap();
        assert_eq!(content, "first\nsecond\npar");
    }

    #[test]
    fn test_truncate() {
        let dir = TempLogDir::new().unwrap();
        dir.create("a.log", "initial content\n").unwrap();
        dir.truncate("a.log").unwrap();

        let content = std::fs::read_to_string(dir.file("a.log")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_hour_slot_is_aligned() {
        let slot = hour_slot(-2);
        assert_eq!(slot.minute(), 0);
        assert_eq!(slot.second(), 0);
        assert!(slot < Local::now().naive_local());
    }
}
