//! Follows append-only logs whose file name changes on a fixed schedule.
//!
//! A log written as `2024010110.log`, `2024010111.log`, ... (or one file per
//! day) is read as one continuous stream of lines. The follower polls the
//! active file, switches to the next scheduled file once it appears, reopens
//! a file truncated in place, and can resume from a saved [`SeekPosition`].
//!
//! # Example
//!
//! ```rust,no_run
//! use log_follower::{follow_log, DateTimeLayout};
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut lines = follow_log(DateTimeLayout::new("/var/log/app", "%Y%m%d%H.log")).await?;
//!
//!     while let Some(line) = lines.next().await {
//!         match line.error {
//!             None => println!("{}", line.text),
//!             Some(e) => eprintln!("Error: {}", e),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

// Internal modules - not part of public API
mod detector;
mod events;
mod reader;

pub mod checkpoint;
mod consumer;
mod error;
mod logger;
mod naming;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use consumer::{Config, Consumer, DEFAULT_QUEUE_CAPACITY, LogLine, SeekPosition};
pub use error::{Error, Result};
pub use logger::{Logger, TracingLogger};
pub use naming::{Boundaries, DateTimeLayout, Granularity, NamingScheme, RotationSchedule, Slot};

/// Follows `layout` from the start of the current schedule slot with
/// default settings.
///
/// # Example
///
/// ```rust,no_run
/// use log_follower::{follow_log, DateTimeLayout};
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut lines = follow_log(DateTimeLayout::new("logs", "app.%Y-%m-%d.log")).await?;
///
///     while let Some(line) = lines.next().await {
///         if let Some(e) = line.error {
///             return Err(e.into());
///         }
///         println!("{}", line.text);
///     }
///
///     Ok(())
/// }
/// ```
pub async fn follow_log(layout: DateTimeLayout) -> Result<Consumer> {
    Consumer::new(Config::new(layout)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TempLogDir;
    use chrono::Local;
    use std::time::Duration;

    #[tokio::test]
    async fn test_follow_log_reads_current_slot() {
        let dir = TempLogDir::new().unwrap();
        let name = Local::now().naive_local().format("%Y%m%d.log").to_string();
        dir.create(&name, "hello\n").unwrap();

        let mut lines = follow_log(DateTimeLayout::new(dir.path(), "%Y%m%d.log"))
            .await
            .unwrap();
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(line.text, "hello");
        assert!(!line.is_error());
    }
}
