//! Injectable logging sink for consumer lifecycle messages.

/// Leveled text sink. The default forwards to `tracing`.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every message to the matching `tracing` macro.
///
/// Install a subscriber (for example `tracing_subscriber::fmt()` writing to
/// stderr) to see the output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "log_follower", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "log_follower", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "log_follower", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "log_follower", "{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Logger;
    use parking_lot::Mutex;

    /// Captures messages as `LEVEL message` strings.
    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.messages.lock().clone()
        }

        fn record(&self, level: &str, message: &str) {
            self.messages.lock().push(format!("{} {}", level, message));
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str) {
            self.record("DEBUG", message);
        }

        fn info(&self, message: &str) {
            self.record("INFO", message);
        }

        fn warn(&self, message: &str) {
            self.record("WARN", message);
        }

        fn error(&self, message: &str) {
            self.record("ERROR", message);
        }
    }
}
