use chrono::{DateTime, Utc};

/// Wall-clock source for watermarks and secret timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}
