//! Dependencies injected into every page reducer

use crate::reports::ReportSink;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use elephant_client::Backend;
use elephant_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Delay between an authentication failure and the redirect to login
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Offset of the audience's local time from UTC, in seconds (UTC+8)
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// The default local offset
#[must_use]
pub fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Environment shared by all pages
///
/// Production wires in `BackendClient`, `SystemClock` and `FsReportSink`;
/// tests use `MockBackend`, `FixedClock` and `MemoryReportSink`.
#[derive(Clone)]
pub struct PageEnvironment {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    reports: Arc<dyn ReportSink>,
    redirect_delay: Duration,
    utc_offset: FixedOffset,
}

impl PageEnvironment {
    /// Create an environment with the default redirect delay
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        reports: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            backend,
            clock,
            reports,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            utc_offset: default_utc_offset(),
        }
    }

    /// Override the redirect delay
    #[must_use]
    pub const fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Override the local offset used for "now" and "today"
    #[must_use]
    pub const fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Backend handle; clone it into effect futures
    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Current wall-clock time at the local offset
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock.now().with_timezone(&self.utc_offset).naive_local()
    }

    /// Current local date
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Where downloaded reports go
    #[must_use]
    pub fn reports(&self) -> Arc<dyn ReportSink> {
        Arc::clone(&self.reports)
    }

    /// Delay before redirecting to login
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        self.redirect_delay
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::reports::MemoryReportSink;
    use elephant_testing::{fixtures, FixedClock, MockBackend};

    fn env_at(now: &str) -> PageEnvironment {
        PageEnvironment::new(
            Arc::new(MockBackend::new()),
            Arc::new(FixedClock::new(fixtures::timestamp(now))),
            Arc::new(MemoryReportSink::new()),
        )
    }

    #[test]
    fn test_local_date_runs_ahead_of_utc_after_midnight() {
        // 02:00 on the 15th in UTC+8
        let env = env_at("2025-06-14T18:00:00Z");

        assert_eq!(env.today(), fixtures::date("2025-06-15"));
        assert_eq!(
            env.local_now(),
            fixtures::date("2025-06-15").and_hms_opt(2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_utc_offset_override() {
        let env = env_at("2025-06-14T18:00:00Z").with_utc_offset(Utc.fix());

        assert_eq!(env.today(), fixtures::date("2025-06-14"));
    }
}
