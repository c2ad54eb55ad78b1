//! Retry with exponential backoff for grid fetches.
//!
//! Every fetch issued by the batch sampler goes through [`fetch_with_retry`].
//! Transient failures (timeouts, connection resets, HTTP 429/5xx, local I/O
//! hiccups) are retried; [`GridSourceError::Unavailable`] and decode errors
//! are permanent and returned immediately.

use std::time::Duration;

use chrono::NaiveDate;
use outbreak_environment_models::GridFields;

use crate::{GridSource, GridSourceError};

/// Default number of attempts per fetch (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// How often and how patiently a fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled before each later one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`.
    #[must_use]
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Fetches one day's fields, retrying transient failures.
///
/// # Errors
///
/// Returns the last [`GridSourceError`] once attempts are exhausted, or the
/// first non-transient error.
pub async fn fetch_with_retry(
    source: &dyn GridSource,
    date: NaiveDate,
    hour: u32,
    policy: &RetryPolicy,
) -> Result<GridFields, GridSourceError> {
    let max_attempts = policy.max_attempts.max(1);

    let mut attempt = 1;
    loop {
        match source.fetch(date, hour).await {
            Ok(fields) => return Ok(fields),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_before(attempt);
                log::warn!(
                    "Fetch {date} {hour:02}Z failed ({e}), retry {attempt}/{} in {delay:?}",
                    max_attempts - 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchiveWindow;
    use crate::source::MemoryGridSource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ArchiveWindow {
        ArchiveWindow::new(date(2000, 1, 1), date(2010, 12, 31))
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_before(1), Duration::from_millis(500));
        assert_eq!(policy.delay_before(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let day = date(2005, 5, 3);
        let source = MemoryGridSource::new(window());
        source.insert(MemoryGridSource::uniform(day, 18, "CAPE", 1500.0).unwrap());
        source.fail_transiently(day, 2);

        let fields = fetch_with_retry(&source, day, 18, &RetryPolicy::immediate(3))
            .await
            .unwrap();
        assert_eq!(fields.date, day);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let day = date(2005, 5, 3);
        let source = MemoryGridSource::new(window());
        source.insert(MemoryGridSource::uniform(day, 18, "CAPE", 1500.0).unwrap());
        source.fail_transiently(day, 5);

        let result = fetch_with_retry(&source, day, 18, &RetryPolicy::immediate(3)).await;
        assert!(matches!(result, Err(GridSourceError::Transient { .. })));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn unavailable_is_not_retried() {
        let source = MemoryGridSource::new(window());
        let result =
            fetch_with_retry(&source, date(2005, 5, 4), 18, &RetryPolicy::immediate(3)).await;
        assert!(matches!(result, Err(GridSourceError::Unavailable { .. })));
        assert_eq!(source.calls(), 1);
    }
}
