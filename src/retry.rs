use backon::{ExponentialBuilder, Retryable};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

use crate::config::RetrySettings;
use crate::error::IsRetryable;

/// Upper bound on a single wait, whatever the configured schedule says.
const MAX_POLL_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Options accepted by [`with_retry`].
pub struct RetryOptions<'a> {
    pub retry: &'a RetrySettings,
    pub verbose_logging: bool,
    /// Label carried by the per-attempt log lines.
    pub message: &'a str,
}

fn backoff(settings: &RetrySettings) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs_f64(settings.wait.max(0.0)))
        .with_factor(settings.back_off.max(1.0) as f32)
        .with_max_times(settings.times)
        .with_max_delay(MAX_POLL_DELAY)
}

/// Drives `operation` until it succeeds, fails with a non-retryable error,
/// or the retry budget in `options.retry` runs out.
///
/// A non-retryable error is returned immediately and untouched; exhaustion
/// surfaces the error from the last attempt. The schedule is deterministic:
/// the k-th wait is `wait * back_off^(k - 1)` seconds.
pub async fn with_retry<T, E, F, Fut>(mut operation: F, options: RetryOptions<'_>) -> Result<T, E>
where
    E: IsRetryable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempt = AtomicUsize::new(0);
    let times = options.retry.times;
    let verbose_logging = options.verbose_logging;
    let message = options.message;

    (|| {
        let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
        if verbose_logging {
            info!(attempt = n, "{message}");
        }
        operation()
    })
    .retry(backoff(options.retry))
    .when(|err: &E| err.is_retryable())
    .notify(|err: &E, delay: Duration| {
        if verbose_logging {
            let n = attempt.load(Ordering::Relaxed);
            info!(
                attempt = n,
                retries_left = times + 1 - n,
                ?delay,
                "Attempt not complete: {err}"
            );
        }
    })
    .await
}
