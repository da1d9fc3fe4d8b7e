use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts. One attempt is made up front and one more after
/// each delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// 2s, 4s, 6s, 8s, then 10s three times.
    fn default() -> Self {
        Self::backoff(&[2, 4, 6, 8], 3, 10)
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn backoff(base_delays_secs: &[u64], final_retries: usize, final_delay_secs: u64) -> Self {
        let delays = base_delays_secs
            .iter()
            .copied()
            .chain(std::iter::repeat_n(final_delay_secs, final_retries))
            .map(Duration::from_secs)
            .collect();
        Self { delays }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    #[must_use]
    pub const fn from_delays(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Retry an async operation according to `policy`, returning the last error
/// when every attempt fails.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let total = policy.attempts();
    for (i, delay) in policy.delays.iter().enumerate() {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                warn!(
                    "Request failed (attempt {}/{total}): {e}. Retrying after {delay:?}...",
                    i + 1
                );
                sleep(*delay).await;
            }
        }
    }
    operation().await
}
