use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tracing::warn;

use crate::error::ProverError;
use crate::error::RetryClass;

/// Exponential backoff for transport failures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn delay(
        &self,
        attempt: u32,
    ) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Runs `attempt` until it succeeds, fails with an error that is not worth retrying, or the
/// retries run out.
///
/// Each attempt starts over from scratch, so no partial state leaks between them.
pub async fn with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<T, ProverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProverError>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Err(err)
                if err.retry_class() == RetryClass::RetryWithBackoff
                    && retries < policy.max_retries =>
            {
                retries += 1;
                let delay = policy.delay(retries);
                warn!(retries, ?delay, "retrying after: {err}");
                counter!("xsp_proof_retries_total").increment(1);
                tokio::time::sleep(delay).await;
            },
            result => return result,
        }
    }
}
