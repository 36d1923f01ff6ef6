use tokio::time::{sleep, Duration};
use tracing::warn;

/// Runs `f`, retrying up to `retries` more times while `should_retry`
/// accepts the error. The delay grows linearly with the attempt number.
pub async fn with_retry<F, Fut, T, E, P>(
    f: F,
    retries: u32,
    delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= retries || !should_retry(&e) {
                    return Err(e);
                }
                attempts += 1;
                warn!("Attempt {} failed ({}), retrying", attempts, e);
                sleep(delay * attempts).await;
            }
        }
    }
}
