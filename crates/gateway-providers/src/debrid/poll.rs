//! Bounded polling shared by every resolver's upload->poll step: fixed
//! interval, hard overall deadline, first non-`None` wins.

use std::future::Future;
use std::time::Duration;

use super::traits::DebridError;

pub async fn poll_until<T, F, Fut>(
    mut probe: F,
    total_timeout: Duration,
    interval: Duration,
) -> Result<T, DebridError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DebridError>>,
{
    let deadline = tokio::time::Instant::now() + total_timeout;

    loop {
        match probe().await? {
            Some(value) => return Ok(value),
            None => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(DebridError::Timeout);
                }
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn returns_as_soon_as_probe_yields_a_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = poll_until(
            move || {
                let calls = calls_clone.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Ok(None)
                    } else {
                        Ok(Some("ready"))
                    }
                }
            },
            Duration::from_secs(12),
            Duration::from_millis(1_500),
        )
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_if_never_ready() {
        let result: Result<&str, DebridError> =
            poll_until(|| async { Ok(None) }, Duration::from_secs(3), Duration::from_millis(500)).await;
        assert_eq!(result.unwrap_err(), DebridError::Timeout);
    }

    #[tokio::test]
    async fn propagates_probe_error_immediately() {
        let result: Result<&str, DebridError> =
            poll_until(|| async { Err(DebridError::AuthInvalid) }, Duration::from_secs(12), Duration::from_millis(1))
                .await;
        assert_eq!(result.unwrap_err(), DebridError::AuthInvalid);
    }
}
