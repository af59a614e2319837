use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    /// Every attempt failed.
    #[error("dependency not ready after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
    /// Zero attempts were requested.
    #[error("retry count must be at least 1")]
    NoAttempts,
}

/// Call `check` until it succeeds, at most `max_attempts` times, sleeping
/// `delay` after each failure.
///
/// Returns the number of attempts that were needed.
pub async fn wait_until_ready<F, Fut, E>(
    max_attempts: u32,
    delay: Duration,
    mut check: F,
) -> Result<u32, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    if max_attempts == 0 {
        return Err(WaitError::NoAttempts);
    }

    info!("Waiting for dependency, up to {max_attempts} attempts");

    let mut last_error = String::new();
    for attempt in 1..=max_attempts {
        match check().await {
            Ok(()) => return Ok(attempt),
            Err(e) => {
                last_error = e.to_string();
                warn!(attempt, error = %last_error, "Not ready, waiting {:?}", delay);
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(WaitError::Exhausted {
        attempts: max_attempts,
        last_error,
    })
}
