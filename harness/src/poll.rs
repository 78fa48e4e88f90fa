//! Bounded polling for state that is confirmed but not yet readable.

use {
    crate::{
        config::PollPolicy,
        error::{HarnessError, Result},
    },
    solana_sdk::pubkey::Pubkey,
    std::future::Future,
    tokio::time::{sleep, Instant},
};

/// Call `probe` until it yields `Some`, backing off between attempts.
///
/// Errors from `probe` abort immediately. Running out of time yields
/// [`HarnessError::NotYetObservable`] for `address`.
pub async fn poll_until<T, F, Fut>(policy: &PollPolicy, address: Pubkey, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let started = Instant::now();
    let timeout = policy.timeout();
    let mut delay = policy.initial_delay();
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        if let Some(value) = probe().await? {
            if attempts > 1 {
                log::debug!("{} observable after {} attempts", address, attempts);
            }
            return Ok(value);
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            log::warn!(
                "{} still not observable after {} attempts",
                address,
                attempts
            );
            return Err(HarnessError::NotYetObservable {
                address,
                attempts,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }
        sleep(delay.min(timeout - elapsed)).await;
        delay = policy.next_delay(delay);
    }
}
