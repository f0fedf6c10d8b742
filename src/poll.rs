// ABOUTME: Fixed-interval polling of asynchronous platform jobs
// ABOUTME: Probes until a predicate holds or the attempt budget runs out

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// How long to wait before the first probe, between probes, and how many
/// probes to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(initial_delay: Duration, interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            interval,
            max_attempts,
        }
    }

    pub fn export_default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(3), 10)
    }

    /// Imports take longer than exports in practice, hence the larger budget.
    pub fn import_default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(3), 14)
    }

    /// Probes back to back without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Reached { value: T, attempts: u32 },
    Exhausted { last: Option<T>, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_reached(&self) -> bool {
        matches!(self, PollOutcome::Reached { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Reached { attempts, .. } | PollOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last(&self) -> Option<&T> {
        match self {
            PollOutcome::Reached { value, .. } => Some(value),
            PollOutcome::Exhausted { last, .. } => last.as_ref(),
        }
    }
}

/// Calls `probe` up to `policy.max_attempts` times, stopping at the first
/// value accepted by `done`. A probe error ends polling immediately.
///
/// `probe` receives the 1-based attempt number.
pub async fn poll_until<T, F, Fut, P>(policy: &PollPolicy, mut probe: F, done: P) -> Result<PollOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    tokio::time::sleep(policy.initial_delay).await;

    let mut last = None;
    for attempt in 1..=policy.max_attempts {
        let value = probe(attempt).await?;
        if done(&value) {
            return Ok(PollOutcome::Reached {
                value,
                attempts: attempt,
            });
        }
        last = Some(value);
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Ok(PollOutcome::Exhausted {
        last,
        attempts: policy.max_attempts,
    })
}
