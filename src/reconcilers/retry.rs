// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retrying transient failures with jittered exponential backoff.
//!
//! Callers pick a [`RetrySchedule`] ([`KUBE_API`] or [`BROKER_CATALOG`]) and hand an
//! operation to [`retry`]. Only errors whose [`Retryable::is_transient`] returns
//! `true` are retried; anything else comes straight back to the caller.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Shape of a backoff: where it starts, how fast it grows and when it gives up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySchedule {
    /// Delay before the second attempt
    pub first_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Total time after which no further attempt is made; `None` retries forever
    pub budget: Option<Duration>,
    /// Growth factor applied after every delay
    pub factor: f64,
    /// Fraction of each delay that is randomized in both directions
    pub jitter: f64,
}

/// Kubernetes API reads: 100ms doubling up to 30s, for at most 5 minutes.
pub const KUBE_API: RetrySchedule = RetrySchedule {
    first_delay: Duration::from_millis(100),
    max_delay: Duration::from_secs(30),
    budget: Some(Duration::from_secs(300)),
    factor: 2.0,
    jitter: 0.1,
};

/// Broker catalog requests: 50ms doubling up to 10s, for at most 1 minute.
///
/// The budget is short because a reconcile holds its broker lock while it waits.
pub const BROKER_CATALOG: RetrySchedule = RetrySchedule {
    first_delay: Duration::from_millis(50),
    max_delay: Duration::from_secs(10),
    budget: Some(Duration::from_secs(60)),
    factor: 2.0,
    jitter: 0.1,
};

impl RetrySchedule {
    /// Same schedule with a different total budget.
    #[must_use]
    pub fn with_budget(self, budget: Option<Duration>) -> Self {
        Self { budget, ..self }
    }

    /// Start a fresh backoff clock for this schedule.
    #[must_use]
    pub fn start(self) -> Backoff {
        Backoff {
            schedule: self,
            upcoming: self.first_delay,
            started: Instant::now(),
        }
    }
}

/// A running backoff. Each call to [`Backoff::next_delay`] consumes one step.
#[derive(Debug, Clone)]
pub struct Backoff {
    schedule: RetrySchedule,
    upcoming: Duration,
    started: Instant,
}

impl Backoff {
    /// Delay to wait before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self
            .schedule
            .budget
            .is_some_and(|budget| self.started.elapsed() >= budget)
        {
            return None;
        }

        let delay = self.upcoming;
        let grown = delay.as_secs_f64() * self.schedule.factor;
        self.upcoming = Duration::from_secs_f64(grown).min(self.schedule.max_delay);

        Some(jittered(delay, self.schedule.jitter))
    }

    /// Time since the backoff was started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

fn jittered(delay: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return delay;
    }
    let secs = delay.as_secs_f64();
    let spread = secs * jitter;
    let picked = rand::rng().random_range((secs - spread)..=(secs + spread));
    Duration::from_secs_f64(picked.max(0.0))
}

/// Errors that know whether trying again could help.
pub trait Retryable {
    /// `true` for throttling, server-side and transport failures.
    fn is_transient(&self) -> bool;
}

impl Retryable for kube::Error {
    fn is_transient(&self) -> bool {
        match self {
            kube::Error::Api(response) => transient_http_status(response.code),
            kube::Error::Service(_) => true,
            _ => false,
        }
    }
}

/// 429 and 5xx responses are worth another attempt.
#[must_use]
pub fn transient_http_status(code: u16) -> bool {
    code == 429 || ((500..600).contains(&code) && code != 501)
}

/// Run `operation` until it succeeds, fails permanently or `schedule` runs out.
///
/// `operation_name` labels the attempts in logs.
///
/// # Errors
///
/// Returns the last error seen when it is not transient or the budget is spent.
pub async fn retry<T, E, F, Fut>(
    schedule: RetrySchedule,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = schedule.start();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?backoff.elapsed(),
                        "Succeeded after retrying"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        let Some(delay) = backoff.next_delay() else {
            error!(
                operation = operation_name,
                attempt,
                elapsed = ?backoff.elapsed(),
                error = %err,
                "Retry budget spent, giving up"
            );
            return Err(err);
        };

        warn!(
            operation = operation_name,
            attempt,
            retry_in = ?delay,
            error = %err,
            "Transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
