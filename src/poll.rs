//! # Bounded Wait Loop
//!
//! Both workflows wait for remote state to converge the same way: describe
//! the resource, stop once it is no longer in progress, otherwise run the
//! per-tick hook and sleep a fixed interval, until a deadline measured from
//! the start of that wait phase.
//!
//! A failing describe call ends the wait with that error. It is never counted
//! as "still in progress".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::clock::Clock;
use crate::console;
use crate::constants::POLL_INTERVAL;
use crate::error::{ConvergeError, Result};

/// Interval and horizon of one wait phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub horizon: Duration,
}

impl PollPolicy {
    /// Standard interval with the given horizon.
    pub const fn within(horizon: Duration) -> Self {
        Self {
            interval: POLL_INTERVAL,
            horizon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The last observation was no longer in progress.
    Converged { observed: T, ticks: u32 },
    /// The deadline passed while the resource was still in progress.
    TimedOut { last: Option<T>, ticks: u32 },
}

impl<T> PollOutcome<T> {
    pub fn ticks(&self) -> u32 {
        match self {
            Self::Converged { ticks, .. } | Self::TimedOut { ticks, .. } => *ticks,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Side effect run once per tick while the resource is still in progress.
#[async_trait]
pub trait TickHook: Send {
    /// `tick_started` is the clock reading taken before that tick's describe call.
    async fn on_tick(&mut self, tick_started: DateTime<Utc>) -> Result<()>;
}

/// Hook that does nothing beyond the loop's own progress dot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHook;

#[async_trait]
impl TickHook for NoHook {
    async fn on_tick(&mut self, _tick_started: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
}

pub struct PollLoop<'a> {
    clock: &'a dyn Clock,
    policy: PollPolicy,
    show_progress: bool,
}

impl<'a> PollLoop<'a> {
    pub fn new(clock: &'a dyn Clock, policy: PollPolicy) -> Self {
        Self {
            clock,
            policy,
            show_progress: true,
        }
    }

    /// Suppresses the per-tick progress dot.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Repeats `probe` while `still_waiting` holds and the deadline has not passed.
    ///
    /// The deadline is checked before each describe call, so no call is made
    /// once it has elapsed.
    pub async fn run<T, P, Fut, W>(
        &self,
        mut probe: P,
        still_waiting: W,
        hook: &mut dyn TickHook,
    ) -> Result<PollOutcome<T>>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        W: Fn(&T) -> bool,
    {
        let horizon = chrono::Duration::from_std(self.policy.horizon).map_err(|e| {
            ConvergeError::configuration("poll_horizon", format!("horizon out of range: {e}"))
        })?;
        let deadline = self.clock.now() + horizon;
        let mut ticks = 0u32;
        let mut last = None;

        loop {
            let tick_started = self.clock.now();
            if tick_started >= deadline {
                debug!(ticks, deadline = %deadline, "Wait phase deadline reached");
                return Ok(PollOutcome::TimedOut { last, ticks });
            }

            let observed = probe().await?;
            ticks += 1;

            if !still_waiting(&observed) {
                debug!(ticks, "Wait phase converged");
                return Ok(PollOutcome::Converged { observed, ticks });
            }

            if self.show_progress {
                console::tick();
            }
            hook.on_tick(tick_started).await?;
            last = Some(observed);
            self.clock.sleep(self.policy.interval).await;
        }
    }
}
