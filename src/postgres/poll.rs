use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::DataSourceError;

use super::session::Session;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the engine waits for a submitted statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two busy checks.
    pub interval: Duration,
    /// Give up after this long. The statement keeps running on the server, so the session
    /// should be dropped once this fires.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Lifecycle of the most recent statement on an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementState {
    #[default]
    Idle,
    Sent,
    Succeeded,
    Failed,
}

impl StatementState {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Poll `session` until it is no longer busy, returning how many busy checks came back true.
///
/// # Errors
/// Returns `DataSourceError::Timeout` once the policy deadline has passed.
pub(crate) async fn wait_until_idle<S: Session>(
    session: &mut S,
    policy: &PollPolicy,
) -> Result<u32, DataSourceError> {
    let started = Instant::now();
    let mut busy_polls = 0u32;
    while session.is_busy() {
        if let Some(deadline) = policy.deadline
            && started.elapsed() >= deadline
        {
            return Err(DataSourceError::Timeout(deadline));
        }
        busy_polls = busy_polls.saturating_add(1);
        trace!(busy_polls, "statement still running");
        if policy.interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            sleep(policy.interval).await;
        }
    }
    Ok(busy_polls)
}
