use std::time::Duration;

/// Upper bound on how long deleting the Lambda@Edge stack normally takes.
pub const STACK_DELETION_ESTIMATE: Duration = Duration::from_millis(60_000);

/// What to do after the first stack deletion reported that replicas are not
/// yet retracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then delete the stack one more time.
    RetryAfter(Duration),
    /// Not enough budget left to retry and still finish the deletion.
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionRetryPolicy {
    pub deletion_estimate: Duration,
}

impl Default for DeletionRetryPolicy {
    fn default() -> Self {
        Self {
            deletion_estimate: STACK_DELETION_ESTIMATE,
        }
    }
}

impl DeletionRetryPolicy {
    /// `delay = remaining - deletion_estimate`; a non-positive delay gives up.
    pub fn decide(&self, remaining: Duration) -> RetryDecision {
        match remaining.checked_sub(self.deletion_estimate) {
            Some(delay) if !delay.is_zero() => RetryDecision::RetryAfter(delay),
            _ => RetryDecision::GiveUp,
        }
    }
}
