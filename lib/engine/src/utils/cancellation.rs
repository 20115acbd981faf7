use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken as Signal;

/// Request-wide cancellation signal.
///
/// Cloning the token shares the underlying signal, so cancelling any clone cancels all of them.
/// An optional deadline turns the token into a timeout: the first check after the deadline
/// cancels the token and reports [`CancellationError::TimedOut`].
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    signal: Signal,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(duration: Duration) -> Self {
        Self {
            signal: Signal::new(),
            deadline: Some(Instant::now() + duration),
        }
    }

    /// Returns a token sharing this token's signal, bounded by the given timeout.
    /// The earlier of the two deadlines wins.
    pub fn with_deadline_from(&self, duration: Duration) -> Self {
        let candidate = Instant::now() + duration;
        Self {
            signal: self.signal.clone(),
            deadline: Some(self.deadline.map_or(candidate, |own| own.min(candidate))),
        }
    }

    pub fn cancel(&self) {
        self.signal.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.bail_if_cancelled().is_err()
    }

    /// Checks the deadline first, so an expired token reports `TimedOut` even after
    /// the expiry cancelled the shared signal.
    #[inline]
    pub fn bail_if_cancelled(&self) -> Result<(), CancellationError> {
        if self.expired() {
            self.signal.cancel();
            Err(CancellationError::TimedOut)
        } else if self.signal.is_cancelled() {
            Err(CancellationError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= Instant::now())
    }

    /// Resolves once the token is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> CancellationError {
        let Some(deadline) = self.deadline else {
            self.signal.cancelled().await;
            return CancellationError::Cancelled;
        };

        tokio::select! {
            _ = self.signal.cancelled() => {
                if self.expired() {
                    CancellationError::TimedOut
                } else {
                    CancellationError::Cancelled
                }
            }
            _ = tokio::time::sleep_until(deadline.into()) => {
                self.signal.cancel();
                CancellationError::TimedOut
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CancellationError {
    #[error("cancelled")]
    Cancelled,
    #[error("timed out")]
    TimedOut,
}
