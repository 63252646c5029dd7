//! Per-request cancellation and deadline propagation.
//!
//! Repository calls are synchronous, so the context is checked once before
//! each store round-trip rather than polled during it.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why a context no longer admits store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDone {
    Cancelled,
    DeadlineExceeded,
}

/// Caller context passed to every repository operation.
///
/// Derived contexts observe a child of the parent's token: cancelling the
/// parent cancels them, cancelling them leaves the parent live.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl RequestContext {
    /// Context with no deadline and a fresh token.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derived context expiring after `timeout`.
    ///
    /// A timeout too large to represent as an `Instant` adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(self.deadline),
        }
    }

    /// Derived context expiring at `deadline`. An earlier parent deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        self.child(Some(deadline))
    }

    /// Returns a copy observing `token` instead of the current one.
    pub fn with_token(&self, token: CancellationToken) -> Self {
        Self {
            deadline: self.deadline,
            token,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `Err` once the token is cancelled or the deadline has passed.
    ///
    /// Cancellation wins when both apply.
    pub fn check(&self) -> Result<(), ContextDone> {
        if self.token.is_cancelled() {
            return Err(ContextDone::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextDone::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            token: self.token.child_token(),
        }
    }
}
