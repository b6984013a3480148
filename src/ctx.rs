use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// A caller-owned cancellation switch.
///
/// Clones share the same flag, so the caller keeps one handle and passes another into the
/// engine. Cancelling is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call context handed to every completion and embedding request.
///
/// Carries the deadline derived from the caller's timeout and the caller's cancellation flag.
/// Clients should use [`CallContext::remaining`] as their transport timeout; the engine also
/// checks [`CallContext::check`] between streamed chunks.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancelFlag,
}

impl CallContext {
    /// A context that starts its clock now.
    pub fn new(timeout: Option<Duration>, cancel: CancelFlag) -> Self {
        Self {
            deadline: timeout.map(|t| Instant::now() + t),
            cancel,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with `Cancelled` or `TimedOut` if the call should stop now.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::TimedOut);
            }
        }
        Ok(())
    }
}
