//! Cancellation and deadline handle threaded through strategy and mechanism calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::{Error, Result};

/// Cheap to clone; clones share the same cancel flag.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Shares the cancel flag; the child deadline is the earlier of the two.
    pub fn child(&self, timeout: Option<std::time::Duration>) -> Self {
        let own = timeout.and_then(|t| Instant::now().checked_add(t));
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Long-running calculations should call this between iterations.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fresh_context_is_live() {
        let ctx = RunContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = RunContext::new();
        let clone = ctx.clone();
        let child = ctx.child(None);
        clone.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
        assert!(matches!(child.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = RunContext::with_timeout(Duration::ZERO);
        assert!(matches!(ctx.check(), Err(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_child_takes_earlier_deadline() {
        let parent = RunContext::with_timeout(Duration::from_secs(3600));
        let child = parent.child(Some(Duration::ZERO));
        assert!(child.deadline().unwrap() <= parent.deadline().unwrap());
        assert!(matches!(child.check(), Err(Error::DeadlineExceeded)));
        assert!(parent.check().is_ok());
    }
}
