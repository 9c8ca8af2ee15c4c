//! Cancellation token for generation jobs
//!
//! Each worker owns one token. Resetting the scheduler cancels the token,
//! which tells the worker to stop pulling jobs and lets a running job bail
//! out early between its expensive steps.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token for cooperative job cancellation
///
/// Job bodies can check `is_cancelled()` between decode and resize steps
/// to stop early. Clones share the same underlying state.
///
/// # Example
///
/// ```
/// use filechooser_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token
    ///
    /// All clones of this token observe the cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check if this token has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_basic() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_clone() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token1.cancel();
        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[test]
    fn test_cancellation_token_idempotent() {
        let token = CancellationToken::default();

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_across_threads() {
        let token = CancellationToken::new();
        let worker_token = token.clone();

        let handle = std::thread::spawn(move || {
            while !worker_token.is_cancelled() {
                std::thread::yield_now();
            }
            true
        });

        token.cancel();
        assert!(handle.join().unwrap());
    }
}
