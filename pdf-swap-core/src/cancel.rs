//! Cooperative cancellation between the transport and the swap pipeline
//!
//! The transport holds a [`DropGuard`] of the token it hands to the pipeline:
//! if the request future is dropped mid-flight, blocking work it spawned sees
//! the cancellation at its next checkpoint.

use crate::error::{SwapError, SwapResult};

pub use tokio_util::sync::{CancellationToken, DropGuard};

/// Fail with [`SwapError::Cancelled`] once `token` has been cancelled.
pub fn check(token: &CancellationToken) -> SwapResult<()> {
    if token.is_cancelled() {
        Err(SwapError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        let token = CancellationToken::new();
        assert!(check(&token).is_ok());
        token.cancel();
        assert_eq!(check(&token), Err(SwapError::Cancelled));
    }

    #[test]
    fn test_drop_guard_cancels_clones() {
        let token = CancellationToken::new();
        let pipeline = token.clone();
        {
            let _guard = token.drop_guard();
            assert!(check(&pipeline).is_ok());
        }
        assert_eq!(check(&pipeline), Err(SwapError::Cancelled));
    }

    #[test]
    fn test_disarmed_guard() {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        let _ = guard.disarm();
        assert!(check(&token).is_ok());
    }
}
