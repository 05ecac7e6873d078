//! Cooperative cancellation shared by the render pass and its collaborators.

use super::error::BuildError;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable cancellation flag.
///
/// Every clone observes the same state; once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// `Err(BuildError::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), BuildError> {
        if self.is_cancelled() {
            Err(BuildError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        rx.wait_for(|cancelled| *cancelled).await.ok();
    }
}
