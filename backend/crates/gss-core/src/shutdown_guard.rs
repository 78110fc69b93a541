use crate::ShutdownCoordinator;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// Receiving end of a stop request
pub struct ShutdownGuard {
    shutdown_rx: broadcast::Receiver<()>,
    requested: bool,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_rx: coordinator.subscribe(),
            requested: false,
        }
    }

    /// Wait for a stop request. Returns at once if one was already seen.
    pub async fn wait(&mut self) {
        if !self.requested {
            let _ = self.shutdown_rx.recv().await;
            self.requested = true;
        }
    }

    /// Non-blocking check; sticky once a request has arrived
    pub fn poll_shutdown(&mut self) -> bool {
        if !self.requested {
            self.requested = match self.shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) | Err(TryRecvError::Closed) => true,
                Err(TryRecvError::Empty) => false,
            };
        }
        self.requested
    }
}
