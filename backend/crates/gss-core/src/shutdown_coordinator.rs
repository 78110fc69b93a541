use crate::ShutdownGuard;

use tokio::sync::broadcast;

/// Fans a single stop request out to every subscriber
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { shutdown_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request a stop (call this from the signal handler)
    pub fn shutdown(&self) {
        log::info!("Stop requested, notifying supervisor");
        let _ = self.shutdown_tx.send(());
    }

    /// Subscribe before starting work, or an early request is missed
    pub fn subscribe_guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(self)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
