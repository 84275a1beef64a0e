//! Stop signal shared by the job loops and the API server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;

/// Fans one stop request out to every subscriber.
///
/// Job loops `select!` on [`subscribe`](Self::subscribe) next to their
/// interval tick. A pass already in flight is allowed to finish; only the
/// next tick is abandoned.
#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Whether a stop was already requested. Loops spawned after the
    /// broadcast check this instead of waiting on a receiver.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub fn shutdown(&self) {
        if !self.triggered.swap(true, Ordering::AcqRel) {
            tracing::info!("stopping job loops");
        }
        // No receivers just means nothing is running yet.
        let _ = self.tx.send(());
    }

    /// Block until SIGINT or SIGTERM, then stop.
    pub async fn wait_for_signal(&self) {
        let name = tokio::select! {
            _ = signal::ctrl_c() => "SIGINT",
            _ = terminate() => "SIGTERM",
        };
        tracing::info!(signal = name, "shutdown requested");
        self.shutdown();
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_loop_sees_the_stop() {
        let controller = ShutdownController::new();
        let mut proposals = controller.subscribe();
        let mut sweep = controller.subscribe();
        assert!(!controller.is_triggered());

        controller.shutdown();
        assert!(proposals.recv().await.is_ok());
        assert!(sweep.recv().await.is_ok());
        assert!(controller.is_triggered());
    }

    #[test]
    fn stop_without_subscribers_is_recorded() {
        let controller = ShutdownController::new();
        controller.shutdown();
        controller.shutdown();
        assert!(controller.clone().is_triggered());
    }
}
