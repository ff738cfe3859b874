//! Background idle sweep

use crate::directory::ActorDirectory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Periodically evicts idle actors from a directory
///
/// Runs until `stop()` is called or the task is dropped.
pub struct IdleSweepTask {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl IdleSweepTask {
    /// Start sweeping `directory` every `quantum`
    pub fn start(directory: Arc<ActorDirectory>, quantum: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(quantum) => {}
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Idle sweep task shutting down");
                        break;
                    }
                }

                let evicted = directory.sweep_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, "Background idle sweep completed");
                }
            }
        });

        Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Stop the task and wait for it to exit
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Whether the task is still scheduled
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for IdleSweepTask {
    fn drop(&mut self) {
        // Signal shutdown if not already done
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}
