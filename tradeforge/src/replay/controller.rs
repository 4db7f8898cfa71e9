use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Cooperative pause/resume controller shared between a replay driver and its host.
///
/// Pausing while paused is a no-op and resume is idempotent. The driver awaits
/// [`wait_until_resumed`](Self::wait_until_resumed) between events; no in-flight fill is ever
/// interrupted.
#[derive(Debug, Clone)]
pub struct ReplayController {
    paused: Arc<watch::Sender<bool>>,
}

impl Default for ReplayController {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayController {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            paused: Arc::new(paused),
        }
    }

    /// Request a pause at the next between-events point.
    pub fn pause(&self) {
        if !self.paused.send_replace(true) {
            debug!("replay paused");
        }
    }

    /// Resume a paused replay.
    pub fn resume(&self) {
        if self.paused.send_replace(false) {
            debug!("replay resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Suspend until the controller is not paused.
    pub async fn wait_until_resumed(&self) {
        let mut paused = self.paused.subscribe();
        loop {
            if !*paused.borrow_and_update() {
                return;
            }
            if paused.changed().await.is_err() {
                // controller dropped while paused: nothing will ever resume us, so proceed
                return;
            }
        }
    }
}
