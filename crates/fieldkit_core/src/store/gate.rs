//! One-shot readiness gate.
//!
//! # Responsibility
//! - Signal bootstrap/reload completion to every later access path.
//!
//! # Invariants
//! - Created once per store; settles at most once; never reset.
//! - Consumers awaiting before settlement suspend; consumers arriving after
//!   settlement proceed immediately.

use log::{info, warn};
use tokio::sync::watch;

/// Single-resolution asynchronous signal.
pub struct ReadyGate {
    sender: watch::Sender<bool>,
}

impl ReadyGate {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    /// Settles the gate. Returns `false` when it was already settled; the
    /// second attempt is a logged no-op, never a double resolution.
    pub fn settle(&self) -> bool {
        let settled = self.sender.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if settled {
            info!("event=gate_settled module=store status=ok");
        } else {
            warn!("event=gate_settled module=store status=ignored reason=already_settled");
        }
        settled
    }

    pub fn is_settled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Suspends until the gate settles.
    pub async fn ready(&self) {
        let mut receiver = self.sender.subscribe();
        while !*receiver.borrow_and_update() {
            // The sender lives as long as the store, so a closed channel can
            // only mean teardown; treat it as settlement to avoid a hang.
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}
