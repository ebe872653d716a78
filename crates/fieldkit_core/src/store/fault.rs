//! Fault-reporting seam.
//!
//! # Responsibility
//! - Carry human-readable failure messages out of the storage core.
//!
//! # Invariants
//! - No structured error object crosses this boundary; callers who need
//!   typed errors use the accessor-surface `Result`s instead.

use log::error;

/// Sink for human-readable failure reports.
///
/// The UI layer supplies its own implementation (dialogs, toasts); the
/// default forwards to the log facade.
pub trait FaultReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Default reporter writing through the `log` facade.
pub struct LogFaultReporter;

impl FaultReporter for LogFaultReporter {
    fn report(&self, message: &str) {
        error!("event=fault module=store status=error message={message}");
    }
}
