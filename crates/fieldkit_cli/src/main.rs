//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `fieldkit_core` linkage and the
//!   in-memory bootstrap path.
//! - Keep output deterministic for quick local sanity checks.

use fieldkit_core::{Store, StoreConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("fieldkit_core version={}", fieldkit_core::core_version());

    let store = Store::open(&StoreConfig::in_memory()).await;
    let names = store.names().await;
    println!("fieldkit_core tables={}", names.join(","));
}
