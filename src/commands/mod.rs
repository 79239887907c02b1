pub mod config;
pub mod render;
pub mod scaffold;
pub mod status;
pub mod walk;

use crate::promise::{Outcome, Promise};
use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc;

/// Blocks the calling thread until `promise` settles and returns its outcome.
///
/// Must not be called from a thread whose progress the settlement depends
/// on, such as a worker of the pool completing it. A promise that never
/// settles blocks forever.
///
/// # Errors
///
/// Returns an error if the settlement callback was dropped without running.
pub fn wait_for<T, E>(promise: &Promise<T, E>) -> Result<Arc<Outcome<T, E>>>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    promise.on_settled(move |_| {
        let _ = tx.send(());
    });
    rx.recv()
        .map_err(|_| anyhow::anyhow!("Operation was dropped before completing"))?;
    promise
        .outcome()
        .ok_or_else(|| anyhow::anyhow!("Operation settled without an outcome"))
}
