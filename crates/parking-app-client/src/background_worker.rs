//! The async runtime the network requests are spawned on

use anyhow::Context as _;
use tokio::runtime::{Builder, Handle};

/// Starts a multi threaded runtime on its own thread and returns a handle
/// to it
///
/// The thread never finishes so the runtime lives as long as the app does.
/// The caller must `enter` the handle before any request is sent
pub fn start_runtime() -> anyhow::Result<Handle> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .thread_name("parking-net")
        .build()
        .context("unable to create runtime")?;
    let handle = rt.handle().clone();
    std::thread::Builder::new()
        .name("background-worker".into())
        .spawn(move || {
            tracing::info!("Background worker started");
            rt.block_on(std::future::pending::<()>())
        })
        .context("failed to start background worker thread")?;
    Ok(handle)
}
