//! Run the scheduler in the foreground.

use crate::error::CliResult;
use letterbox::Letterbox;
use letterbox::config::Settings;
use tokio::sync::watch;
use tracing::info;

pub async fn run(settings: &Settings) -> CliResult<()> {
    let letterbox = Letterbox::from_settings(settings)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = tokio::spawn(async move { letterbox.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping");
    // The worker may already have exited with an error; its result is reported below.
    let _ = shutdown_tx.send(true);

    worker.await??;
    Ok(())
}
