use anyhow::Result;
use glance_core::{Config, Worker};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How often the consumer side re-reads the presence snapshot.
const RENDER_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("glanced starting");

    let config = Config::from_env();
    tracing::info!(
        store = %config.store_path.display(),
        faces = %config.faces_dir.display(),
        tick = ?config.tick_interval,
        "configuration loaded"
    );

    let ctx = Arc::new(config.build_context()?);
    let tracker = Arc::clone(&ctx.tracker);

    let worker = Worker::spawn(Arc::clone(&ctx))?;
    tracing::info!("glanced ready");

    // Consumer side: report presence changes at its own cadence,
    // reading only snapshots.
    let render = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RENDER_INTERVAL);
        let mut last: Vec<String> = Vec::new();
        loop {
            interval.tick().await;
            let present = tracker.snapshot();
            if present != last {
                tracing::info!(present = ?present, "presence changed");
                last = present;
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("glanced shutting down");
    render.abort();

    worker.stop();
    tokio::task::spawn_blocking(move || worker.join()).await?;
    tracing::info!("glanced stopped");

    Ok(())
}
