//! Worker binary entry point.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rescore_queue::JobQueue;
use rescore_worker::{JobExecutor, ProcessingContext, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerConfig::from_env();
    let queue = JobQueue::from_env()?;
    let ctx = ProcessingContext::new(config.clone()).await?;

    let executor = Arc::new(JobExecutor::new(config, queue, ctx));

    let signal_executor = executor.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT");
            signal_executor.shutdown();
        }
    });

    executor.run().await?;
    Ok(())
}
