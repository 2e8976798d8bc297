//! Job executor.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info};

use rescore_queue::JobQueue;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::processor::{self, ProcessingContext};

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    ctx: Arc<ProcessingContext>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue, ctx: ProcessingContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);

        Self {
            config,
            queue: Arc::new(queue),
            ctx: Arc::new(ctx),
            job_semaphore,
            shutdown,
        }
    }

    /// Start the executor. Runs until [`Self::shutdown`] is signalled.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            consumer = %self.config.consumer_name,
            "Starting job executor"
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                delivered = self.queue.dequeue(&self.config.consumer_name, self.config.dequeue_block) => {
                    match delivered {
                        Ok(Some(delivery)) => self.dispatch(delivery).await,
                        Ok(None) => {
                            // Block timeout elapsed with nothing to do.
                        }
                        Err(e) => {
                            error!(error = %e, "Dequeue failed, backing off");
                            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }

        // Let in-flight jobs drain before returning.
        let _ = self
            .job_semaphore
            .acquire_many(self.config.max_concurrent_jobs as u32)
            .await;

        info!("Job executor stopped");
        Ok(())
    }

    async fn dispatch(&self, delivery: rescore_queue::Delivery) {
        let permit = match self.job_semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let queue = self.queue.clone();
        let ctx = self.ctx.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let kind = delivery.job.kind();

            match processor::process(&ctx, &delivery.job).await {
                Ok(()) => {
                    if let Err(e) = queue.ack(&delivery.message_id).await {
                        error!(error = %e, message_id = %delivery.message_id, "Failed to ack job");
                    }
                }
                Err(e) => {
                    // The processor already terminalized the record where it
                    // could; a message here means even that write failed.
                    error!(
                        error = %e,
                        kind,
                        record_id = %delivery.job.record_id(),
                        "Job processing failed, dead-lettering"
                    );
                    if let Err(dlq_err) = queue
                        .dlq(&delivery.message_id, &delivery.job, &e.to_string())
                        .await
                    {
                        error!(error = %dlq_err, message_id = %delivery.message_id, "Failed to dead-letter job");
                    }
                }
            }
        });
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
