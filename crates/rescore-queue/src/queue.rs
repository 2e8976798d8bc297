//! Job queue using Redis Streams.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::QueueJob;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// TTL of enqueue dedup keys
    pub dedup_ttl: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "rescore:jobs".to_string(),
            consumer_group: "rescore:workers".to_string(),
            dlq_stream_name: "rescore:dlq".to_string(),
            dedup_ttl: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM").unwrap_or(defaults.dlq_stream_name),
            dedup_ttl: Duration::from_secs(
                std::env::var("QUEUE_DEDUP_TTL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }
}

/// A message claimed from the stream.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message_id: String,
    pub job: QueueJob,
}

/// Job queue client.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    async fn connection(&self) -> QueueResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Bootstrap the stream and its consumer group.
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let created: Result<(), redis::RedisError> = conn
            .xgroup_create_mkstream(
                &self.config.stream_name,
                &self.config.consumer_group,
                "$",
            )
            .await;

        match created {
            Ok(()) => info!(group = %self.config.consumer_group, "Created consumer group"),
            // An existing group is the normal case on restart.
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!(group = %self.config.consumer_group, "Consumer group already exists");
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a job.
    ///
    /// Each record id may enter the stream at most once per dedup window; the
    /// marker is claimed with a single `SET NX EX` so two racing producers
    /// cannot both enqueue.
    pub async fn enqueue(&self, job: QueueJob) -> QueueResult<String> {
        let mut conn = self.connection().await?;

        let payload = serde_json::to_string(&job)?;
        let idempotency_key = job.idempotency_key();
        let dedup_key = format!("rescore:dedup:{idempotency_key}");

        let claimed: bool = redis::cmd("SET")
            .arg(&dedup_key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.config.dedup_ttl.as_secs())
            .query_async(&mut conn)
            .await?;
        if !claimed {
            warn!(idempotency_key, "Duplicate job rejected");
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let appended: Result<String, redis::RedisError> = conn
            .xadd(
                &self.config.stream_name,
                "*",
                &[("job", payload.as_str()), ("key", idempotency_key.as_str())],
            )
            .await;
        let message_id = match appended {
            Ok(id) => id,
            Err(e) => {
                // Release the marker so a retry is not locked out for the
                // whole dedup window.
                let _: Result<(), _> = conn.del(&dedup_key).await;
                return Err(QueueError::Redis(e));
            }
        };

        info!(
            kind = job.kind(),
            record_id = %job.record_id(),
            message_id,
            "Enqueued job"
        );

        Ok(message_id)
    }

    /// Claim the next message for this consumer, blocking up to `block`.
    ///
    /// Undecodable payloads are moved to the DLQ and acknowledged here, so
    /// callers only ever see well-formed jobs.
    pub async fn dequeue(&self, consumer: &str, block: Duration) -> QueueResult<Option<Delivery>> {
        let mut conn = self.connection().await?;

        let options = StreamReadOptions::default()
            .group(&self.config.consumer_group, consumer)
            .count(1)
            .block(block.as_millis() as usize);

        let reply: StreamReadReply = conn
            .xread_options(&[&self.config.stream_name], &[">"], &options)
            .await?;

        for key in reply.keys {
            for id in key.ids {
                let Some(value) = id.map.get("job") else {
                    warn!(message_id = %id.id, "Stream message without job field, dead-lettering");
                    self.dead_letter_raw(&id.id, "<missing job field>", "no job field")
                        .await?;
                    continue;
                };

                let payload: String = redis::from_redis_value(value)?;
                match serde_json::from_str::<QueueJob>(&payload) {
                    Ok(job) => {
                        return Ok(Some(Delivery {
                            message_id: id.id,
                            job,
                        }));
                    }
                    Err(e) => {
                        warn!(message_id = %id.id, error = %e, "Undecodable job payload, dead-lettering");
                        self.dead_letter_raw(&id.id, &payload, &e.to_string()).await?;
                    }
                }
            }
        }

        Ok(None)
    }

    /// Acknowledge a delivered message and drop it from the stream.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let _: () = conn
            .xack(
                &self.config.stream_name,
                &self.config.consumer_group,
                &[message_id],
            )
            .await?;
        let _: () = conn.xdel(&self.config.stream_name, &[message_id]).await?;

        debug!(message_id, "Acknowledged job");
        Ok(())
    }

    /// Move a job to the dead letter queue.
    pub async fn dlq(&self, message_id: &str, job: &QueueJob, error: &str) -> QueueResult<()> {
        let payload = serde_json::to_string(job)?;
        self.dead_letter_raw(message_id, &payload, error).await?;
        warn!(
            kind = job.kind(),
            record_id = %job.record_id(),
            error,
            "Moved job to DLQ"
        );
        Ok(())
    }

    async fn dead_letter_raw(
        &self,
        message_id: &str,
        payload: &str,
        error: &str,
    ) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let _: String = conn
            .xadd(
                &self.config.dlq_stream_name,
                "*",
                &[("job", payload), ("error", error), ("original_id", message_id)],
            )
            .await?;

        self.ack(message_id).await
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        Ok(conn.xlen(&self.config.stream_name).await?)
    }

    /// Get DLQ length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        Ok(conn.xlen(&self.config.dlq_stream_name).await?)
    }
}
