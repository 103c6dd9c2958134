//! Interval job scheduler using tokio-cron-scheduler.

use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use tradeboard_core::services::PostPublisher;

use crate::config::env_or;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Period of the publisher tick.
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let interval_secs: u64 = env_or("SCHEDULER_INTERVAL_SECS", 60);
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }
}

/// Job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Run `task` every `period`. While a run is still in progress, the
    /// ticks that fall due are skipped instead of overlapping it.
    pub async fn add_interval<F, Fut>(&self, period: Duration, task: F) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let running = std::sync::Arc::new(tokio::sync::Mutex::new(()));

        let job = Job::new_repeated_async(period, move |_uuid, _lock| {
            let task = task.clone();
            let running = running.clone();
            Box::pin(async move {
                let Ok(_guard) = running.try_lock() else {
                    tracing::debug!("Previous tick still running, skipping");
                    return;
                };
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(period_secs = period.as_secs(), job_id = %id, "Interval job registered");
        Ok(id)
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Register the scheduled-post publisher and start the scheduler.
///
/// Returns `None` when scheduling is disabled; posts then stay scheduled
/// until promoted some other way.
pub async fn start_publisher(
    config: SchedulerConfig,
    publisher: PostPublisher,
) -> Result<Option<Scheduler>, JobSchedulerError> {
    if !config.enabled {
        tracing::warn!("Scheduler disabled; scheduled posts will not be published");
        return Ok(None);
    }

    let period = config.interval;
    let scheduler = Scheduler::new(config).await?;
    scheduler
        .add_interval(period, move || {
            let publisher = publisher.clone();
            async move { publisher.tick().await }
        })
        .await?;
    scheduler.start().await?;
    Ok(Some(scheduler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_one_minute() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn disabled_config_starts_nothing() {
        let posts = std::sync::Arc::new(tradeboard_infra::InMemoryPostRepository::new());
        let config = SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        };

        let scheduler = start_publisher(config, PostPublisher::new(posts)).await.unwrap();
        assert!(scheduler.is_none());
    }
}
