use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::ports::PostRepository;

/// Promotes due scheduled posts. Runs outside the authorization gate.
#[derive(Clone)]
pub struct PostPublisher {
    posts: Arc<dyn PostRepository>,
}

impl PostPublisher {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// One deterministic pass at `now`. Returns the number of promoted posts.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let promoted = self.posts.promote_due(now).await?;
        if promoted > 0 {
            tracing::info!(promoted, "Published scheduled posts");
        } else {
            tracing::debug!("No scheduled posts due");
        }
        Ok(promoted)
    }

    /// Scheduled entry point. Failures are logged and left for the next tick.
    pub async fn tick(&self) {
        if let Err(e) = self.run_once(Utc::now()).await {
            tracing::error!(error = %e, "Scheduled publish failed");
        }
    }
}
