//! # Tradeboard API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use api_server::telemetry::init_telemetry;
use api_server::{AppConfig, AppState, configure_routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_telemetry(&config.telemetry);

    tracing::info!(
        host = %config.host,
        port = config.port,
        "Starting Tradeboard API Server"
    );

    let state = AppState::new(&config).await;

    #[cfg(feature = "scheduler")]
    let mut scheduler =
        api_server::background::start_publisher(config.scheduler.clone(), state.publisher.clone()).await?;

    #[cfg(feature = "rate-limit")]
    let limiter = {
        use std::sync::Arc;
        use tradeboard_infra::InMemoryRateLimiter;

        let limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())?);
        let sweeper = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                sweeper.retain_recent();
            }
        });
        limiter
    };

    let data = web::Data::new(state);

    HttpServer::new(move || {
        let app = App::new();

        #[cfg(feature = "rate-limit")]
        let app = app.wrap(api_server::middleware::rate_limit::RateLimitMiddleware::new(limiter.clone()));

        app.wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    tracing::info!("Server stopped");
    Ok(())
}
