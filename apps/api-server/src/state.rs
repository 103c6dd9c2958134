//! Application state - shared across all handlers.

use std::sync::Arc;

use tradeboard_core::ports::{PasswordService, PostRepository, TokenService, UserRepository};
use tradeboard_core::services::{AuthService, PostPublisher, PostService, UserAdminService};
use tradeboard_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig, JwtTokenService,
};

#[cfg(feature = "postgres")]
use tradeboard_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenService>,
    pub auth: AuthService,
    pub users: UserAdminService,
    pub posts: PostService,
    pub publisher: PostPublisher,
}

impl AppState {
    /// Build the state from configuration. Falls back to the in-memory stores
    /// when no database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (users, posts) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(db) => {
                    let users: Arc<dyn UserRepository> = db.users();
                    let posts: Arc<dyn PostRepository> = db.posts();
                    (users, posts)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                    in_memory_stores()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory_stores()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (users, posts) = {
            tracing::info!("Running without postgres feature - using in-memory stores");
            in_memory_stores()
        };

        let state = Self::assemble(users, posts, config.jwt.clone());
        tracing::info!("Application state initialized");
        state
    }

    /// Fully in-memory state, for tests and local runs.
    pub fn in_memory(jwt: JwtConfig) -> Self {
        let (users, posts) = in_memory_stores();
        Self::assemble(users, posts, jwt)
    }

    fn assemble(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>, jwt: JwtConfig) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(jwt));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        Self {
            auth: AuthService::new(users.clone(), passwords.clone(), tokens.clone()),
            users: UserAdminService::new(users, passwords),
            posts: PostService::new(posts.clone()),
            publisher: PostPublisher::new(posts),
            tokens,
        }
    }
}

fn in_memory_stores() -> (Arc<dyn UserRepository>, Arc<dyn PostRepository>) {
    (
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryPostRepository::new()),
    )
}
