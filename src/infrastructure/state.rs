//! Application state containing the composed services and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::DomainError;
use crate::services::{build_posts_service, PostsService};

/// Application state shared across all handlers. Everything in here is built
/// once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Posts service
    pub posts: Arc<PostsService>,
}

impl AppState {
    /// Compose all services. A construction failure here must abort startup;
    /// it never reaches request handling.
    pub fn new(db: DatabaseConnection) -> Result<Self, DomainError> {
        let posts = build_posts_service(&db)?;
        Ok(Self { db, posts })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Allow extracting DatabaseConnection from AppState in handlers that talk to
// the database directly (auth).
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
