pub mod auth;
pub mod config;
pub mod db;
pub mod repository;
pub mod seed;
pub mod state;

pub use repository::{define_repository, OperationFn, Repository, RepositoryBuilder};
pub use state::AppState;
