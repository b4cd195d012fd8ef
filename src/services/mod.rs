//! Services Layer
//!
//! Business-layer objects built once at startup and shared read-only across
//! requests. HTTP handlers call these; they never touch the ORM directly.

pub mod post_service;
pub mod service_builder;

pub use post_service::{build_posts_service, PostsService};
pub use service_builder::{define_service, CustomFn, CustomOperation, OnNull, Service};
