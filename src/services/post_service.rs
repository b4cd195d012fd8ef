//! Posts service composition, wired once at startup.
//!
//! The chain runs resource → contract → repository → service; each stage is
//! a pure composition step, and a failure in any of them aborts startup.

use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::domain::schema::FieldKind;
use crate::domain::{define_contract, define_resource, Caller, DomainError};
use crate::infrastructure::repository::{define_repository, Repository};
use crate::models::post;
use crate::services::service_builder::{define_service, CustomOperation, OnNull, Service};

pub type PostsService = Service<post::Entity>;

pub fn build_posts_service(db: &DatabaseConnection) -> Result<Arc<PostsService>, DomainError> {
    let resource = define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("user_id")
        .enable_filter("title", FieldKind::Text)
        .enable_filter("published", FieldKind::Boolean)
        .done()?;

    let contract = define_contract(&resource).register_all_standard().done();

    let repository = Arc::new(
        define_repository(db.clone(), resource)
            .register_contract(contract.clone())
            .register_standard_operations()
            .done()?,
    );

    let service = define_service()
        .register_repository(repository)
        .register_contract(contract)
        .register_standard_operations()
        .add_service("latest", latest_post)?
        .add_service("publish", publish_post)?
        .done()?;

    Ok(Arc::new(service))
}

/// The caller's most recently created active post. Having none is a normal
/// outcome, so the operation returns rather than throws.
fn latest_post(repository: Arc<Repository<post::Entity>>) -> CustomOperation {
    CustomOperation {
        on_null: OnNull::Return,
        run: Arc::new(move |caller: Caller, _payload: Value| {
            let repository = repository.clone();
            let fut: BoxFuture<'static, Result<Option<Value>, DomainError>> =
                Box::pin(async move {
                    let page = repository
                        .list(&caller, json!({ "limit": 1, "sort": "-created_at" }))
                        .await?;
                    Ok(page
                        .get("items")
                        .and_then(Value::as_array)
                        .and_then(|items| items.first())
                        .cloned())
                });
            fut
        }),
    }
}

/// Mark an owned post as published. A missing or foreign post is
/// exceptional here, so absence surfaces as `NotFound`.
fn publish_post(repository: Arc<Repository<post::Entity>>) -> CustomOperation {
    CustomOperation {
        on_null: OnNull::Throw,
        run: Arc::new(move |caller: Caller, payload: Value| {
            let repository = repository.clone();
            let fut: BoxFuture<'static, Result<Option<Value>, DomainError>> =
                Box::pin(async move {
                    let Some(id) = payload.get("id").and_then(Value::as_i64) else {
                        return Err(DomainError::invalid_field("id", "must be an integer"));
                    };
                    match repository
                        .update(&caller, id, json!({ "published": true }))
                        .await
                    {
                        Ok(updated) => Ok(Some(updated)),
                        Err(DomainError::NotFound) => Ok(None),
                        Err(err) => Err(err),
                    }
                });
            fut
        }),
    }
}
