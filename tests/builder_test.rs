//! Construction-time guarantees of the composition chain, exercised without
//! the HTTP layer.

use std::sync::Arc;

use futures::future::BoxFuture;
use inkpost::db;
use inkpost::domain::{
    define_contract, define_resource, Caller, Comparison, DomainError, FieldKind, FieldSpec,
    OperationKind, OperationSchemas, QuerySpec, Resource, Schema,
};
use inkpost::infrastructure::{define_repository, OperationFn};
use inkpost::models::post;
use inkpost::services::{define_service, CustomOperation, OnNull};
use serde_json::{json, Value};

fn posts_resource() -> Arc<Resource<post::Entity>> {
    define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("user_id")
        .enable_filter("title", FieldKind::Text)
        .enable_filter("published", FieldKind::Boolean)
        .done()
        .expect("valid resource")
}

#[test]
fn resource_rejects_unknown_identity_column() {
    let err = define_resource::<post::Entity>()
        .id_column("uuid")
        .owner_column("user_id")
        .done()
        .unwrap_err();
    assert!(matches!(err, DomainError::Construction(_)));
}

#[test]
fn resource_rejects_unknown_owner_column() {
    let err = define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("owner")
        .done()
        .unwrap_err();
    assert!(matches!(err, DomainError::Construction(_)));
}

#[test]
fn resource_rejects_bad_filters() {
    // Unknown column
    let err = define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("user_id")
        .enable_filter("category", FieldKind::Text)
        .done()
        .unwrap_err();
    assert!(matches!(err, DomainError::Construction(_)));

    // Kind mismatch with the catalog
    let err = define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("user_id")
        .enable_filter("published", FieldKind::Integer)
        .done()
        .unwrap_err();
    assert!(matches!(err, DomainError::Construction(_)));

    // Server-managed column
    let err = define_resource::<post::Entity>()
        .id_column("id")
        .owner_column("user_id")
        .enable_filter("user_id", FieldKind::Integer)
        .done()
        .unwrap_err();
    assert!(matches!(err, DomainError::Construction(_)));
}

#[test]
fn contract_rejects_duplicate_registration() {
    let resource = posts_resource();
    let err = define_contract(&resource)
        .register_standard(OperationKind::Create)
        .expect("first registration")
        .register_standard(OperationKind::Create)
        .err()
        .expect("duplicate registration must fail");
    assert!(matches!(err, DomainError::Construction(_)));
}

#[test]
fn contract_keeps_custom_registrations_on_fill() {
    let resource = posts_resource();
    let custom = OperationSchemas {
        input: Schema::new(vec![FieldSpec::new("title", FieldKind::Text, true, false)]),
        output: Schema::new(vec![
            FieldSpec::new("id", FieldKind::Integer, true, false),
            FieldSpec::new("user_id", FieldKind::Integer, true, false),
            FieldSpec::new("title", FieldKind::Text, true, false),
        ]),
    };
    let contract = define_contract(&resource)
        .register(OperationKind::Create, custom)
        .expect("custom registration")
        .register_all_standard()
        .done();

    assert!(OperationKind::ALL
        .into_iter()
        .all(|kind| contract.supports(kind)));
    // The custom create schema survived the fill
    let schemas = contract.schemas(OperationKind::Create).unwrap();
    assert_eq!(schemas.input.fields().len(), 1);
    // Derived schemas exclude server-managed fields from inputs
    let update = contract.schemas(OperationKind::Update).unwrap();
    assert!(update.input.field("user_id").is_none());
    assert!(update.input.field("is_active").is_none());
    assert!(update.input.field("title").is_some());
}

#[tokio::test]
async fn repository_exposes_each_registered_operation() {
    let db = db::init_db("sqlite::memory:").await.expect("init db");
    let resource = posts_resource();
    let contract = define_contract(&resource).register_all_standard().done();

    let repository = define_repository(db, resource)
        .register_contract(contract)
        .register_standard_operations()
        .done()
        .expect("complete repository");

    for kind in OperationKind::ALL {
        assert!(repository.supports(kind), "missing binding for {}", kind);
    }
}

#[tokio::test]
async fn repository_requires_a_binding_per_contract_operation() {
    let db = db::init_db("sqlite::memory:").await.expect("init db");
    let resource = posts_resource();
    let contract = define_contract(&resource).register_all_standard().done();

    let noop: OperationFn = Arc::new(|_caller, _payload| {
        let fut: BoxFuture<'static, Result<Value, DomainError>> =
            Box::pin(async { Ok(Value::Null) });
        fut
    });

    // Only one of five operations bound
    let err = define_repository(db, resource)
        .register_contract(contract)
        .register_operation(OperationKind::Create, noop)
        .done()
        .err()
        .expect("missing bindings must fail");
    assert!(matches!(err, DomainError::Construction(_)));
}

#[tokio::test]
async fn service_applies_null_policy_per_operation() {
    let db = db::init_db("sqlite::memory:").await.expect("init db");
    let resource = posts_resource();
    let contract = define_contract(&resource).register_all_standard().done();
    let repository = Arc::new(
        define_repository(db, resource)
            .register_contract(contract.clone())
            .register_standard_operations()
            .done()
            .expect("complete repository"),
    );

    let empty = |on_null: OnNull| {
        move |_repo| CustomOperation {
            on_null,
            run: Arc::new(|_caller: Caller, _payload: Value| {
                let fut: BoxFuture<'static, Result<Option<Value>, DomainError>> =
                    Box::pin(async { Ok(None) });
                fut
            }),
        }
    };

    let service = define_service()
        .register_repository(repository)
        .register_contract(contract)
        .register_standard_operations()
        .add_service("draft_count", empty(OnNull::Return))
        .expect("register draft_count")
        .add_service("required_thing", empty(OnNull::Throw))
        .expect("register required_thing")
        .done()
        .expect("complete service");

    let caller = Caller::new(1, "session");

    let value = service.call("draft_count", &caller, json!({})).await;
    assert_eq!(value.unwrap(), Value::Null);

    let err = service.call("required_thing", &caller, json!({})).await;
    assert!(matches!(err, Err(DomainError::NotFound)));
}

#[tokio::test]
async fn service_rejects_colliding_and_duplicate_names() {
    let db = db::init_db("sqlite::memory:").await.expect("init db");
    let resource = posts_resource();
    let contract = define_contract(&resource).register_all_standard().done();
    let repository = Arc::new(
        define_repository(db, resource)
            .register_contract(contract.clone())
            .register_standard_operations()
            .done()
            .expect("complete repository"),
    );

    let noop = |_repo| CustomOperation {
        on_null: OnNull::Return,
        run: Arc::new(|_caller: Caller, _payload: Value| {
            let fut: BoxFuture<'static, Result<Option<Value>, DomainError>> =
                Box::pin(async { Ok(None) });
            fut
        }),
    };

    let err = define_service()
        .register_repository(repository.clone())
        .register_contract(contract.clone())
        .add_service("create", noop)
        .err()
        .expect("colliding name must fail");
    assert!(matches!(err, DomainError::Construction(_)));

    let err = define_service()
        .register_repository(repository)
        .register_contract(contract)
        .add_service("extra", noop)
        .expect("first registration")
        .add_service("extra", noop)
        .err()
        .expect("duplicate name must fail");
    assert!(matches!(err, DomainError::Construction(_)));
}

#[test]
fn query_spec_always_scopes_by_owner_and_active_flag() {
    let resource = posts_resource();
    let caller = Caller::new(7, "session");

    let input = json!({ "title": "rust", "limit": 2 });
    let spec = QuerySpec::for_list(&resource, &caller, input.as_object().unwrap())
        .expect("valid list input");

    assert!(spec.predicates.iter().any(|p| {
        p.column == "user_id" && p.op == Comparison::Eq && p.value == json!(7)
    }));
    assert!(spec
        .predicates
        .iter()
        .any(|p| p.column == "is_active" && p.value == json!(true)));
    assert!(spec
        .predicates
        .iter()
        .any(|p| p.column == "title" && p.op == Comparison::Contains));
    assert_eq!(spec.page.limit, 2);
    assert_eq!(spec.page.page, 0);
    // Newest first unless asked otherwise
    assert_eq!(spec.order.column, "created_at");
    assert!(spec.order.descending);
}

#[test]
fn query_spec_rejects_bad_pagination_and_sort() {
    let resource = posts_resource();
    let caller = Caller::new(7, "session");

    let input = json!({ "limit": 0 });
    let err = QuerySpec::for_list(&resource, &caller, input.as_object().unwrap()).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let input = json!({ "page": -1 });
    let err = QuerySpec::for_list(&resource, &caller, input.as_object().unwrap()).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let input = json!({ "sort": "-password_hash" });
    let err = QuerySpec::for_list(&resource, &caller, input.as_object().unwrap()).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}
