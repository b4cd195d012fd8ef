//! Repository builder: binds a resource and its contract to concrete
//! sea-orm queries.
//!
//! `register_standard_operations` generates one query binding per operation
//! the contract declares. Every binding validates its input against the
//! contract before touching the database, scopes by the caller's identity,
//! and honors the soft-delete flag. Cross-owner access is indistinguishable
//! from absence.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::domain::contract::{Contract, OperationKind, OperationSchemas};
use crate::domain::errors::DomainError;
use crate::domain::query::{Comparison, QuerySpec};
use crate::domain::resource::marker::{Missing, Present};
use crate::domain::resource::{Resource, ResourceTable, ACTIVE_FLAG, CREATED_AT, UPDATED_AT};
use crate::domain::schema::FieldKind;
use crate::domain::Caller;

/// A query binding: one operation, executed for one caller.
pub type OperationFn =
    Arc<dyn Fn(Caller, Value) -> BoxFuture<'static, Result<Value, DomainError>> + Send + Sync>;

/// An immutable repository over entity `E`.
pub struct Repository<E: EntityTrait + ResourceTable> {
    contract: Arc<Contract<E>>,
    bindings: BTreeMap<OperationKind, OperationFn>,
}

impl<E: EntityTrait + ResourceTable> Repository<E> {
    pub fn contract(&self) -> &Arc<Contract<E>> {
        &self.contract
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        self.bindings.contains_key(&kind)
    }

    /// Dispatch an operation by kind.
    pub async fn invoke(
        &self,
        kind: OperationKind,
        caller: Caller,
        payload: Value,
    ) -> Result<Value, DomainError> {
        let Some(binding) = self.bindings.get(&kind) else {
            return Err(DomainError::construction(format!(
                "operation `{}` has no query binding",
                kind
            )));
        };
        binding(caller, payload).await
    }

    pub async fn create(&self, caller: &Caller, input: Value) -> Result<Value, DomainError> {
        self.invoke(OperationKind::Create, caller.clone(), input).await
    }

    pub async fn get_by_id(&self, caller: &Caller, id: i64) -> Result<Value, DomainError> {
        let payload = self.id_payload(id);
        self.invoke(OperationKind::GetById, caller.clone(), payload)
            .await
    }

    pub async fn list(&self, caller: &Caller, params: Value) -> Result<Value, DomainError> {
        self.invoke(OperationKind::List, caller.clone(), params).await
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        patch: Value,
    ) -> Result<Value, DomainError> {
        let payload = json!({ "id": id, "data": patch });
        self.invoke(OperationKind::Update, caller.clone(), payload)
            .await
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<Value, DomainError> {
        let payload = self.id_payload(id);
        self.invoke(OperationKind::Delete, caller.clone(), payload)
            .await
    }

    fn id_payload(&self, id: i64) -> Value {
        let mut payload = Map::new();
        payload.insert(
            self.contract.resource().id_field().to_owned(),
            Value::from(id),
        );
        Value::Object(payload)
    }
}

/// Start building a repository for `resource` over the given connection.
pub fn define_repository<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
) -> RepositoryBuilder<E, Missing, Missing>
where
    E: EntityTrait + ResourceTable,
{
    RepositoryBuilder {
        db,
        resource,
        contract: None,
        bindings: BTreeMap::new(),
        _state: PhantomData,
    }
}

/// Builder for [`Repository`]. The contract registration and the presence of
/// query bindings are tracked as marker types; completeness of the bindings
/// against the contract is re-checked at `done()`.
pub struct RepositoryBuilder<E: EntityTrait + ResourceTable, C, B> {
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Option<Arc<Contract<E>>>,
    bindings: BTreeMap<OperationKind, OperationFn>,
    _state: PhantomData<fn() -> (C, B)>,
}

impl<E, C, B> RepositoryBuilder<E, C, B>
where
    E: EntityTrait + ResourceTable,
{
    pub fn register_contract(self, contract: Arc<Contract<E>>) -> RepositoryBuilder<E, Present, B> {
        RepositoryBuilder {
            db: self.db,
            resource: self.resource,
            contract: Some(contract),
            bindings: self.bindings,
            _state: PhantomData,
        }
    }
}

impl<E, B> RepositoryBuilder<E, Present, B>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    /// Generate a query binding for every operation the contract declares.
    pub fn register_standard_operations(mut self) -> RepositoryBuilder<E, Present, Present> {
        if let Some(contract) = &self.contract {
            for kind in contract.operations() {
                let binding = standard_binding::<E>(
                    self.db.clone(),
                    self.resource.clone(),
                    contract.clone(),
                    kind,
                );
                self.bindings.insert(kind, binding);
            }
        }
        RepositoryBuilder {
            db: self.db,
            resource: self.resource,
            contract: self.contract,
            bindings: self.bindings,
            _state: PhantomData,
        }
    }

    /// Install a hand-written binding for one operation.
    pub fn register_operation(
        mut self,
        kind: OperationKind,
        binding: OperationFn,
    ) -> RepositoryBuilder<E, Present, Present> {
        self.bindings.insert(kind, binding);
        RepositoryBuilder {
            db: self.db,
            resource: self.resource,
            contract: self.contract,
            bindings: self.bindings,
            _state: PhantomData,
        }
    }
}

impl<E> RepositoryBuilder<E, Present, Present>
where
    E: EntityTrait + ResourceTable,
{
    /// Freeze the repository. Fails if any operation declared in the
    /// contract is left without a query binding.
    pub fn done(self) -> Result<Repository<E>, DomainError> {
        let Some(contract) = self.contract else {
            return Err(DomainError::construction(
                "a contract must be registered before done()",
            ));
        };
        for kind in contract.operations() {
            if !self.bindings.contains_key(&kind) {
                return Err(DomainError::construction(format!(
                    "operation `{}` has no query binding",
                    kind
                )));
            }
        }
        Ok(Repository {
            contract,
            bindings: self.bindings,
        })
    }
}

fn standard_binding<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    kind: OperationKind,
) -> OperationFn
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    Arc::new(move |caller, payload| {
        let db = db.clone();
        let resource = resource.clone();
        let contract = contract.clone();
        let fut: BoxFuture<'static, Result<Value, DomainError>> = match kind {
            OperationKind::Create => {
                Box::pin(run_create::<E>(db, resource, contract, caller, payload))
            }
            OperationKind::GetById => {
                Box::pin(run_get::<E>(db, resource, contract, caller, payload))
            }
            OperationKind::List => {
                Box::pin(run_list::<E>(db, resource, contract, caller, payload))
            }
            OperationKind::Update => {
                Box::pin(run_update::<E>(db, resource, contract, caller, payload))
            }
            OperationKind::Delete => {
                Box::pin(run_delete::<E>(db, resource, contract, caller, payload))
            }
        };
        fut
    })
}

async fn run_create<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    caller: Caller,
    payload: Value,
) -> Result<Value, DomainError>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    let schemas = schemas_for(&contract, OperationKind::Create)?;
    let input = schemas.input.validate(&payload)?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut model = <E::ActiveModel as ActiveModelTrait>::default();
    for (name, value) in &input {
        model.set(column::<E>(name)?, db_value(column_kind(&resource, name)?, value)?);
    }
    model.set(column::<E>(resource.owner_field())?, caller.user_id.into());
    model.set(column::<E>(ACTIVE_FLAG)?, true.into());
    model.set(column::<E>(CREATED_AT)?, now.clone().into());
    model.set(column::<E>(UPDATED_AT)?, now.into());

    let saved = model
        .insert(&db)
        .await
        .map_err(|e| DomainError::database("create", e))?;
    Ok(schemas.output.project(model_json("create", &saved)?))
}

async fn run_get<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    caller: Caller,
    payload: Value,
) -> Result<Value, DomainError>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    let schemas = schemas_for(&contract, OperationKind::GetById)?;
    let input = schemas.input.validate(&payload)?;
    let id = require_id(&input, resource.id_field())?;

    let row = scoped_select::<E>(&resource, id, &caller, true)?
        .one(&db)
        .await
        .map_err(|e| DomainError::database("get_by_id", e))?;
    let model = row.ok_or(DomainError::NotFound)?;
    Ok(schemas.output.project(model_json("get_by_id", &model)?))
}

async fn run_list<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    caller: Caller,
    payload: Value,
) -> Result<Value, DomainError>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    let schemas = schemas_for(&contract, OperationKind::List)?;
    let input = schemas.input.validate_query(&payload)?;
    let spec = QuerySpec::for_list(resource.as_ref(), &caller, &input)?;

    let mut cond = Condition::all();
    for predicate in &spec.predicates {
        let col = column::<E>(&predicate.column)?;
        cond = match predicate.op {
            Comparison::Contains => {
                cond.add(col.contains(predicate.value.as_str().unwrap_or_default()))
            }
            Comparison::Eq => match &predicate.value {
                Value::Bool(flag) => cond.add(col.eq(*flag)),
                Value::String(text) => cond.add(col.eq(text.as_str())),
                other => match other.as_i64() {
                    Some(n) => cond.add(col.eq(n)),
                    None => {
                        return Err(DomainError::construction(
                            "unsupported predicate value in list query",
                        ));
                    }
                },
            },
        };
    }

    let order_column = column::<E>(&spec.order.column)?;
    let query = E::find().filter(cond);
    let query = if spec.order.descending {
        query.order_by_desc(order_column)
    } else {
        query.order_by_asc(order_column)
    };

    let paginator = query.paginate(&db, spec.page.limit);
    let total = paginator
        .num_items()
        .await
        .map_err(|e| DomainError::database("list", e))?;
    let rows = paginator
        .fetch_page(spec.page.page)
        .await
        .map_err(|e| DomainError::database("list", e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(schemas.output.project(model_json("list", row)?));
    }

    Ok(json!({
        "items": items,
        "total": total,
        "page": spec.page.page,
        "limit": spec.page.limit,
    }))
}

async fn run_update<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    caller: Caller,
    payload: Value,
) -> Result<Value, DomainError>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    let schemas = schemas_for(&contract, OperationKind::Update)?;
    let Some(envelope) = payload.as_object() else {
        return Err(DomainError::invalid_field("_", "expected a JSON object"));
    };
    let Some(id) = envelope.get("id").and_then(Value::as_i64) else {
        return Err(DomainError::invalid_field("id", "must be an integer"));
    };
    let data = envelope.get("data").cloned().unwrap_or(Value::Null);
    if !data.is_object() {
        return Err(DomainError::invalid_field("data", "must be an object"));
    }
    let patch = schemas.input.validate(&data)?;
    if patch.is_empty() {
        return Err(DomainError::invalid_field(
            "data",
            "at least one field must be provided",
        ));
    }

    let row = scoped_select::<E>(&resource, id, &caller, true)?
        .one(&db)
        .await
        .map_err(|e| DomainError::database("update", e))?;
    let model = row.ok_or(DomainError::NotFound)?;

    let mut active = model.into_active_model();
    for (name, value) in &patch {
        active.set(column::<E>(name)?, db_value(column_kind(&resource, name)?, value)?);
    }
    active.set(
        column::<E>(UPDATED_AT)?,
        chrono::Utc::now().to_rfc3339().into(),
    );

    let saved = active
        .update(&db)
        .await
        .map_err(|e| DomainError::database("update", e))?;
    Ok(schemas.output.project(model_json("update", &saved)?))
}

async fn run_delete<E>(
    db: DatabaseConnection,
    resource: Arc<Resource<E>>,
    contract: Arc<Contract<E>>,
    caller: Caller,
    payload: Value,
) -> Result<Value, DomainError>
where
    E: EntityTrait + ResourceTable + 'static,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
{
    let schemas = schemas_for(&contract, OperationKind::Delete)?;
    let input = schemas.input.validate(&payload)?;
    let id = require_id(&input, resource.id_field())?;

    // The lookup ignores the active flag: deleting an already soft-deleted
    // row succeeds again instead of raising.
    let row = scoped_select::<E>(&resource, id, &caller, false)?
        .one(&db)
        .await
        .map_err(|e| DomainError::database("delete", e))?;
    let model = row.ok_or(DomainError::NotFound)?;

    let mut active = model.into_active_model();
    active.set(column::<E>(ACTIVE_FLAG)?, false.into());
    active.set(
        column::<E>(UPDATED_AT)?,
        chrono::Utc::now().to_rfc3339().into(),
    );

    let saved = active
        .update(&db)
        .await
        .map_err(|e| DomainError::database("delete", e))?;
    Ok(schemas.output.project(model_json("delete", &saved)?))
}

/// Point lookup filtered by id and owner, optionally by the active flag.
fn scoped_select<E>(
    resource: &Resource<E>,
    id: i64,
    caller: &Caller,
    only_active: bool,
) -> Result<Select<E>, DomainError>
where
    E: EntityTrait + ResourceTable,
{
    let mut cond = Condition::all()
        .add(column::<E>(resource.id_field())?.eq(id))
        .add(column::<E>(resource.owner_field())?.eq(caller.user_id));
    if only_active {
        cond = cond.add(column::<E>(ACTIVE_FLAG)?.eq(true));
    }
    Ok(E::find().filter(cond))
}

fn column<E: EntityTrait>(name: &str) -> Result<E::Column, DomainError> {
    E::Column::from_str(name).map_err(|_| {
        DomainError::construction(format!("column `{}` is not mapped on the entity", name))
    })
}

fn column_kind<E: EntityTrait + ResourceTable>(
    resource: &Resource<E>,
    name: &str,
) -> Result<FieldKind, DomainError> {
    resource
        .column(name)
        .map(|def| def.kind)
        .ok_or_else(|| {
            DomainError::construction(format!("column `{}` is missing from the catalog", name))
        })
}

fn schemas_for<T: ResourceTable>(
    contract: &Contract<T>,
    kind: OperationKind,
) -> Result<OperationSchemas, DomainError> {
    contract.schemas(kind).cloned().ok_or_else(|| {
        DomainError::construction(format!("operation `{}` is not part of the contract", kind))
    })
}

fn db_value(kind: FieldKind, value: &Value) -> Result<sea_orm::Value, DomainError> {
    match value {
        Value::Null => Ok(match kind {
            FieldKind::Text => sea_orm::Value::String(None),
            FieldKind::Integer => sea_orm::Value::BigInt(None),
            FieldKind::Boolean => sea_orm::Value::Bool(None),
        }),
        Value::String(text) if kind == FieldKind::Text => Ok(text.clone().into()),
        Value::Bool(flag) if kind == FieldKind::Boolean => Ok((*flag).into()),
        other => match (kind, other.as_i64()) {
            (FieldKind::Integer, Some(n)) => Ok(n.into()),
            _ => Err(DomainError::construction(
                "validated value does not match its column kind",
            )),
        },
    }
}

fn model_json<M: Serialize>(operation: &str, model: &M) -> Result<Value, DomainError> {
    serde_json::to_value(model).map_err(|e| DomainError::database(operation, e))
}

fn require_id(input: &Map<String, Value>, field: &str) -> Result<i64, DomainError> {
    input
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| DomainError::invalid_field(field, "must be an integer"))
}
