//! Service builder: the business-layer object handlers consume.
//!
//! Standard operations delegate to the repository unchanged, keeping this
//! layer a seam for future business rules. Named custom operations carry an
//! explicit policy for empty results: either a JSON `null` or `NotFound`.

use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::EntityTrait;
use serde_json::Value;

use crate::domain::contract::{Contract, OperationKind};
use crate::domain::errors::DomainError;
use crate::domain::resource::marker::{Missing, Present};
use crate::domain::resource::ResourceTable;
use crate::domain::Caller;
use crate::infrastructure::repository::Repository;

/// How a custom operation treats an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnNull {
    /// Absence is an expected outcome; surface it as JSON `null`.
    Return,
    /// Absence is exceptional; raise `NotFound`.
    Throw,
}

pub type CustomFn = Arc<
    dyn Fn(Caller, Value) -> BoxFuture<'static, Result<Option<Value>, DomainError>> + Send + Sync,
>;

pub struct CustomOperation {
    pub run: CustomFn,
    pub on_null: OnNull,
}

/// An immutable service over entity `E`.
pub struct Service<E: EntityTrait + ResourceTable> {
    repository: Arc<Repository<E>>,
    contract: Arc<Contract<E>>,
    standard: BTreeSet<OperationKind>,
    custom: BTreeMap<String, CustomOperation>,
}

impl<E: EntityTrait + ResourceTable> Service<E> {
    pub fn repository(&self) -> &Arc<Repository<E>> {
        &self.repository
    }

    pub fn contract(&self) -> &Arc<Contract<E>> {
        &self.contract
    }

    pub async fn create(&self, caller: &Caller, input: Value) -> Result<Value, DomainError> {
        self.ensure(OperationKind::Create)?;
        self.repository.create(caller, input).await
    }

    pub async fn get_by_id(&self, caller: &Caller, id: i64) -> Result<Value, DomainError> {
        self.ensure(OperationKind::GetById)?;
        self.repository.get_by_id(caller, id).await
    }

    pub async fn list(&self, caller: &Caller, params: Value) -> Result<Value, DomainError> {
        self.ensure(OperationKind::List)?;
        self.repository.list(caller, params).await
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: i64,
        patch: Value,
    ) -> Result<Value, DomainError> {
        self.ensure(OperationKind::Update)?;
        self.repository.update(caller, id, patch).await
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<Value, DomainError> {
        self.ensure(OperationKind::Delete)?;
        self.repository.delete(caller, id).await
    }

    /// Invoke an operation by name. Custom operations take precedence, then
    /// the standard keys.
    pub async fn call(
        &self,
        name: &str,
        caller: &Caller,
        payload: Value,
    ) -> Result<Value, DomainError> {
        if let Some(op) = self.custom.get(name) {
            return match (op.run)(caller.clone(), payload).await? {
                Some(value) => Ok(value),
                None => match op.on_null {
                    OnNull::Return => Ok(Value::Null),
                    OnNull::Throw => Err(DomainError::NotFound),
                },
            };
        }
        match OperationKind::from_key(name) {
            Some(kind) => {
                self.ensure(kind)?;
                self.repository.invoke(kind, caller.clone(), payload).await
            }
            None => Err(DomainError::construction(format!(
                "unknown operation `{}`",
                name
            ))),
        }
    }

    fn ensure(&self, kind: OperationKind) -> Result<(), DomainError> {
        if self.standard.contains(&kind) {
            Ok(())
        } else {
            Err(DomainError::construction(format!(
                "operation `{}` is not registered on this service",
                kind
            )))
        }
    }
}

/// Start building a service.
pub fn define_service<E: EntityTrait + ResourceTable>() -> ServiceBuilder<E, Missing, Missing> {
    ServiceBuilder {
        repository: None,
        contract: None,
        standard: BTreeSet::new(),
        custom: BTreeMap::new(),
        _state: PhantomData,
    }
}

/// Builder for [`Service`]. Repository and contract registrations are
/// tracked as marker types.
pub struct ServiceBuilder<E: EntityTrait + ResourceTable, R, C> {
    repository: Option<Arc<Repository<E>>>,
    contract: Option<Arc<Contract<E>>>,
    standard: BTreeSet<OperationKind>,
    custom: BTreeMap<String, CustomOperation>,
    _state: PhantomData<fn() -> (R, C)>,
}

impl<E: EntityTrait + ResourceTable, R, C> ServiceBuilder<E, R, C> {
    pub fn register_repository(
        self,
        repository: Arc<Repository<E>>,
    ) -> ServiceBuilder<E, Present, C> {
        ServiceBuilder {
            repository: Some(repository),
            contract: self.contract,
            standard: self.standard,
            custom: self.custom,
            _state: PhantomData,
        }
    }

    pub fn register_contract(self, contract: Arc<Contract<E>>) -> ServiceBuilder<E, R, Present> {
        ServiceBuilder {
            repository: self.repository,
            contract: Some(contract),
            standard: self.standard,
            custom: self.custom,
            _state: PhantomData,
        }
    }
}

impl<E: EntityTrait + ResourceTable, C> ServiceBuilder<E, Present, C> {
    /// Install a named operation built by `factory` over the repository.
    /// Names colliding with standard operation keys fail construction.
    pub fn add_service(
        mut self,
        name: &str,
        factory: impl FnOnce(Arc<Repository<E>>) -> CustomOperation,
    ) -> Result<Self, DomainError> {
        if OperationKind::from_key(name).is_some() {
            return Err(DomainError::construction(format!(
                "`{}` collides with a standard operation key",
                name
            )));
        }
        if self.custom.contains_key(name) {
            return Err(DomainError::construction(format!(
                "operation `{}` is already registered",
                name
            )));
        }
        let Some(repository) = self.repository.clone() else {
            return Err(DomainError::construction(
                "a repository must be registered before adding operations",
            ));
        };
        self.custom.insert(name.to_owned(), factory(repository));
        Ok(self)
    }
}

impl<E: EntityTrait + ResourceTable> ServiceBuilder<E, Present, Present> {
    /// Expose every operation the contract declares as a pass-through.
    pub fn register_standard_operations(mut self) -> Self {
        if let Some(contract) = &self.contract {
            self.standard.extend(contract.operations());
        }
        self
    }

    /// Freeze the service. Every exposed standard operation must be backed
    /// by a repository binding.
    pub fn done(self) -> Result<Service<E>, DomainError> {
        let (Some(repository), Some(contract)) = (self.repository, self.contract) else {
            return Err(DomainError::construction(
                "repository and contract must be registered before done()",
            ));
        };
        for kind in &self.standard {
            if !repository.supports(*kind) {
                return Err(DomainError::construction(format!(
                    "operation `{}` has no repository binding",
                    kind
                )));
            }
        }
        Ok(Service {
            repository,
            contract,
            standard: self.standard,
            custom: self.custom,
        })
    }
}
