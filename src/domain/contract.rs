//! Operation contracts, the second stage of the composition chain.
//!
//! A contract records which standard operations a resource supports and the
//! input/output schemas each one validates against. Schemas are derived from
//! the resource's column catalog; server-managed fields never appear in an
//! input schema, and every output schema carries the identity and owner
//! columns.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::errors::DomainError;
use super::resource::{Resource, ResourceTable};
use super::schema::{FieldKind, FieldSpec, Schema};

/// The standard operations a resource contract can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationKind {
    Create,
    GetById,
    List,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Create,
        OperationKind::GetById,
        OperationKind::List,
        OperationKind::Update,
        OperationKind::Delete,
    ];

    pub fn key(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::GetById => "get_by_id",
            OperationKind::List => "list",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Input and output validators for one registered operation.
#[derive(Debug, Clone)]
pub struct OperationSchemas {
    pub input: Schema,
    pub output: Schema,
}

/// An immutable operation contract over table `T`.
#[derive(Debug)]
pub struct Contract<T: ResourceTable> {
    resource: Arc<Resource<T>>,
    operations: BTreeMap<OperationKind, OperationSchemas>,
}

impl<T: ResourceTable> Contract<T> {
    pub fn resource(&self) -> &Arc<Resource<T>> {
        &self.resource
    }

    pub fn operations(&self) -> impl Iterator<Item = OperationKind> + '_ {
        self.operations.keys().copied()
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        self.operations.contains_key(&kind)
    }

    pub fn schemas(&self, kind: OperationKind) -> Option<&OperationSchemas> {
        self.operations.get(&kind)
    }
}

/// Start defining a contract for `resource`.
pub fn define_contract<T: ResourceTable>(resource: &Arc<Resource<T>>) -> ContractBuilder<T> {
    ContractBuilder {
        resource: resource.clone(),
        operations: BTreeMap::new(),
    }
}

pub struct ContractBuilder<T: ResourceTable> {
    resource: Arc<Resource<T>>,
    operations: BTreeMap<OperationKind, OperationSchemas>,
}

impl<T: ResourceTable> ContractBuilder<T> {
    /// Register one operation with explicit schemas. Registering a kind that
    /// is already present fails construction; overriding is done by
    /// registering the custom kind first and filling the rest with
    /// [`register_all_standard`](Self::register_all_standard).
    pub fn register(
        mut self,
        kind: OperationKind,
        schemas: OperationSchemas,
    ) -> Result<Self, DomainError> {
        if self.operations.contains_key(&kind) {
            return Err(DomainError::construction(format!(
                "operation `{}` is already registered",
                kind
            )));
        }
        self.operations.insert(kind, schemas);
        Ok(self)
    }

    /// Register `kind` with schemas derived from the resource's catalog.
    pub fn register_standard(self, kind: OperationKind) -> Result<Self, DomainError> {
        let schemas = derive_schemas(&self.resource, kind);
        self.register(kind, schemas)
    }

    /// Fill every standard operation not yet registered with derived
    /// schemas. Kinds registered explicitly beforehand keep their schemas.
    pub fn register_all_standard(mut self) -> Self {
        for kind in OperationKind::ALL {
            if !self.operations.contains_key(&kind) {
                let schemas = derive_schemas(&self.resource, kind);
                self.operations.insert(kind, schemas);
            }
        }
        self
    }

    pub fn done(self) -> Arc<Contract<T>> {
        Arc::new(Contract {
            resource: self.resource,
            operations: self.operations,
        })
    }
}

fn derive_schemas<T: ResourceTable>(
    resource: &Resource<T>,
    kind: OperationKind,
) -> OperationSchemas {
    let output = output_schema::<T>();
    let input = match kind {
        OperationKind::Create => Schema::new(
            writable_columns(resource)
                .map(|c| FieldSpec::new(c.name, c.kind, c.required, c.nullable))
                .collect(),
        ),
        // A patch: every writable column optional, nullability preserved.
        OperationKind::Update => Schema::new(
            writable_columns(resource)
                .map(|c| FieldSpec::new(c.name, c.kind, false, c.nullable))
                .collect(),
        ),
        OperationKind::GetById | OperationKind::Delete => Schema::new(vec![FieldSpec::new(
            resource.id_field(),
            FieldKind::Integer,
            true,
            false,
        )]),
        OperationKind::List => {
            let mut fields: Vec<FieldSpec> = resource
                .filters()
                .iter()
                .map(|(name, kind)| FieldSpec::new(name.clone(), *kind, false, false))
                .collect();
            fields.push(FieldSpec::new("page", FieldKind::Integer, false, false));
            fields.push(FieldSpec::new("limit", FieldKind::Integer, false, false));
            fields.push(FieldSpec::new("sort", FieldKind::Text, false, false));
            Schema::new(fields)
        }
    };
    OperationSchemas { input, output }
}

fn writable_columns<T: ResourceTable>(
    resource: &Resource<T>,
) -> impl Iterator<Item = &'static super::resource::ColumnDef> + '_ {
    T::columns()
        .iter()
        .filter(|c| !resource.is_system_field(c.name))
}

fn output_schema<T: ResourceTable>() -> Schema {
    Schema::new(
        T::columns()
            .iter()
            .map(|c| FieldSpec::new(c.name, c.kind, c.required, c.nullable))
            .collect(),
    )
}
