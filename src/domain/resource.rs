//! Resource definitions, the first stage of the composition chain.
//!
//! A resource declares which columns of a persisted table identify a row,
//! which column records ownership, and which attributes may be filtered on
//! when listing. Construction is a one-way builder: once `done()` returns,
//! the resource is immutable and shared behind an `Arc`.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::errors::DomainError;
use super::schema::FieldKind;

/// Builder progression markers for compile-time enforcement.
pub mod marker {
    /// A required registration not yet provided.
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    /// A required registration that has been provided.
    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

use marker::{Missing, Present};

/// Timestamp stamped on insert.
pub const CREATED_AT: &str = "created_at";
/// Timestamp re-stamped on every mutation.
pub const UPDATED_AT: &str = "updated_at";
/// Soft-delete flag; rows are never physically removed.
pub const ACTIVE_FLAG: &str = "is_active";

/// Reserved list-input keys that filters may not shadow.
pub const PAGINATION_KEYS: [&str; 3] = ["page", "limit", "sort"];

/// A column in a resource's static catalog.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: FieldKind,
    /// The caller must supply this field when creating a row.
    pub required: bool,
    /// The column accepts NULL.
    pub nullable: bool,
}

/// Static column catalog exposed by a persisted table.
///
/// Implemented by entity types in `models`; keeps the domain layer free of
/// any ORM types while still letting builders verify column references.
pub trait ResourceTable {
    fn table() -> &'static str;
    fn columns() -> &'static [ColumnDef];
}

/// An immutable resource definition over table `T`.
#[derive(Debug)]
pub struct Resource<T: ResourceTable> {
    id_field: String,
    owner_field: String,
    filters: BTreeMap<String, FieldKind>,
    _table: PhantomData<fn() -> T>,
}

impl<T: ResourceTable> Resource<T> {
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn owner_field(&self) -> &str {
        &self.owner_field
    }

    pub fn filters(&self) -> &BTreeMap<String, FieldKind> {
        &self.filters
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        T::columns().iter().find(|c| c.name == name)
    }

    /// Fields injected server-side; never accepted from callers.
    pub fn system_fields(&self) -> [&str; 5] {
        [
            self.id_field.as_str(),
            self.owner_field.as_str(),
            CREATED_AT,
            UPDATED_AT,
            ACTIVE_FLAG,
        ]
    }

    pub fn is_system_field(&self, name: &str) -> bool {
        self.system_fields().contains(&name)
    }
}

/// Start defining a resource over table `T`.
pub fn define_resource<T: ResourceTable>() -> ResourceBuilder<T, Missing, Missing> {
    ResourceBuilder {
        id_field: None,
        owner_field: None,
        filters: BTreeMap::new(),
        _state: PhantomData,
    }
}

/// Builder for [`Resource`]. The identity and owner columns are tracked as
/// marker types so `done()` only exists once both have been recorded.
pub struct ResourceBuilder<T: ResourceTable, I, O> {
    id_field: Option<String>,
    owner_field: Option<String>,
    filters: BTreeMap<String, FieldKind>,
    _state: PhantomData<fn() -> (T, I, O)>,
}

impl<T: ResourceTable, I, O> ResourceBuilder<T, I, O> {
    /// Record the column that identifies a row.
    pub fn id_column(self, column: &str) -> ResourceBuilder<T, Present, O> {
        ResourceBuilder {
            id_field: Some(column.to_owned()),
            owner_field: self.owner_field,
            filters: self.filters,
            _state: PhantomData,
        }
    }

    /// Record the column that stores the owning user.
    pub fn owner_column(self, column: &str) -> ResourceBuilder<T, I, Present> {
        ResourceBuilder {
            id_field: self.id_field,
            owner_field: Some(column.to_owned()),
            filters: self.filters,
            _state: PhantomData,
        }
    }

    /// Allow list operations to filter on `column` with the given validator.
    pub fn enable_filter(mut self, column: &str, kind: FieldKind) -> Self {
        self.filters.insert(column.to_owned(), kind);
        self
    }

    pub fn enable_filters<'a>(
        mut self,
        filters: impl IntoIterator<Item = (&'a str, FieldKind)>,
    ) -> Self {
        for (column, kind) in filters {
            self.filters.insert(column.to_owned(), kind);
        }
        self
    }
}

impl<T: ResourceTable> ResourceBuilder<T, Present, Present> {
    /// Freeze the resource. Every recorded name is resolved against the
    /// table's column catalog; a miss fails construction.
    pub fn done(self) -> Result<Arc<Resource<T>>, DomainError> {
        let (Some(id_field), Some(owner_field)) = (self.id_field, self.owner_field) else {
            return Err(DomainError::construction(
                "identity and owner columns must be recorded before done()",
            ));
        };

        let catalog = T::columns();
        let exists = |name: &str| catalog.iter().any(|c| c.name == name);

        for name in [id_field.as_str(), owner_field.as_str()] {
            if !exists(name) {
                return Err(DomainError::construction(format!(
                    "column `{}` does not exist on table `{}`",
                    name,
                    T::table()
                )));
            }
        }
        for name in [CREATED_AT, UPDATED_AT, ACTIVE_FLAG] {
            if !exists(name) {
                return Err(DomainError::construction(format!(
                    "table `{}` is missing the system column `{}`",
                    T::table(),
                    name
                )));
            }
        }

        let system = [
            id_field.as_str(),
            owner_field.as_str(),
            CREATED_AT,
            UPDATED_AT,
            ACTIVE_FLAG,
        ];
        for (name, kind) in &self.filters {
            let Some(def) = catalog.iter().find(|c| c.name == name) else {
                return Err(DomainError::construction(format!(
                    "filter `{}` does not name a column of table `{}`",
                    name,
                    T::table()
                )));
            };
            if def.kind != *kind {
                return Err(DomainError::construction(format!(
                    "filter `{}` declares a different kind than column `{}`",
                    name, name
                )));
            }
            if system.contains(&name.as_str()) {
                return Err(DomainError::construction(format!(
                    "filter `{}` targets a server-managed column",
                    name
                )));
            }
            if PAGINATION_KEYS.contains(&name.as_str()) {
                return Err(DomainError::construction(format!(
                    "filter `{}` shadows a reserved list parameter",
                    name
                )));
            }
        }

        Ok(Arc::new(Resource {
            id_field,
            owner_field,
            filters: self.filters,
            _table: PhantomData,
        }))
    }
}
