//! Domain layer - the framework-free composition core
//!
//! Resources, contracts, schemas and query specs carry no ORM or HTTP
//! dependencies. The repository (infrastructure) and service layers bind
//! them to a live database and to handlers.

pub mod context;
pub mod contract;
pub mod errors;
pub mod query;
pub mod resource;
pub mod schema;

pub use context::Caller;
pub use contract::{define_contract, Contract, ContractBuilder, OperationKind, OperationSchemas};
pub use errors::{DomainError, FieldError};
pub use query::{Comparison, Ordering, Pagination, Predicate, QuerySpec};
pub use resource::{define_resource, ColumnDef, Resource, ResourceBuilder, ResourceTable};
pub use schema::{FieldKind, FieldSpec, Schema};
