//! Data-driven list query specification.
//!
//! List operations are described as a value — predicate list, ordering,
//! pagination — before any database type gets involved. The repository
//! translates the spec into concrete queries; everything up to that point is
//! pure and testable without a driver.

use serde_json::{Map, Value};

use super::context::Caller;
use super::errors::DomainError;
use super::resource::{Resource, ResourceTable, ACTIVE_FLAG, CREATED_AT};
use super::schema::FieldKind;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: Comparison,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Zero-based page index.
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub predicates: Vec<Predicate>,
    pub order: Ordering,
    pub page: Pagination,
}

impl QuerySpec {
    /// Build the spec for a list operation from validated input.
    ///
    /// Owner scoping and the soft-delete filter are part of the spec itself,
    /// so no translation step can forget them.
    pub fn for_list<T: ResourceTable>(
        resource: &Resource<T>,
        caller: &Caller,
        input: &Map<String, Value>,
    ) -> Result<QuerySpec, DomainError> {
        let mut predicates = vec![
            Predicate {
                column: resource.owner_field().to_owned(),
                op: Comparison::Eq,
                value: Value::from(caller.user_id),
            },
            Predicate {
                column: ACTIVE_FLAG.to_owned(),
                op: Comparison::Eq,
                value: Value::Bool(true),
            },
        ];

        for (name, kind) in resource.filters() {
            if let Some(value) = input.get(name)
                && !value.is_null()
            {
                let op = match kind {
                    FieldKind::Text => Comparison::Contains,
                    _ => Comparison::Eq,
                };
                predicates.push(Predicate {
                    column: name.clone(),
                    op,
                    value: value.clone(),
                });
            }
        }

        let limit = match input.get("limit").and_then(Value::as_i64) {
            None => DEFAULT_LIMIT,
            Some(n) if n > 0 => (n as u64).min(MAX_LIMIT),
            Some(_) => {
                return Err(DomainError::invalid_field("limit", "must be positive"));
            }
        };
        let page = match input.get("page").and_then(Value::as_i64) {
            None => 0,
            Some(n) if n >= 0 => n as u64,
            Some(_) => {
                return Err(DomainError::invalid_field(
                    "page",
                    "must not be negative",
                ));
            }
        };

        let order = match input.get("sort").and_then(Value::as_str) {
            None => Ordering {
                column: CREATED_AT.to_owned(),
                descending: true,
            },
            Some(raw) => {
                let (descending, column) = match raw.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, raw),
                };
                if resource.column(column).is_none() {
                    return Err(DomainError::invalid_field(
                        "sort",
                        "is not a sortable column",
                    ));
                }
                Ordering {
                    column: column.to_owned(),
                    descending,
                }
            }
        };

        Ok(QuerySpec {
            predicates,
            order,
            page: Pagination { page, limit },
        })
    }
}
