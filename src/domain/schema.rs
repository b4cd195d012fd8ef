//! Field-rule validation for operation inputs and outputs.
//!
//! A `Schema` is a flat list of field rules derived from a resource's column
//! catalog. Validation either returns the accepted fields or a full list of
//! field errors; it never partially succeeds.

use serde_json::{Map, Value};

use super::errors::{DomainError, FieldError};

/// Scalar kinds a persisted column (and therefore a validated field) can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
}

impl FieldKind {
    fn expects(self) -> &'static str {
        match self {
            FieldKind::Text => "must be a string",
            FieldKind::Integer => "must be an integer",
            FieldKind::Boolean => "must be a boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.as_i64().is_some(),
            FieldKind::Boolean => value.is_boolean(),
        }
    }

    /// Parse a query-string scalar into its typed JSON form.
    fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            FieldKind::Text => Some(Value::String(raw.to_owned())),
            FieldKind::Integer => raw.parse::<i64>().ok().map(Value::from),
            FieldKind::Boolean => match raw {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// The field must be present in the input.
    pub required: bool,
    /// An explicit `null` is acceptable for this field.
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            nullable,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a strictly-typed JSON body. Unknown fields are rejected, not
    /// stripped, so callers cannot believe they set a server-managed value.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, DomainError> {
        self.check(input, false)
    }

    /// Validate input that arrived via query string: scalar values are
    /// accepted in their string form and coerced to the declared kind.
    pub fn validate_query(&self, input: &Value) -> Result<Map<String, Value>, DomainError> {
        self.check(input, true)
    }

    fn check(&self, input: &Value, coerce: bool) -> Result<Map<String, Value>, DomainError> {
        let Some(object) = input.as_object() else {
            return Err(DomainError::invalid_field("_", "expected a JSON object"));
        };

        let mut errors = Vec::new();
        let mut accepted = Map::new();

        for key in object.keys() {
            if self.field(key).is_none() {
                errors.push(FieldError::new(key.clone(), "unexpected field"));
            }
        }

        for spec in &self.fields {
            match object.get(&spec.name) {
                None => {
                    if spec.required {
                        errors.push(FieldError::new(spec.name.clone(), "is required"));
                    }
                }
                Some(Value::Null) => {
                    if spec.nullable {
                        accepted.insert(spec.name.clone(), Value::Null);
                    } else {
                        errors.push(FieldError::new(spec.name.clone(), "must not be null"));
                    }
                }
                Some(value) => {
                    if spec.kind.accepts(value) {
                        accepted.insert(spec.name.clone(), value.clone());
                    } else if coerce
                        && let Value::String(raw) = value
                        && let Some(coerced) = spec.kind.coerce(raw)
                    {
                        accepted.insert(spec.name.clone(), coerced);
                    } else {
                        errors.push(FieldError::new(spec.name.clone(), spec.kind.expects()));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(accepted)
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Shape an outgoing row: keep only the declared fields.
    pub fn project(&self, row: Value) -> Value {
        let Value::Object(mut object) = row else {
            return row;
        };
        object.retain(|key, _| self.field(key).is_some());
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::new("title", FieldKind::Text, true, false),
            FieldSpec::new("content", FieldKind::Text, false, true),
            FieldSpec::new("published", FieldKind::Boolean, false, false),
        ])
    }

    #[test]
    fn accepts_valid_input() {
        let out = schema()
            .validate(&json!({"title": "hello", "content": null}))
            .unwrap();
        assert_eq!(out.get("title"), Some(&json!("hello")));
        assert_eq!(out.get("content"), Some(&Value::Null));
    }

    #[test]
    fn rejects_missing_required_and_unknown_fields() {
        let err = schema()
            .validate(&json!({"user_id": 7, "published": "yes"}))
            .unwrap_err();
        let DomainError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let named: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(named.contains(&"title"));
        assert!(named.contains(&"user_id"));
        assert!(named.contains(&"published"));
    }

    #[test]
    fn coerces_query_strings() {
        let out = schema()
            .validate_query(&json!({"published": "true"}))
            .unwrap();
        assert_eq!(out.get("published"), Some(&json!(true)));

        let err = schema()
            .validate_query(&json!({"published": "maybe"}))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn projects_only_declared_fields() {
        let shaped = schema().project(json!({"title": "a", "password_hash": "x"}));
        assert_eq!(shaped, json!({"title": "a"}));
    }
}
