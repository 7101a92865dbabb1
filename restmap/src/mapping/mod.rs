//! Declarative field mapping between wire JSON and data objects.
//!
//! A [`Mapping`] holds three independent tables:
//!
//! - `fields`: attribute name -> rule over the wire object (deserialization)
//! - `reverse`: wire key -> rule over the attribute bag (serialization)
//! - `filters`: query parameter -> rule over caller filter arguments
//!
//! Mappings are built once through [`MappingBuilder`], validated there, and
//! shared behind an `Arc`. They are never mutated afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{Attributes, Entity, PRIVATE_PREFIX};

mod decl;
pub use self::decl::{MappingDecl, MappingFile};
mod registry;
pub use self::registry::MappingRegistry;
mod rule;
pub use self::rule::{FieldRule, TransformFn};

/// Errors raised while building or registering mappings.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Mapping name must not be empty")]
    EmptyName,
    #[error("Empty {table} target in mapping {entity}")]
    EmptyTarget { entity: String, table: Table },
    #[error("Empty source key for {table} entry {target} in mapping {entity}")]
    EmptySource {
        entity: String,
        table: Table,
        target: String,
    },
    #[error("Duplicate {table} entry {target} in mapping {entity}")]
    DuplicateEntry {
        entity: String,
        table: Table,
        target: String,
    },
    #[error("Mapping {0} is already registered")]
    DuplicateEntity(String),
    #[error("Failed to parse mapping YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
}

/// Names the mapping table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Fields,
    Reverse,
    Filters,
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Table::Fields => "field",
                Table::Reverse => "reverse field",
                Table::Filters => "filter",
            }
        )
    }
}

/// Which data object flavor a mapping produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Attribute bag, see [`crate::types::Record`].
    #[default]
    Record,
    /// Dictionary bag, see [`crate::types::Document`].
    Document,
}

type Rules = Vec<(String, FieldRule)>;

/// Field, reverse and filter tables for one entity type.
#[derive(Debug)]
pub struct Mapping {
    name: String,
    kind: ObjectKind,
    fields: Rules,
    reverse: Option<Rules>,
    filters: Rules,
}

impl Mapping {
    pub fn builder(name: &str) -> MappingBuilder {
        MappingBuilder {
            name: name.to_string(),
            kind: ObjectKind::default(),
            fields: Vec::new(),
            reverse: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn has_reverse_mapping(&self) -> bool {
        self.reverse.is_some()
    }

    /// Builds a data object from a wire object. Returns `None` when no field
    /// rule produced a value.
    pub fn deserialize(self: &Arc<Self>, wire: &Attributes) -> Option<Entity> {
        self.construct(apply(&self.fields, wire))
    }

    /// Builds a data object from caller filter arguments using the filter
    /// table. Returns `None` when no filter argument matched.
    pub fn deserialize_filters(self: &Arc<Self>, filters: &Attributes) -> Option<Entity> {
        self.construct(apply(&self.filters, filters))
    }

    /// Produces the wire form of an attribute bag.
    ///
    /// With a reverse table, each entry is evaluated and absent values are
    /// dropped. Without one, every non-private attribute is copied, nulls
    /// included.
    pub fn serialize(&self, attributes: &Attributes) -> Attributes {
        match &self.reverse {
            Some(rules) => apply(rules, attributes),
            None => attributes
                .iter()
                .filter(|(k, _)| !k.starts_with(PRIVATE_PREFIX))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    fn construct(self: &Arc<Self>, attributes: Attributes) -> Option<Entity> {
        if attributes.is_empty() {
            return None;
        }
        Some(Entity::from_attributes(Arc::clone(self), attributes))
    }
}

fn apply(rules: &Rules, source: &Attributes) -> Attributes {
    rules
        .iter()
        .filter_map(|(target, rule)| rule.evaluate(source).map(|v| (target.clone(), v)))
        .collect()
}

/// Collects mapping entries and validates them in [`MappingBuilder::build`].
pub struct MappingBuilder {
    name: String,
    kind: ObjectKind,
    fields: Rules,
    reverse: Rules,
    filters: Rules,
}

impl MappingBuilder {
    pub fn kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    /// Produce dictionary-style data objects.
    pub fn document(self) -> Self {
        self.kind(ObjectKind::Document)
    }

    /// Maps attribute `attr` to wire key `key`.
    pub fn field(mut self, attr: &str, key: &str) -> Self {
        self.fields.push((attr.to_string(), FieldRule::key(key)));
        self
    }

    /// Computes attribute `attr` from the whole wire object.
    pub fn field_with<F>(mut self, attr: &str, f: F) -> Self
    where
        F: Fn(&Attributes) -> Option<Value> + Send + Sync + 'static,
    {
        self.fields.push((attr.to_string(), FieldRule::transform(f)));
        self
    }

    /// Maps wire key `key` to attribute `attr` when serializing.
    pub fn reverse(mut self, key: &str, attr: &str) -> Self {
        self.reverse.push((key.to_string(), FieldRule::key(attr)));
        self
    }

    /// Computes wire key `key` from the whole attribute bag when serializing.
    pub fn reverse_with<F>(mut self, key: &str, f: F) -> Self
    where
        F: Fn(&Attributes) -> Option<Value> + Send + Sync + 'static,
    {
        self.reverse.push((key.to_string(), FieldRule::transform(f)));
        self
    }

    /// Maps query parameter `param` to filter argument `input`.
    pub fn filter(mut self, param: &str, input: &str) -> Self {
        self.filters.push((param.to_string(), FieldRule::key(input)));
        self
    }

    /// Computes query parameter `param` from all filter arguments.
    pub fn filter_with<F>(mut self, param: &str, f: F) -> Self
    where
        F: Fn(&Attributes) -> Option<Value> + Send + Sync + 'static,
    {
        self.filters.push((param.to_string(), FieldRule::transform(f)));
        self
    }

    pub fn build(self) -> Result<Arc<Mapping>, MappingError> {
        if self.name.trim().is_empty() {
            return Err(MappingError::EmptyName);
        }
        validate(&self.name, Table::Fields, &self.fields)?;
        validate(&self.name, Table::Reverse, &self.reverse)?;
        validate(&self.name, Table::Filters, &self.filters)?;

        Ok(Arc::new(Mapping {
            name: self.name,
            kind: self.kind,
            fields: self.fields,
            reverse: (!self.reverse.is_empty()).then_some(self.reverse),
            filters: self.filters,
        }))
    }
}

fn validate(entity: &str, table: Table, rules: &Rules) -> Result<(), MappingError> {
    let mut seen = HashSet::new();
    for (target, rule) in rules {
        if target.is_empty() {
            return Err(MappingError::EmptyTarget {
                entity: entity.to_string(),
                table,
            });
        }
        if matches!(rule, FieldRule::KeyLookup(key) if key.is_empty()) {
            return Err(MappingError::EmptySource {
                entity: entity.to_string(),
                table,
                target: target.clone(),
            });
        }
        if !seen.insert(target.as_str()) {
            return Err(MappingError::DuplicateEntry {
                entity: entity.to_string(),
                table,
                target: target.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::DataObject;

    fn object(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn issue_mapping() -> Arc<Mapping> {
        Mapping::builder("issue")
            .field("id", "issueId")
            .field("title", "summary")
            .field_with("closed", |wire| {
                Some(Value::Bool(wire.get("state")?.as_str()? == "closed"))
            })
            .reverse("issueId", "id")
            .reverse("summary", "title")
            .reverse_with("state", |attrs| {
                let closed = attrs.get("closed")?.as_bool()?;
                Some(json!(if closed { "closed" } else { "open" }))
            })
            .filter("state", "status")
            .filter_with("q", |kwargs| kwargs.get("search").cloned())
            .build()
            .unwrap()
    }

    #[test]
    fn deserialize_applies_field_rules() {
        let mapping = issue_mapping();
        let wire = object(json!({"issueId": 7, "summary": "Crash", "state": "closed", "extra": 1}));
        let entity = mapping.deserialize(&wire).unwrap();
        assert_eq!(entity.get("id"), Some(&json!(7)));
        assert_eq!(entity.get("title"), Some(&json!("Crash")));
        assert_eq!(entity.get("closed"), Some(&json!(true)));
        assert_eq!(entity.get("extra"), None);
    }

    #[test]
    fn deserialize_leaves_missing_keys_absent() {
        let entity = issue_mapping()
            .deserialize(&object(json!({"issueId": 1})))
            .unwrap();
        assert_eq!(entity.get("title"), None);
        assert_eq!(entity.as_mapping().len(), 1);
    }

    #[test]
    fn deserialize_returns_none_when_nothing_maps() {
        assert!(issue_mapping()
            .deserialize(&object(json!({"unrelated": true})))
            .is_none());
    }

    #[test]
    fn round_trip_restores_reverse_mapped_keys() {
        let mapping = issue_mapping();
        let wire = object(json!({"issueId": 9, "summary": "Slow", "state": "open", "noise": 3}));
        let serialized = mapping.deserialize(&wire).unwrap().serialize();
        assert_eq!(
            Value::Object(serialized),
            json!({"issueId": 9, "summary": "Slow", "state": "open"})
        );
    }

    #[test]
    fn serialize_drops_absent_reverse_entries() {
        let mapping = issue_mapping();
        let serialized = mapping.serialize(&object(json!({"id": 3, "title": null})));
        assert_eq!(Value::Object(serialized), json!({"issueId": 3}));
    }

    #[test]
    fn serialize_without_reverse_exports_public_attributes() {
        let mapping = Mapping::builder("note").field("text", "body").build().unwrap();
        assert!(!mapping.has_reverse_mapping());
        let serialized =
            mapping.serialize(&object(json!({"text": "hi", "_etag": "abc", "parent": null})));
        assert_eq!(Value::Object(serialized), json!({"text": "hi", "parent": null}));
    }

    #[test]
    fn deserialize_filters_maps_caller_arguments() {
        let filters = issue_mapping()
            .deserialize_filters(&object(json!({"status": "open", "search": "crash", "other": 1})))
            .unwrap();
        assert_eq!(
            Value::Object(filters.as_mapping()),
            json!({"state": "open", "q": "crash"})
        );
    }

    #[test]
    fn deserialize_filters_without_matches_is_none() {
        let mapping = Mapping::builder("issue")
            .filter_with("a", |_| None)
            .filter_with("b", |kwargs| kwargs.get("missing").cloned())
            .build()
            .unwrap();
        assert!(mapping.deserialize_filters(&Attributes::new()).is_none());
    }

    #[test]
    fn builder_rejects_empty_name() {
        assert!(matches!(
            Mapping::builder(" ").build(),
            Err(MappingError::EmptyName)
        ));
    }

    #[test]
    fn builder_rejects_duplicates_and_empty_keys() {
        let err = Mapping::builder("x")
            .field("a", "one")
            .field("a", "two")
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::DuplicateEntry { table: Table::Fields, .. }));

        let err = Mapping::builder("x").reverse("wire", "").build().unwrap_err();
        assert!(matches!(err, MappingError::EmptySource { table: Table::Reverse, .. }));

        let err = Mapping::builder("x").filter("", "input").build().unwrap_err();
        assert!(matches!(err, MappingError::EmptyTarget { table: Table::Filters, .. }));
    }

    #[test]
    fn same_target_allowed_across_tables() {
        let mapping = Mapping::builder("x")
            .field("name", "name")
            .reverse("name", "name")
            .filter("name", "name")
            .build();
        assert!(mapping.is_ok());
    }
}
