//! Response decoding: JSON parsing, envelope detection and mapping.
//!
//! Shape rules, applied recursively:
//!
//! 1. an object with both `total` and `results` is a paginated envelope;
//! 2. any other object is mapped when an entity type is given, kept as is
//!    otherwise;
//! 3. an array is decoded element-wise;
//! 4. a scalar is kept as is without an entity type, and rejected with one.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::mapping::{Mapping, MappingRegistry};
use crate::types::{Entity, Page};
use crate::Error;

/// Result of decoding a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Raw JSON, returned when no entity type applies.
    Value(Value),
    /// A mapped data object.
    Entity(Entity),
    /// An object whose field rules produced nothing.
    Empty,
    List(Vec<Decoded>),
    Page(Page<Decoded>),
}

impl Decoded {
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Decoded::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn into_page(self) -> Option<Page<Decoded>> {
        match self {
            Decoded::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Decoded>> {
        match self {
            Decoded::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Decoded::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Decoded::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

impl Serialize for Decoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Decoded::Value(value) => value.serialize(serializer),
            Decoded::Entity(entity) => entity.serialize(serializer),
            Decoded::Empty => serializer.serialize_none(),
            Decoded::List(items) => items.serialize(serializer),
            Decoded::Page(page) => page.serialize(serializer),
        }
    }
}

/// Pagination bookkeeping and envelope selection for one decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode only this member of the top-level object.
    pub key: Option<String>,
    pub page: Option<u64>,
    /// 0-based offset of the first item of the page.
    pub first_offset: u64,
    pub last_offset: Option<u64>,
}

impl DecodeOptions {
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_first_offset(mut self, first_offset: u64) -> Self {
        self.first_offset = first_offset;
        self
    }

    pub fn with_last_offset(mut self, last_offset: u64) -> Self {
        self.last_offset = Some(last_offset);
        self
    }
}

/// Decodes response bodies against the mappings of a registry.
pub struct Decoder<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> Decoder<'a> {
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Parses `body` and interprets its shape. `entity_type` must name a
    /// registered mapping.
    pub fn decode(
        &self,
        body: &str,
        entity_type: Option<&str>,
        options: &DecodeOptions,
    ) -> Result<Decoded, Error> {
        let mapping = entity_type
            .map(|name| self.registry.get(name))
            .transpose()?;
        let value: Value = serde_json::from_str(body).map_err(|e| Error::invalid_json(e, body))?;
        let value = match &options.key {
            Some(key) => select_key(value, key)?,
            None => value,
        };
        decode_value(value, mapping, options)
    }
}

fn select_key(value: Value, key: &str) -> Result<Value, Error> {
    match value {
        Value::Object(mut object) => object
            .remove(key)
            .ok_or_else(|| Error::malformed(format!("response has no `{}` member", key))),
        other => Err(Error::malformed(format!(
            "cannot select `{}` from a JSON {}",
            key,
            json_kind(&other)
        ))),
    }
}

/// Interprets an already parsed value. Pagination bookkeeping in `options`
/// only applies to a top-level envelope.
pub fn decode_value(
    value: Value,
    mapping: Option<&Arc<Mapping>>,
    options: &DecodeOptions,
) -> Result<Decoded, Error> {
    match value {
        Value::Object(object) => {
            if object.contains_key("total") && object.contains_key("results") {
                return decode_envelope(object, mapping, options);
            }
            match mapping {
                Some(mapping) => Ok(mapping
                    .deserialize(&object)
                    .map_or(Decoded::Empty, Decoded::Entity)),
                None => Ok(Decoded::Value(Value::Object(object))),
            }
        }
        Value::Array(items) => decode_items(items, mapping).map(Decoded::List),
        scalar => match mapping {
            None => Ok(Decoded::Value(scalar)),
            Some(mapping) => Err(Error::malformed(format!(
                "cannot decode a JSON {} into {}",
                json_kind(&scalar),
                mapping.name()
            ))),
        },
    }
}

fn decode_envelope(
    mut object: serde_json::Map<String, Value>,
    mapping: Option<&Arc<Mapping>>,
    options: &DecodeOptions,
) -> Result<Decoded, Error> {
    let total = object
        .get("total")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::malformed("envelope `total` is not a non-negative integer"))?;
    let items = match object.remove("results") {
        Some(Value::Array(items)) => decode_items(items, mapping)?,
        _ => return Err(Error::malformed("envelope `results` is not an array")),
    };
    Ok(Decoded::Page(Page::new(
        total,
        options.page,
        options.first_offset,
        options.last_offset,
        items,
    )))
}

fn decode_items(items: Vec<Value>, mapping: Option<&Arc<Mapping>>) -> Result<Vec<Decoded>, Error> {
    let nested = DecodeOptions::default();
    items
        .into_iter()
        .map(|item| decode_value(item, mapping, &nested))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
