//! Data objects produced and consumed by mappings.

use std::ops::{Deref, DerefMut, Index};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::mapping::{Mapping, ObjectKind};

/// Attribute name -> value bag shared by every data object.
pub type Attributes = serde_json::Map<String, Value>;

/// Attributes whose name starts with this marker are private: they are never
/// exported by the fallback serialization.
pub const PRIVATE_PREFIX: char = '_';

static NULL: Value = Value::Null;

/// Capability shared by both data object flavors.
pub trait DataObject {
    /// Mapping the object was built for.
    fn mapping(&self) -> &Arc<Mapping>;

    fn get(&self, attr: &str) -> Option<&Value>;

    fn set(&mut self, attr: &str, value: Value);

    /// Snapshot of every attribute, private ones included.
    fn as_mapping(&self) -> Attributes;

    /// Wire form of the object, see [`Mapping::serialize`].
    fn serialize(&self) -> Attributes {
        self.mapping().serialize(&self.as_mapping())
    }
}

fn merge<I>(sources: I) -> Attributes
where
    I: IntoIterator<Item = Attributes>,
{
    let mut attributes = Attributes::new();
    for source in sources {
        attributes.extend(source);
    }
    attributes
}

/// Attribute-bag data object: fields are only reachable through
/// [`DataObject::get`] and [`DataObject::set`].
#[derive(Debug, Clone)]
pub struct Record {
    mapping: Arc<Mapping>,
    attributes: Attributes,
}

impl Record {
    pub fn new(mapping: Arc<Mapping>) -> Self {
        Self {
            mapping,
            attributes: Attributes::new(),
        }
    }

    /// Builds a record from several sources; later keys overwrite earlier ones.
    pub fn from_sources<I>(mapping: Arc<Mapping>, sources: I) -> Self
    where
        I: IntoIterator<Item = Attributes>,
    {
        Self {
            mapping,
            attributes: merge(sources),
        }
    }

    pub fn remove(&mut self, attr: &str) -> Option<Value> {
        self.attributes.remove(attr)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }
}

impl DataObject for Record {
    fn mapping(&self) -> &Arc<Mapping> {
        &self.mapping
    }

    fn get(&self, attr: &str) -> Option<&Value> {
        self.attributes.get(attr)
    }

    fn set(&mut self, attr: &str, value: Value) {
        self.attributes.insert(attr.to_string(), value);
    }

    fn as_mapping(&self) -> Attributes {
        self.attributes.clone()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.mapping.name() == other.mapping.name() && self.attributes == other.attributes
    }
}

/// Dictionary-bag data object: dereferences to its entry map, supports
/// `doc["key"]` (yielding `null` for missing keys) and serializes as a plain
/// JSON object.
#[derive(Debug, Clone)]
pub struct Document {
    mapping: Arc<Mapping>,
    entries: Attributes,
}

impl Document {
    pub fn new(mapping: Arc<Mapping>) -> Self {
        Self {
            mapping,
            entries: Attributes::new(),
        }
    }

    /// Builds a document from several sources; later keys overwrite earlier ones.
    pub fn from_sources<I>(mapping: Arc<Mapping>, sources: I) -> Self
    where
        I: IntoIterator<Item = Attributes>,
    {
        Self {
            mapping,
            entries: merge(sources),
        }
    }

    pub fn into_entries(self) -> Attributes {
        self.entries
    }
}

impl DataObject for Document {
    fn mapping(&self) -> &Arc<Mapping> {
        &self.mapping
    }

    fn get(&self, attr: &str) -> Option<&Value> {
        self.entries.get(attr)
    }

    fn set(&mut self, attr: &str, value: Value) {
        self.entries.insert(attr.to_string(), value);
    }

    fn as_mapping(&self) -> Attributes {
        self.entries.clone()
    }
}

impl Deref for Document {
    type Target = Attributes;

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entries
    }
}

impl Index<&str> for Document {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.entries.get(key).unwrap_or(&NULL)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.mapping.name() == other.mapping.name() && self.entries == other.entries
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// A data object of whichever flavor its mapping selects.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Record(Record),
    Document(Document),
}

impl Entity {
    pub(crate) fn from_attributes(mapping: Arc<Mapping>, attributes: Attributes) -> Self {
        match mapping.kind() {
            ObjectKind::Record => Entity::Record(Record::from_sources(mapping, [attributes])),
            ObjectKind::Document => Entity::Document(Document::from_sources(mapping, [attributes])),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entity::Record(record) => Some(record),
            Entity::Document(_) => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Entity::Document(document) => Some(document),
            Entity::Record(_) => None,
        }
    }
}

impl DataObject for Entity {
    fn mapping(&self) -> &Arc<Mapping> {
        match self {
            Entity::Record(r) => r.mapping(),
            Entity::Document(d) => d.mapping(),
        }
    }

    fn get(&self, attr: &str) -> Option<&Value> {
        match self {
            Entity::Record(r) => r.get(attr),
            Entity::Document(d) => DataObject::get(d, attr),
        }
    }

    fn set(&mut self, attr: &str, value: Value) {
        match self {
            Entity::Record(r) => r.set(attr, value),
            Entity::Document(d) => d.set(attr, value),
        }
    }

    fn as_mapping(&self) -> Attributes {
        match self {
            Entity::Record(r) => r.as_mapping(),
            Entity::Document(d) => d.as_mapping(),
        }
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entity::Record(r) => r.attributes.serialize(serializer),
            Entity::Document(d) => d.entries.serialize(serializer),
        }
    }
}
