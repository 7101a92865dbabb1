//! YAML mapping declarations.
//!
//! Only key lookups can be declared in a file; computed entries need the
//! builder. Example:
//!
//! ```yaml
//! entities:
//!   - name: issue
//!     kind: record
//!     fields:
//!       id: issueId
//!       title: summary
//!     reverse:
//!       summary: title
//!     filters:
//!       state: status
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use super::{Mapping, MappingError, MappingRegistry, ObjectKind};

/// Top-level structure of a mapping declaration file.
#[derive(Deserialize, Debug)]
pub struct MappingFile {
    pub entities: Vec<MappingDecl>,
}

/// A single entity's key-lookup tables.
#[derive(Deserialize, Debug)]
pub struct MappingDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    /// attribute -> wire key
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// wire key -> attribute
    #[serde(default)]
    pub reverse: BTreeMap<String, String>,
    /// query parameter -> filter argument
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl MappingDecl {
    pub fn into_mapping(self) -> Result<Arc<Mapping>, MappingError> {
        let mut builder = Mapping::builder(&self.name).kind(self.kind);
        for (attr, key) in &self.fields {
            builder = builder.field(attr, key);
        }
        for (key, attr) in &self.reverse {
            builder = builder.reverse(key, attr);
        }
        for (param, input) in &self.filters {
            builder = builder.filter(param, input);
        }
        builder.build()
    }
}

impl MappingRegistry {
    /// Parses a declaration file and registers every entity in it.
    pub fn from_yaml(yaml_content: &str) -> Result<Self, MappingError> {
        let file: MappingFile = serde_yml::from_str(yaml_content)?;
        let mut registry = MappingRegistry::new();
        for decl in file.entities {
            registry.register(decl.into_mapping()?)?;
        }
        Ok(registry)
    }
}
