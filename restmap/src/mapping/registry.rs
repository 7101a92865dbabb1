use std::collections::HashMap;
use std::sync::Arc;

use super::{Mapping, MappingError};
use crate::Error;

/// Entity type name -> mapping lookup used by the decoder and the client.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: HashMap<String, Arc<Mapping>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `mapping` under its own name.
    pub fn register(&mut self, mapping: Arc<Mapping>) -> Result<(), MappingError> {
        if self.mappings.contains_key(mapping.name()) {
            return Err(MappingError::DuplicateEntity(mapping.name().to_string()));
        }
        self.mappings.insert(mapping.name().to_string(), mapping);
        Ok(())
    }

    /// Chaining form of [`MappingRegistry::register`].
    pub fn with(mut self, mapping: Arc<Mapping>) -> Result<Self, MappingError> {
        self.register(mapping)?;
        Ok(self)
    }

    /// Looks up the mapping for `entity_type`.
    pub fn get(&self, entity_type: &str) -> Result<&Arc<Mapping>, Error> {
        self.mappings.get(entity_type).ok_or_else(|| {
            tracing::error!("No mapping registered for object type {}", entity_type);
            Error::UnknownObjectType(entity_type.to_string())
        })
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.mappings.contains_key(entity_type)
    }

    /// Registered entity type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mappings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
