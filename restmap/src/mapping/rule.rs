use std::sync::Arc;

use serde_json::Value;

use crate::types::Attributes;

/// Signature of a computed mapping entry. Receives the whole source object.
pub type TransformFn = dyn Fn(&Attributes) -> Option<Value> + Send + Sync;

/// One entry of a mapping table: either copy a key from the source object or
/// compute the value from the whole source object.
#[derive(Clone)]
pub enum FieldRule {
    KeyLookup(String),
    Transform(Arc<TransformFn>),
}

impl FieldRule {
    pub fn key(key: impl Into<String>) -> Self {
        FieldRule::KeyLookup(key.into())
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Attributes) -> Option<Value> + Send + Sync + 'static,
    {
        FieldRule::Transform(Arc::new(f))
    }

    /// Evaluates the rule against `source`. A missing key, a transform that
    /// yields nothing and a JSON `null` are all reported as `None`.
    pub fn evaluate(&self, source: &Attributes) -> Option<Value> {
        let value = match self {
            FieldRule::KeyLookup(key) => source.get(key).cloned(),
            FieldRule::Transform(f) => f(source),
        };
        value.filter(|v| !v.is_null())
    }
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRule::KeyLookup(key) => f.debug_tuple("KeyLookup").field(key).finish(),
            FieldRule::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}
