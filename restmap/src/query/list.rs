use std::sync::Arc;

use serde_json::Value;

use super::common::{sort_params, start_offset};
use crate::mapping::Mapping;
use crate::types::{Attributes, DataObject};

/// Arguments of a list call: pagination, sorting and caller filters.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Endpoint below the client namespace. Defaults to `/`.
    pub endpoint: String,
    /// Page number (1-indexed). Defaults to 1.
    pub page: u64,
    /// Results per page. `None` uses the configured page size.
    pub limit: Option<u64>,
    /// Explicit 0-based offset; overrides the one derived from `page`.
    pub start: Option<u64>,
    /// `"field"` or `"-field"`.
    pub sort_by: Option<String>,
    /// Caller filter arguments, translated by the mapping's filter table.
    pub filters: Attributes,
    /// Extra query parameters sent verbatim.
    pub params: Vec<(String, String)>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            endpoint: "/".to_string(),
            page: 1,
            limit: None,
            start: None,
            sort_by: None,
            filters: Attributes::new(),
            params: Vec::new(),
        }
    }
}

/// Wire query assembled from a [`ListQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub query: Vec<(String, String)>,
    pub page: u64,
    pub limit: u64,
    pub start: u64,
}

impl ListQuery {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_sort_by(mut self, sort_by: &str) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self
    }

    pub fn with_filter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.filters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_filters(mut self, filters: Attributes) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Merges verbatim params, mapped filters, `limit`, `start` and sort
    /// parameters, in that order of precedence (later wins per key).
    ///
    /// A numeric `limit` or `start` given through [`ListQuery::with_param`]
    /// stands in for the typed field when that field is unset.
    ///
    /// Without a mapping the filters are sent under their own names.
    pub fn build(&self, mapping: Option<&Arc<Mapping>>, default_limit: u64) -> ListParams {
        let filters = match mapping {
            Some(mapping) => mapping
                .deserialize_filters(&self.filters)
                .map(|entity| entity.as_mapping())
                .unwrap_or_default(),
            None => self.filters.clone(),
        };

        let limit = self
            .limit
            .or_else(|| self.raw_u64("limit"))
            .unwrap_or(default_limit);
        let explicit_start = self.start.or_else(|| self.raw_u64("start"));
        let start = start_offset(explicit_start, self.page, limit);

        let mut query: Vec<(String, String)> = Vec::new();
        let mut set = |name: &str, values: Vec<String>| {
            query.retain(|(k, _)| k != name);
            query.extend(values.into_iter().map(|v| (name.to_string(), v)));
        };
        for (name, value) in &self.params {
            set(name.as_str(), vec![value.clone()]);
        }
        for (name, value) in &filters {
            set(name.as_str(), param_values(value));
        }
        set("limit", vec![limit.to_string()]);
        set("start", vec![start.to_string()]);
        for (name, value) in sort_params(self.sort_by.as_deref()) {
            set(name.as_str(), vec![value]);
        }

        ListParams {
            query,
            page: self.page,
            limit,
            start,
        }
    }

    /// Last verbatim param named `name`, if it parses as a count.
    fn raw_u64(&self, name: &str) -> Option<u64> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.trim().parse().ok())
    }
}

/// Query string form of a filter value. Arrays repeat the parameter.
fn param_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(param_values).collect(),
        other => vec![other.to_string()],
    }
}
