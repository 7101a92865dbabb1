//! Shared list-query helpers: sort parsing and start offset arithmetic.

use std::str::FromStr;

/// Sort order sent as `sortOrder`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order. This is the default.
    #[default]
    Asc,
    /// Descending order, requested with a leading `-` on the sort field.
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            }
        )
    }
}

/// A parsed `sortBy` argument: `"field"` or `"-field"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(());
        }
        Ok(match s.strip_prefix('-') {
            Some(field) => SortBy {
                field: field.to_string(),
                direction: SortDirection::Desc,
            },
            None => SortBy {
                field: s.to_string(),
                direction: SortDirection::Asc,
            },
        })
    }
}

impl SortBy {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("orderBy".to_string(), self.field.clone()),
            ("sortOrder".to_string(), self.direction.to_string()),
        ]
    }
}

/// Query parameters for an optional `sortBy` argument. Absent or empty input
/// contributes nothing.
pub fn sort_params(sort_by: Option<&str>) -> Vec<(String, String)> {
    sort_by
        .and_then(|s| s.parse::<SortBy>().ok())
        .map(|sort| sort.to_query_pairs())
        .unwrap_or_default()
}

/// 0-based offset of a page, saturating at `u64::MAX`. An explicit `start`
/// always wins.
pub fn start_offset(start: Option<u64>, page: u64, limit: u64) -> u64 {
    start.unwrap_or_else(|| page.saturating_sub(1).saturating_mul(limit))
}
