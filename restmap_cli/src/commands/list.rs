use anyhow::Result;
use clap::Args;
use restmap::{Client, ListQuery};
use serde_json::Value;

use super::parse_key_value;
use crate::output::print_json;

#[derive(Args)]
pub struct ListArgs {
    /// Registered entity type
    pub entity: String,

    /// Resource path prefix (e.g. /users)
    #[arg(long, default_value = "")]
    pub namespace: String,

    /// Page number
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Results per page; defaults to the configured page size
    #[arg(long)]
    pub limit: Option<u64>,

    /// Explicit 0-based offset, overriding --page
    #[arg(long)]
    pub start: Option<u64>,

    /// Sort field; prefix with '-' for descending order
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Filter argument as key=value, translated by the entity's filter table
    #[arg(long = "filter", value_parser = parse_key_value)]
    pub filters: Vec<(String, Value)>,
}

pub async fn run(args: &ListArgs, client: &Client) -> Result<()> {
    let mut query = ListQuery::default().with_page(args.page);
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    if let Some(start) = args.start {
        query = query.with_start(start);
    }
    if let Some(sort_by) = &args.sort_by {
        query = query.with_sort_by(sort_by);
    }
    for (name, value) in &args.filters {
        query = query.with_filter(name, value.clone());
    }

    let page = client
        .namespaced(&args.namespace)
        .list_entities(Some(&args.entity), &query)
        .await?;
    print_json(&page);
    Ok(())
}
