use anyhow::Result;
use clap::Args;
use restmap::{Client, DecodeOptions, RequestOptions};
use serde_json::Value;

use super::parse_key_value;
use crate::output::print_json;

#[derive(Args)]
pub struct GetArgs {
    /// Endpoint path below the base URL (e.g. /status)
    pub endpoint: String,

    /// Query parameter as key=value; repeatable
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, Value)>,

    /// Decode only this member of the response object
    #[arg(long)]
    pub key: Option<String>,
}

pub async fn run(args: &GetArgs, client: &Client) -> Result<()> {
    let mut options = RequestOptions::default();
    for (name, value) in &args.params {
        options = match value {
            Value::String(s) => options.with_query(name, s),
            other => options.with_query(name, other),
        };
    }

    let response = client.get(&args.endpoint, options).await?;
    if response.status != 200 {
        return Err(client.handle_unclassified(&response).into());
    }

    let mut decode = DecodeOptions::default();
    if let Some(key) = &args.key {
        decode = decode.with_key(key);
    }
    print_json(&client.decode(&response, None, &decode)?);
    Ok(())
}
