use anyhow::Result;
use clap::Args;
use restmap::Client;

use crate::output::print_json;

#[derive(Args)]
pub struct FetchArgs {
    /// Registered entity type
    pub entity: String,

    /// Entity id, appended to the namespace
    pub id: String,

    /// Resource path prefix (e.g. /users)
    #[arg(long, default_value = "")]
    pub namespace: String,
}

pub async fn run(args: &FetchArgs, client: &Client) -> Result<()> {
    let entity = client
        .namespaced(&args.namespace)
        .fetch_entity(&args.id, &args.entity)
        .await?;
    print_json(&entity);
    Ok(())
}
