use anyhow::Context;
use mongodb::{bson::doc, options::ClientOptions, Client, Database};
use tracing::info;

use crate::config::AppConfig;

/// Connects to MongoDB and pings it. The driver connects lazily, so the
/// ping is what surfaces an unreachable server at startup.
pub async fn connect(config: &AppConfig) -> anyhow::Result<Database> {
    let mut options = ClientOptions::parse(config.mongodb_uri.as_str())
        .await
        .context("parse MONGODB_URI")?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

    let client = Client::with_options(options).context("build mongodb client")?;
    let db = client.database(&config.mongodb_database);
    db.run_command(doc! { "ping": 1 })
        .await
        .context("connect to mongodb")?;

    info!(database = %config.mongodb_database, "connected to mongodb");
    Ok(db)
}
