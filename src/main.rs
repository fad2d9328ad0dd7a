use tally::config::AppConfig;
use tally::server::ServerBuilder;
use tally::storage::{connect_documents, connect_objects};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    fmt().with_env_filter(env_filter).with_target(false).init();

    let config = AppConfig::load()?;
    tracing::info!(
        database = ?config.database.backend,
        objects = ?config.objects.backend,
        isolation = ?config.balance.isolation,
        "starting tally"
    );

    let documents = connect_documents(&config.database).await?;
    let objects = connect_objects(&config.objects)?;

    ServerBuilder::new()
        .with_config(config)
        .with_shared_document_store(documents)
        .with_object_store(objects)
        .serve()
        .await
}
