use store_server::{Config, Server, common};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    common::logger::init(&config)?;

    tracing::info!(
        port = config.http_port,
        environment = %config.environment,
        "Store server starting"
    );

    let server = Server::new(config);
    server.run().await
}
