use tracing_subscriber::EnvFilter;
use wsmux::{LogSink, Server, options::ServerOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("WSMUX_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:8331"));

    let mut server = Server::bind(addr, ServerOptions::default(), LogSink).await?;

    server.run().await;

    Ok(())
}
