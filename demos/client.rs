use rand::{SeedableRng, rngs::StdRng};
use tokio::net::TcpStream;
use wsmux::{Message, client::Client, options::ConnectOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("WSMUX_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:8331"));

    let stream = TcpStream::connect(&addr).await?;

    let mut client = Client::connect(
        ConnectOptions::default().with_host(&addr),
        stream,
        StdRng::from_os_rng(),
    )
    .await?;

    client.send(Message::Text("Hello, WebSocket!\n")).await?;
    client
        .send(Message::Text("first record\nsecond record\n"))
        .await?;
    client.send(Message::Binary(b"raw bytes, no delimiter")).await?;

    client.shutdown().await?;

    Ok(())
}
