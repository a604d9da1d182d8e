//! Echo server - hosts one service over a local domain socket.
//!
//! This example demonstrates:
//! - Building a service with typed parameter descriptors
//! - Listening on a transport endpoint
//! - Broadcasting a notification to connected clients
//!
//! Run the matching client from another terminal:
//!
//! ```sh
//! cargo run --example echo_server
//! cargo run --example echo_client
//! ```

use std::time::Duration;

use serde_json::json;
use wirerpc::{Endpoint, ParamKind, ParamSpec, Server, Service, WireFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let echo = Service::builder("echo")
        .method(
            "say",
            vec![ParamSpec::new("text", ParamKind::String)],
            |args| Ok(args[0].clone()),
        )
        .method(
            "repeat",
            vec![
                ParamSpec::new("text", ParamKind::String),
                ParamSpec::new("times", ParamKind::Int).with_default(2),
            ],
            |args| {
                let text = args[0].as_str().unwrap_or("");
                let times = args[1].as_i64().unwrap_or(0).max(0) as usize;
                Ok(json!(text.repeat(times)))
            },
        )
        .build();

    let server = Server::new(WireFormat::Compact);
    server.add_service(&echo);

    let endpoint = Endpoint::tcp("127.0.0.1:4050".parse()?);
    server.listen(&endpoint).await?;
    println!("listening on {}", endpoint);

    // Tick a notification at every connected client.
    let mut seconds = 0u64;
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        seconds += 1;
        server
            .notify_connected_clients_with("echo.tick", vec![json!(seconds)])
            .await;
    }
}
