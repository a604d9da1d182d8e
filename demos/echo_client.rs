//! Echo client - calls the echo server and watches its notifications.
//!
//! Run `cargo run --example echo_server` first.

use serde_json::json;
use wirerpc::{Endpoint, RpcStream, Socket, WireFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let endpoint = Endpoint::tcp("127.0.0.1:4050".parse()?);
    let stream = RpcStream::connect(&endpoint).await?;
    let socket = Socket::new(stream, WireFormat::Compact);

    let response = socket
        .invoke_remote_method_blocking("echo.say", vec![json!("hello")])
        .await?;
    println!("echo.say -> {:?}", response.result());

    let response = socket
        .invoke_remote_method_blocking("echo.repeat", vec![json!("ha"), json!(3)])
        .await?;
    println!("echo.repeat -> {:?}", response.result());

    // Watch a few server-initiated notifications.
    let mut inbound = socket.subscribe();
    for _ in 0..3 {
        let message = inbound.recv().await?;
        println!("notification: {:?} {:?}", message.method(), message.params());
    }

    Ok(())
}
