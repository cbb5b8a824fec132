//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Tell configuration errors from connection errors
//! - Handle timeouts and refused connections
//! - Branch on non-JSON replies without treating them as failures
//!
//! Run with: `cargo run --example error_handling`

use qengine_client::{Client, ConnectionFailure, Error, NormalizedResult};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("qengine_client=info")
        .init();

    let client = Client::builder()
        .base_url("https://httpbin.org")?
        .timeout(Duration::from_secs(2))
        .build()?;

    println!("=== Example 1: Non-JSON replies ===");
    match client.call(client.get("/status/404")).await? {
        NormalizedResult::Decoded(value) => println!("Decoded: {}", value),
        NormalizedResult::Error { status, raw_body } => {
            println!("Status {} with body {:?}", status, raw_body);
        }
    }
    println!();

    println!("=== Example 2: Malformed input ===");
    match client.post("/post").body_str("neither json nor a query string") {
        Ok(_) => println!("Unexpectedly accepted"),
        Err(e @ Error::MalformedBodyInput(_)) => {
            println!("Rejected before sending: {}", e);
            println!("  Is configuration error: {}", e.is_configuration());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 3: Timeouts ===");
    match client.send(client.get("/delay/5")).await {
        Ok(response) => println!("Got {} before the timeout", response.status_line),
        Err(e) if e.is_timeout() => println!("Timed out: {}", e),
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 4: Unreachable engine ===");
    let unreachable = Client::builder()
        .base_url("http://127.0.0.1:9")?
        .timeout(Duration::from_secs(1))
        .build()?;
    match unreachable.send(unreachable.get("/info")).await {
        Ok(response) => println!("Unexpected reply: {}", response.status_line),
        Err(e) => match e.connection_failure() {
            Some(ConnectionFailure::Connect) => println!("Connection refused: {}", e),
            Some(kind) => println!("Connection failure ({}): {}", kind, e),
            None => println!("Other error: {}", e),
        },
    }

    Ok(())
}
