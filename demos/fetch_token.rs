//! Token bootstrap example for the Lark OpenAPI client.
//!
//! This example demonstrates:
//! - Creating a client from environment variables
//! - Seeding the credential store with a refresh token
//! - Fetching a managed user access token
//!
//! # Usage
//!
//! Set your app credentials as environment variables:
//! ```bash
//! export LARK_APP_ID="cli_your_app_id"
//! export LARK_APP_SECRET="your-app-secret"
//! export LARK_CREDENTIALS_PATH="$HOME/.config/lark/credentials.json"
//! ```
//!
//! Then run with a refresh token obtained from the OAuth authorization flow:
//! ```bash
//! cargo run --example fetch_token -- <refresh-token>
//! ```

use std::sync::Arc;

use integrations_lark::auth::TokenManager;
use integrations_lark::client::LarkClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    println!("=== Lark Token Bootstrap Example ===\n");

    let refresh_token = std::env::args()
        .nth(1)
        .ok_or("usage: fetch_token <refresh-token>")?;

    println!("1. Creating Lark client from environment...");
    let client = Arc::new(LarkClient::from_env()?);
    println!("   ✓ Client created\n");

    println!("2. Exchanging the refresh token...");
    let token_manager = client.token_manager();
    let token = match token_manager.refresh_token(&refresh_token).await {
        Ok(token) => token,
        Err(e) if e.needs_reauth() => {
            eprintln!("   ✗ The refresh token was rejected: {}", e);
            eprintln!("   Run the OAuth authorization flow again to obtain a new one.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    println!("   ✓ Access token issued\n");

    let preview: String = token.chars().take(8).collect();
    println!("=== Token ===");
    println!("Value:   {}… ({} chars)", preview, token.len());
    if let Some(expires_at) = token_manager.token_expiry().await {
        println!("Expires: {}", expires_at);
    }
    println!("\nThe credential store now holds the rotated refresh token;");
    println!("subsequent runs can call the API without re-authenticating.");

    Ok(())
}
