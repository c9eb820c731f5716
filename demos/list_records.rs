//! Bitable record listing example for the Lark OpenAPI client.
//!
//! This example demonstrates:
//! - Creating a client from environment variables
//! - Listing the tables of a Bitable app
//! - Fetching every record of a table across pages
//!
//! # Usage
//!
//! Set your app credentials as environment variables (the credential store
//! must already hold a refresh token, see the `fetch_token` example):
//! ```bash
//! export LARK_APP_ID="cli_your_app_id"
//! export LARK_APP_SECRET="your-app-secret"
//! export LARK_CREDENTIALS_PATH="$HOME/.config/lark/credentials.json"
//! ```
//!
//! Then run:
//! ```bash
//! cargo run --example list_records -- <app-token> [table-id]
//! ```

use std::sync::Arc;

use integrations_lark::client::LarkClient;
use integrations_lark::services::BitableService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    println!("=== Lark Bitable Records Example ===\n");

    let mut args = std::env::args().skip(1);
    let app_token = args.next().ok_or("usage: list_records <app-token> [table-id]")?;
    let table_id = args.next();

    println!("1. Creating Lark client from environment...");
    let client = Arc::new(LarkClient::from_env()?);
    let bitable = client.bitable();
    println!("   ✓ Client created\n");

    let table_id = match table_id {
        Some(id) => id,
        None => {
            println!("2. No table given, listing tables of {}...", app_token);
            let page = bitable.list_tables(&app_token, None).await?;
            for table in &page.items {
                println!("   - {} ({})", table.name, table.table_id);
            }
            let first = page
                .items
                .first()
                .ok_or("the app has no tables")?;
            println!("   Using first table: {}\n", first.table_id);
            first.table_id.clone()
        }
    };

    println!("3. Fetching all records of {}...", table_id);
    let records = bitable.list_all_records(&app_token, &table_id, None).await?;
    println!("   ✓ {} records fetched\n", records.len());

    println!("=== Records ===");
    for record in records.iter().take(10) {
        let id = record.record_id.as_deref().unwrap_or("<unsaved>");
        let fields: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        println!("{}  fields: {}", id, fields.join(", "));
    }
    if records.len() > 10 {
        println!("… and {} more", records.len() - 10);
    }

    let snapshot = client.metrics().snapshot();
    println!("\n=== Client Metrics ===");
    println!("Requests:        {}", snapshot.requests_total);
    println!("Retries:         {}", snapshot.retries);
    println!("Token refreshes: {}", snapshot.token_refreshes);

    Ok(())
}
