//! # Register Entry Point
//!
//! ```text
//! $ register sale commit cart.json
//! {
//!   "saleId": 12,
//!   "lineCount": 2,
//!   "totalCents": 6250,
//!   "total": "$62.50"
//! }
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    tally_register::run(args).await
}
