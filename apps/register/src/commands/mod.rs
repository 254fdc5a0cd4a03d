//! # Register Commands Module
//!
//! Every subcommand the register understands.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (clap parsing + dispatch)
//! ├── product.rs  ◄─── Product search, add
//! ├── sale.rs     ◄─── Commit, modify, void, list
//! └── quote.rs    ◄─── Quotation numbers
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  $ register sale commit cart.json                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Command::parse(args)  ──► Command::SaleCommit { request: "cart.json" } │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  execute(&DbState, &ConfigState, command)                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  sale::commit_sale(...) -> Result<CommitSaleResponse, ApiError>         │
//! │         │                                                               │
//! │         ▼ (serde_json, camelCase)                                       │
//! │  stdout: { "saleId": 12, "totalCents": 4000, ... }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod quote;
pub mod sale;

use clap::{CommandFactory, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

const ENVIRONMENT_HELP: &str = "\
Environment:
  TALLY_DB_PATH          database file (default: platform data directory)
  TALLY_SELLER           seller used when a request has none
  TALLY_STORE_NAME       store name
  TALLY_CURRENCY_SYMBOL  currency symbol for formatted amounts
  RUST_LOG               log filter (default: info,tally=debug,sqlx=warn)";

/// Products listed when no limit is given.
const DEFAULT_PRODUCT_LIMIT: u32 = 50;

/// Tally POS register
#[derive(Debug, Parser)]
#[command(name = "register", version, after_help = ENVIRONMENT_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Option<TopLevel>,
}

#[derive(Debug, Subcommand)]
enum TopLevel {
    /// Search products by code or name
    Products { query: Option<String> },
    /// Manage the product catalogue
    #[command(subcommand)]
    Product(ProductCommand),
    /// Commit, modify or void a sale
    #[command(subcommand)]
    Sale(SaleCommand),
    /// List recorded sales
    Sales,
    /// Quotation numbers
    #[command(subcommand)]
    Quote(QuoteCommand),
}

#[derive(Debug, Subcommand)]
enum ProductCommand {
    /// Add a product with its opening stock
    Add {
        code: String,
        name: String,
        price_cents: i64,
        quantity: i64,
    },
}

#[derive(Debug, Subcommand)]
enum SaleCommand {
    /// Commit the cart in a JSON request file
    Commit { request: PathBuf },
    /// Replace the line of a single-line sale
    Modify { sale_id: i64, request: PathBuf },
    /// Void a sale and restore its stock
    Void { sale_id: i64 },
}

#[derive(Debug, Subcommand)]
enum QuoteCommand {
    /// Show the next quotation number without issuing it
    Peek,
    /// Issue the next quotation number
    Issue,
}

/// A parsed register invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Products { query: Option<String> },
    ProductAdd {
        code: String,
        name: String,
        price_cents: i64,
        quantity: i64,
    },
    SaleCommit { request: PathBuf },
    SaleModify { sale_id: i64, request: PathBuf },
    SaleVoid { sale_id: i64 },
    Sales,
    QuotePeek,
    QuoteIssue,
}

impl Command {
    /// Parses the arguments after the program name.
    ///
    /// `--help` and `--version` come back as errors whose
    /// [`use_stderr`](clap::Error::use_stderr) is false.
    pub fn parse(args: &[String]) -> Result<Command, clap::Error> {
        let argv = std::iter::once("register".to_string()).chain(args.iter().cloned());
        let cli = Cli::try_parse_from(argv)?;
        Ok(cli.command.map_or(Command::Help, Command::from))
    }
}

impl From<TopLevel> for Command {
    fn from(top: TopLevel) -> Self {
        match top {
            TopLevel::Products { query } => Command::Products { query },
            TopLevel::Product(ProductCommand::Add {
                code,
                name,
                price_cents,
                quantity,
            }) => Command::ProductAdd {
                code,
                name,
                price_cents,
                quantity,
            },
            TopLevel::Sale(SaleCommand::Commit { request }) => Command::SaleCommit { request },
            TopLevel::Sale(SaleCommand::Modify { sale_id, request }) => {
                Command::SaleModify { sale_id, request }
            }
            TopLevel::Sale(SaleCommand::Void { sale_id }) => Command::SaleVoid { sale_id },
            TopLevel::Sales => Command::Sales,
            TopLevel::Quote(QuoteCommand::Peek) => Command::QuotePeek,
            TopLevel::Quote(QuoteCommand::Issue) => Command::QuoteIssue,
        }
    }
}

/// Help text for a bare `register` invocation.
pub fn help_text() -> String {
    Cli::command().render_help().to_string()
}

/// Runs a command and returns what to print on stdout.
pub async fn execute(
    db: &DbState,
    config: &ConfigState,
    command: Command,
) -> Result<String, ApiError> {
    debug!(?command, "Executing command");

    match command {
        Command::Help => Ok(help_text()),
        Command::Products { query } => {
            let products = product::search_products(
                db,
                query.as_deref().unwrap_or(""),
                Some(DEFAULT_PRODUCT_LIMIT),
            )
            .await?;
            render(&products)
        }
        Command::ProductAdd {
            code,
            name,
            price_cents,
            quantity,
        } => render(&product::add_product(db, &code, &name, price_cents, quantity).await?),
        Command::SaleCommit { request } => {
            let request = read_request(&request)?;
            render(&sale::commit_sale(db, config, request).await?)
        }
        Command::SaleModify { sale_id, request } => {
            let request = read_request(&request)?;
            render(&sale::modify_sale(db, config, sale_id, request).await?)
        }
        Command::SaleVoid { sale_id } => render(&sale::void_sale(db, config, sale_id).await?),
        Command::Sales => render(&sale::list_sales(db, config).await?),
        Command::QuotePeek => render(&quote::peek_quotation(db).await?),
        Command::QuoteIssue => render(&quote::issue_quotation(db).await?),
    }
}

/// Reads and deserializes a JSON request file.
fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ApiError::validation(format!("Cannot read request {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn render<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args("products wid")).unwrap(),
            Command::Products {
                query: Some("wid".to_string())
            }
        );
        assert_eq!(
            Command::parse(&args("product add P1 Widget 1000 10")).unwrap(),
            Command::ProductAdd {
                code: "P1".to_string(),
                name: "Widget".to_string(),
                price_cents: 1000,
                quantity: 10,
            }
        );
        assert_eq!(
            Command::parse(&args("sale modify 7 change.json")).unwrap(),
            Command::SaleModify {
                sale_id: 7,
                request: PathBuf::from("change.json"),
            }
        );
        assert_eq!(Command::parse(&args("quote issue")).unwrap(), Command::QuoteIssue);
    }

    #[test]
    fn test_parse_errors() {
        let err = ApiError::from(Command::parse(&args("sale void seven")).unwrap_err());
        assert_eq!(err.code, ErrorCode::Usage);
        assert!(err.message.contains("seven"));

        let err = ApiError::from(Command::parse(&args("refund 3")).unwrap_err());
        assert_eq!(err.code, ErrorCode::Usage);

        let err = ApiError::from(Command::parse(&args("product add P1 Widget 1000")).unwrap_err());
        assert_eq!(err.code, ErrorCode::Usage);
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = Command::parse(&args("--help")).unwrap_err();
        assert!(!err.use_stderr());
        let err = Command::parse(&args("help sale")).unwrap_err();
        assert!(!err.use_stderr());

        let help = help_text();
        assert!(help.contains("products"));
        assert!(help.contains("TALLY_DB_PATH"));
    }

    #[test]
    fn test_missing_request_file() {
        let err = read_request::<serde_json::Value>(Path::new("/nonexistent/req.json"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
