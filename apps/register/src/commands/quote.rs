//! # Quotation Commands
//!
//! `quote peek` shows the number the next `quote issue` would hand out;
//! only `issue` reserves it.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    pub quotation: String,
    /// `false` for a peek.
    pub reserved: bool,
}

pub async fn peek_quotation(db: &DbState) -> Result<QuotationResponse, ApiError> {
    let next = db.inner().quotations().peek_next().await?;
    Ok(QuotationResponse {
        quotation: next.to_string(),
        reserved: false,
    })
}

pub async fn issue_quotation(db: &DbState) -> Result<QuotationResponse, ApiError> {
    let issued = db.inner().quotations().issue().await?;
    info!(quotation = %issued, "issue_quotation complete");

    Ok(QuotationResponse {
        quotation: issued.to_string(),
        reserved: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_peek_then_issue() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());

        let peeked = peek_quotation(&db).await.unwrap();
        assert!(!peeked.reserved);

        let issued = issue_quotation(&db).await.unwrap();
        assert!(issued.reserved);
        assert_eq!(issued.quotation, peeked.quotation);

        let next = issue_quotation(&db).await.unwrap();
        assert!(next.quotation > issued.quotation);
    }
}
