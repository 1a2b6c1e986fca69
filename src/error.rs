use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("could not find {table} with {index} equal to {key}")]
    NotFound {
        table: String,
        index: String,
        key: String,
    },
    #[error("insufficient stock of product {product}: requested {requested}")]
    InsufficientStock { product: ProductId, requested: u32 },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("duplicate value {key} for unique index {index} on {table}")]
    UniqueViolation {
        table: String,
        index: String,
        key: String,
    },
    #[error("unknown table {0}")]
    UnknownTable(String),
    #[error("unknown index {index} on table {table}")]
    UnknownIndex { table: String, index: String },
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("payment failed: {0}")]
    PaymentFailure(String),
    #[error("could not finalize reservation: {0}")]
    FinalizeFailure(String),
    #[error("no checkout decision received within {0:?}, reservation aborted")]
    DecisionTimeout(Duration),
    #[error("checkout decision channel closed without a decision, reservation aborted")]
    DecisionAbandoned,
    #[error("nothing to check out for {0}")]
    EmptyCart(String),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ShopError {
    pub fn not_found(table: &str, index: &str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            table: table.to_string(),
            index: index.to_string(),
            key: key.to_string(),
        }
    }

    /// Distinguishes an absent key from an actual failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// One or more errors that together caused an operation to fail.
///
/// Checkout collects both the payment error and the reservation finalize
/// error here so neither one is dropped.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<ShopError>,
}

impl AggregateError {
    pub fn new(errors: Vec<ShopError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ShopError] {
        &self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checkout failed")?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = ShopError::not_found("products", "id", 7);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "could not find products with id equal to 7");
        assert!(!ShopError::PaymentFailure("declined".into()).is_not_found());
    }

    #[test]
    fn test_aggregate_keeps_every_message() {
        let err = ShopError::from(AggregateError::new(vec![
            ShopError::PaymentFailure("card declined".into()),
            ShopError::FinalizeFailure("compensating write failed".into()),
        ]));
        let msg = err.to_string();
        assert!(msg.contains("card declined"));
        assert!(msg.contains("compensating write failed"));
    }
}
