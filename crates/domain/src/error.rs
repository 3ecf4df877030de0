//! Domain error types.

use sales_store::{ProductId, StoreError};
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors a use case reports to its caller.
///
/// `Unauthenticated` and `ValidationFailed` are raised before any transaction
/// is opened. The remaining variants are raised inside the transactional
/// region and are returned only after the transaction has been rolled back.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No authenticated identity is present.
    #[error("User is not authenticated")]
    Unauthenticated,

    /// One or more business rules failed. Carries every collected error.
    #[error("Validation failed: {}", format_errors(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// A line references a product that does not exist.
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),

    /// A line requests more units than are in stock.
    #[error(
        "Insufficient stock for product {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: i32,
        requested: u32,
    },

    /// Storage failed: flush, commit, lock timeout or connectivity.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    /// Returns the validation errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            DomainError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}
