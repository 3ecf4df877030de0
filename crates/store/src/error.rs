use thiserror::Error;

use crate::{CustomerId, ProductId};

/// Errors that can occur when interacting with the sales store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Inventory rows could not be locked before the configured timeout.
    #[error("Timed out waiting for inventory locks on products {product_ids:?}")]
    LockTimeout { product_ids: Vec<ProductId> },

    /// A staged update targeted a customer that does not exist.
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// A staged write violated a storage constraint.
    #[error("Constraint violation: {constraint}")]
    ConstraintViolation { constraint: String },

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Names of the storage constraints both store implementations enforce.
pub mod constraint {
    pub const STOCK_NON_NEGATIVE: &str = "products_units_in_stock_non_negative";
    pub const PRICE_POSITIVE: &str = "products_unit_price_positive";
    pub const PRODUCT_NAME_UNIQUE: &str = "idx_products_name_lower";
    pub const LINE_PRODUCT_FK: &str = "order_lines_product_id_fkey";
    pub const LINE_UNIQUE_PRODUCT: &str = "order_lines_pkey";
    pub const LINE_QUANTITY_POSITIVE: &str = "order_lines_quantity_positive";
    pub const LINE_QUANTITY_RANGE: &str = "order_lines_quantity_range";
    pub const CUSTOMER_PKEY: &str = "customers_pkey";
    pub const CUSTOMER_NAME_UNIQUE: &str = "idx_customers_name_lower";
    pub const CUSTOMER_ID_LENGTH: &str = "customers_id_length";
    pub const CUSTOMER_BALANCE_NON_NEGATIVE: &str = "customers_current_balance_non_negative";
}

impl StoreError {
    pub(crate) fn constraint(name: &str) -> Self {
        StoreError::ConstraintViolation {
            constraint: name.to_string(),
        }
    }
}
