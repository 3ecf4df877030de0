//! Shared identifiers and value types used across the sales crates.

mod money;
mod types;

pub use money::Money;
pub use types::{
    CustomerId, DiscountType, OrderId, ProductId, ShippingType, UnknownClassifier, UserId,
};
