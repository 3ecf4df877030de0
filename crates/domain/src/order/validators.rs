//! Business rules for create-order requests.
//!
//! Both validators are independent of each other and of the catalog: product
//! existence and stock are checked under lock during placement.

use std::collections::BTreeMap;

use async_trait::async_trait;

use sales_store::ProductId;

use super::CreateOrderRequest;
use crate::DomainError;
use crate::validation::{ModelValidator, ValidationErrors, ValidationFlow};

/// Largest quantity a single order line stores.
pub const MAX_LINE_QUANTITY: u32 = i16::MAX as u32;

/// Most lines a single order may carry.
pub const MAX_ORDER_LINES: usize = i16::MAX as usize;

fn check_text(
    errors: &mut ValidationErrors,
    property: &str,
    value: &str,
    required: bool,
    max_len: usize,
) {
    if required && value.trim().is_empty() {
        errors.add(property, "is required");
    } else if value.chars().count() > max_len {
        errors.add(property, format!("must be at most {max_len} characters"));
    }
}

/// Checks the shipping header and that the order has lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOrderRequestValidator;

#[async_trait]
impl ModelValidator<CreateOrderRequest> for CreateOrderRequestValidator {
    async fn validate(
        &self,
        model: &CreateOrderRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        check_text(errors, "ShipAddress", &model.ship_address, true, 60);
        check_text(errors, "ShipCity", &model.ship_city, true, 15);
        check_text(errors, "ShipCountry", &model.ship_country, true, 15);
        check_text(errors, "ShipPostalCode", &model.ship_postal_code, false, 10);

        if !model.discount.is_finite() || model.discount < 0.0 {
            errors.add("Discount", "must be a non-negative amount");
        }
        if model.lines.is_empty() {
            errors.add("OrderDetails", "must contain at least one line");
        } else if model.lines.len() > MAX_ORDER_LINES {
            errors.add(
                "OrderDetails",
                format!("must contain at most {MAX_ORDER_LINES} lines"),
            );
        }
        Ok(ValidationFlow::Continue)
    }
}

/// Checks every requested line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOrderLineValidator;

#[async_trait]
impl ModelValidator<CreateOrderRequest> for CreateOrderLineValidator {
    async fn validate(
        &self,
        model: &CreateOrderRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        let mut merged: BTreeMap<ProductId, u64> = BTreeMap::new();

        for (index, line) in model.lines.iter().enumerate() {
            if line.product_id.as_i32() <= 0 {
                errors.add(
                    format!("OrderDetails[{index}].ProductId"),
                    "must be a positive id",
                );
            }
            if !line.unit_price.is_positive() {
                errors.add(
                    format!("OrderDetails[{index}].UnitPrice"),
                    "must be greater than zero",
                );
            }
            if line.quantity == 0 {
                errors.add(
                    format!("OrderDetails[{index}].Quantity"),
                    "must be greater than zero",
                );
            }
            *merged.entry(line.product_id).or_default() += u64::from(line.quantity);
        }

        for (product_id, quantity) in merged {
            if quantity > u64::from(MAX_LINE_QUANTITY) {
                errors.add(
                    "OrderDetails",
                    format!(
                        "quantity for product {product_id} must not exceed {MAX_LINE_QUANTITY}"
                    ),
                );
            }
        }
        Ok(ValidationFlow::Continue)
    }
}
