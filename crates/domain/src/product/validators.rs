use async_trait::async_trait;

use sales_store::SalesStore;

use super::{CreateProductRequest, messages};
use crate::DomainError;
use crate::validation::{ModelValidator, ValidationConstraint, ValidationErrors, ValidationFlow};

pub const MAX_PRODUCT_NAME_LEN: usize = 40;

/// Checks price and stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateProductRequestValidator;

#[async_trait]
impl ModelValidator<CreateProductRequest> for CreateProductRequestValidator {
    async fn validate(
        &self,
        model: &CreateProductRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        if !model.unit_price.is_positive() {
            errors.add("UnitPrice", "must be greater than zero");
        }
        if model.units_in_stock < 0 {
            errors.add("UnitsInStock", "must not be negative");
        }
        Ok(ValidationFlow::Continue)
    }
}

/// Checks the product name against the catalog.
///
/// Runs only on an otherwise valid request. A malformed name halts the
/// pipeline before the catalog is queried.
pub struct CreateProductBusinessValidator<S> {
    store: S,
}

impl<S: SalesStore> CreateProductBusinessValidator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SalesStore> ModelValidator<CreateProductRequest> for CreateProductBusinessValidator<S> {
    fn constraint(&self) -> ValidationConstraint {
        ValidationConstraint::ValidateIfThereAreNoPreviousErrors
    }

    async fn validate(
        &self,
        model: &CreateProductRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        let name = model.name.trim();
        if name.is_empty() {
            errors.add("Name", "is required");
            return Ok(ValidationFlow::Halt);
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LEN {
            errors.add(
                "Name",
                format!("must be at most {MAX_PRODUCT_NAME_LEN} characters"),
            );
            return Ok(ValidationFlow::Halt);
        }

        if self.store.product_name_exists(name).await? {
            errors.add("Name", messages::already_exists(name));
        }
        Ok(ValidationFlow::Continue)
    }
}
