use async_trait::async_trait;

use sales_store::SalesStore;

use super::{CreateCustomerRequest, GetCustomerByIdRequest, UpdateCustomerRequest, messages};
use crate::DomainError;
use crate::validation::{ModelValidator, ValidationConstraint, ValidationErrors, ValidationFlow};

/// Customer codes are exactly this many characters.
pub const CUSTOMER_ID_LEN: usize = 5;

pub const MAX_CUSTOMER_NAME_LEN: usize = 40;

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        errors.add("Name", "is required");
    } else if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        errors.add(
            "Name",
            format!("must be at most {MAX_CUSTOMER_NAME_LEN} characters"),
        );
    }
}

fn has_customer_id_len(id: &str) -> bool {
    id.trim().chars().count() == CUSTOMER_ID_LEN
}

/// Checks that the code and name are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateCustomerRequestValidator;

#[async_trait]
impl ModelValidator<CreateCustomerRequest> for CreateCustomerRequestValidator {
    async fn validate(
        &self,
        model: &CreateCustomerRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        if model.id.trim().is_empty() {
            errors.add("Id", "is required");
        }
        check_name(errors, &model.name);
        Ok(ValidationFlow::Continue)
    }
}

/// Checks a new customer against the existing ones.
///
/// A code of the wrong length halts the pipeline.
pub struct CreateCustomerBusinessValidator<S> {
    store: S,
}

impl<S: SalesStore> CreateCustomerBusinessValidator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SalesStore> ModelValidator<CreateCustomerRequest> for CreateCustomerBusinessValidator<S> {
    fn constraint(&self) -> ValidationConstraint {
        ValidationConstraint::ValidateIfThereAreNoPreviousErrors
    }

    async fn validate(
        &self,
        model: &CreateCustomerRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        let name = model.name.trim();
        if self.store.customer_name_exists(name, None).await? {
            errors.add("Name", messages::already_exists(name));
        }
        if !has_customer_id_len(&model.id) {
            errors.add(
                "Id",
                format!("must be exactly {CUSTOMER_ID_LEN} characters"),
            );
            return Ok(ValidationFlow::Halt);
        }
        if model.current_balance.cents() < 0 {
            errors.add("CurrentBalance", "must not be negative");
        }
        Ok(ValidationFlow::Continue)
    }
}

/// Checks that the code and name are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateCustomerRequestValidator;

#[async_trait]
impl ModelValidator<UpdateCustomerRequest> for UpdateCustomerRequestValidator {
    async fn validate(
        &self,
        model: &UpdateCustomerRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        if model.customer_id.trim().is_empty() {
            errors.add("CustomerId", "is required");
        }
        check_name(errors, &model.name);
        Ok(ValidationFlow::Continue)
    }
}

/// Checks that the customer exists and that a new name is free.
pub struct UpdateCustomerBusinessValidator<S> {
    store: S,
}

impl<S: SalesStore> UpdateCustomerBusinessValidator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: SalesStore> ModelValidator<UpdateCustomerRequest> for UpdateCustomerBusinessValidator<S> {
    fn constraint(&self) -> ValidationConstraint {
        ValidationConstraint::ValidateIfThereAreNoPreviousErrors
    }

    async fn validate(
        &self,
        model: &UpdateCustomerRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        let id = model.id();
        let Some(current) = self.store.get_customer(&id).await? else {
            errors.add("CustomerId", messages::not_found(id.as_str()));
            return Ok(ValidationFlow::Halt);
        };

        let name = model.name.trim();
        let renamed = current.name.to_lowercase() != name.to_lowercase();
        if renamed && self.store.customer_name_exists(name, Some(&id)).await? {
            errors.add("Name", messages::already_exists(name));
        }
        if model.current_balance.cents() < 0 {
            errors.add("CurrentBalance", "must not be negative");
        }
        Ok(ValidationFlow::Continue)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetCustomerByIdRequestValidator;

#[async_trait]
impl ModelValidator<GetCustomerByIdRequest> for GetCustomerByIdRequestValidator {
    async fn validate(
        &self,
        model: &GetCustomerByIdRequest,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError> {
        if !has_customer_id_len(&model.customer_id) {
            errors.add(
                "CustomerId",
                format!("must be exactly {CUSTOMER_ID_LEN} characters"),
            );
        }
        Ok(ValidationFlow::Continue)
    }
}
