use std::sync::Arc;

use super::{ModelValidator, ValidationConstraint, ValidationErrors, ValidationFlow};
use crate::DomainError;

/// The ordered validators registered for one request type.
///
/// Built once at startup; validators run in registration order.
pub struct ModelValidatorHub<T> {
    validators: Vec<Arc<dyn ModelValidator<T>>>,
}

impl<T> Default for ModelValidatorHub<T> {
    fn default() -> Self {
        Self {
            validators: Vec::new(),
        }
    }
}

impl<T: Sync> ModelValidatorHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator, builder style.
    pub fn with(mut self, validator: impl ModelValidator<T> + 'static) -> Self {
        self.register(Arc::new(validator));
        self
    }

    /// Appends a validator.
    pub fn register(&mut self, validator: Arc<dyn ModelValidator<T>>) {
        self.validators.push(validator);
    }

    /// Returns the number of registered validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Runs the pipeline over `model`.
    ///
    /// Fails with [`DomainError::ValidationFailed`] carrying every collected
    /// error, or with the first query failure raised by a validator.
    pub async fn validate(&self, model: &T) -> Result<(), DomainError> {
        let mut errors = ValidationErrors::default();

        for validator in &self.validators {
            if validator.constraint() == ValidationConstraint::ValidateIfThereAreNoPreviousErrors
                && !errors.is_empty()
            {
                continue;
            }
            if validator.validate(model, &mut errors).await? == ValidationFlow::Halt {
                break;
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            metrics::counter!("validation_failures_total").increment(1);
            Err(DomainError::ValidationFailed(errors.into_vec()))
        }
    }
}
