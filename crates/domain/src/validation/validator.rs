use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A field-scoped validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub property_name: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property_name, self.message)
    }
}

/// Errors collected across one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn add(&mut self, property_name: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(property_name, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

/// When a validator runs relative to earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationConstraint {
    /// Runs regardless of earlier results.
    #[default]
    AlwaysValidate,
    /// Skipped when an earlier validator already reported errors.
    ValidateIfThereAreNoPreviousErrors,
}

/// What the pipeline does after a validator returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFlow {
    Continue,
    /// Stop running later validators.
    Halt,
}

/// A business-rule checker for one request type.
///
/// Validators append errors and never mutate state. They may run read-only
/// queries, whose failures are returned as errors.
#[async_trait]
pub trait ModelValidator<T>: Send + Sync {
    fn constraint(&self) -> ValidationConstraint {
        ValidationConstraint::AlwaysValidate
    }

    async fn validate(
        &self,
        model: &T,
        errors: &mut ValidationErrors,
    ) -> Result<ValidationFlow, DomainError>;
}
