//! Validation pipeline and use-case guards.

mod guard;
mod hub;
mod validator;

pub use guard::{against_not_valid, against_unauthenticated};
pub use hub::ModelValidatorHub;
pub use validator::{
    ModelValidator, ValidationConstraint, ValidationError, ValidationErrors, ValidationFlow,
};
