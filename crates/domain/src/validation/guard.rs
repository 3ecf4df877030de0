use super::ModelValidatorHub;
use crate::{DomainError, user::UserService};

/// Rejects callers without an authenticated identity.
pub fn against_unauthenticated(user: &dyn UserService) -> Result<(), DomainError> {
    if user.is_authenticated() {
        Ok(())
    } else {
        tracing::warn!("rejected unauthenticated caller");
        Err(DomainError::Unauthenticated)
    }
}

/// Runs the validation pipeline for `model`.
pub async fn against_not_valid<T: Sync>(
    hub: &ModelValidatorHub<T>,
    model: &T,
) -> Result<(), DomainError> {
    hub.validate(model).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{AnonymousUser, AuthenticatedUser};

    #[test]
    fn anonymous_caller_is_rejected() {
        assert!(matches!(
            against_unauthenticated(&AnonymousUser),
            Err(DomainError::Unauthenticated)
        ));
        assert!(against_unauthenticated(&AuthenticatedUser::new("u-1", "alice")).is_ok());
    }
}
