//! The acting user, as supplied by the external authenticator.

use sales_store::UserId;

/// Identity of the caller of a use case.
///
/// Implementations adapt whatever the transport authenticated; use cases
/// only ask these three questions.
pub trait UserService: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// The id that owns created orders. `None` when unauthenticated.
    fn user_id(&self) -> Option<UserId>;

    /// The name recorded in the domain log.
    fn user_name(&self) -> String;
}

/// A caller the authenticator has vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    id: UserId,
    name: String,
}

impl AuthenticatedUser {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl UserService for AuthenticatedUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn user_id(&self) -> Option<UserId> {
        Some(self.id.clone())
    }

    fn user_name(&self) -> String {
        self.name.clone()
    }
}

/// A caller with no identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl UserService for AnonymousUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn user_id(&self) -> Option<UserId> {
        None
    }

    fn user_name(&self) -> String {
        "anonymous".to_string()
    }
}
