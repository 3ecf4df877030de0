//! The domain audit trail.

use std::sync::Arc;

use sales_store::{DomainLog, DomainLogStore};

use crate::DomainError;

/// Records use-case milestones against the acting user.
///
/// Entries are persisted through a [`DomainLogStore`] and mirrored to
/// tracing. An append failure is returned to the caller.
#[derive(Clone)]
pub struct DomainLogger {
    store: Arc<dyn DomainLogStore>,
}

impl DomainLogger {
    pub fn new(store: Arc<dyn DomainLogStore>) -> Self {
        Self { store }
    }

    pub async fn log_information(
        &self,
        information: impl Into<String>,
        user_name: &str,
    ) -> Result<(), DomainError> {
        let entry = DomainLog::new(information, user_name);
        tracing::info!(user = user_name, log_id = %entry.id, "{}", entry.information);

        self.store.append(&entry).await.map_err(|e| {
            tracing::error!(error = %e, "failed to append domain log");
            DomainError::from(e)
        })
    }
}
