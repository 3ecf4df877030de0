//! Output boundary of the use cases.

use async_trait::async_trait;

/// Receives the committed result of a use case.
///
/// Called once, after commit, with the fully populated value.
#[async_trait]
pub trait OutputPort<T: Sync>: Send + Sync {
    async fn handle(&self, value: &T);
}
