use async_trait::async_trait;
use tokio::sync::RwLock;

use sales_store::CustomerRecord;

use crate::output::OutputPort;

/// Captures the customer a use case produced or looked up.
#[derive(Default)]
pub struct CustomerPresenter {
    customer: RwLock<Option<CustomerRecord>>,
}

impl CustomerPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn customer(&self) -> Option<CustomerRecord> {
        self.customer.read().await.clone()
    }
}

#[async_trait]
impl OutputPort<CustomerRecord> for CustomerPresenter {
    async fn handle(&self, value: &CustomerRecord) {
        *self.customer.write().await = Some(value.clone());
    }
}

// A lookup miss clears whatever an earlier call left behind.
#[async_trait]
impl OutputPort<Option<CustomerRecord>> for CustomerPresenter {
    async fn handle(&self, value: &Option<CustomerRecord>) {
        *self.customer.write().await = value.clone();
    }
}
