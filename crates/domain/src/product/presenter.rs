use async_trait::async_trait;
use tokio::sync::RwLock;

use sales_store::ProductRecord;

use crate::output::OutputPort;

/// Captures the created product.
#[derive(Default)]
pub struct ProductPresenter {
    product: RwLock<Option<ProductRecord>>,
}

impl ProductPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn product(&self) -> Option<ProductRecord> {
        self.product.read().await.clone()
    }
}

#[async_trait]
impl OutputPort<ProductRecord> for ProductPresenter {
    async fn handle(&self, value: &ProductRecord) {
        *self.product.write().await = Some(value.clone());
    }
}
