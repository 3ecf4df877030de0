use std::sync::Arc;

use sales_store::{ProductId, ProductRecord, SalesStore, SalesTransaction, StoreError};

use super::{CreateProductRequest, messages};
use crate::DomainError;
use crate::logging::DomainLogger;
use crate::output::OutputPort;
use crate::user::UserService;
use crate::validation::{ModelValidatorHub, against_not_valid, against_unauthenticated};

/// Adds products to the catalog.
pub struct CreateProductInteractor<S: SalesStore> {
    store: S,
    validators: Arc<ModelValidatorHub<CreateProductRequest>>,
    logger: DomainLogger,
}

impl<S: SalesStore> CreateProductInteractor<S> {
    pub fn new(
        store: S,
        validators: Arc<ModelValidatorHub<CreateProductRequest>>,
        logger: DomainLogger,
    ) -> Self {
        Self {
            store,
            validators,
            logger,
        }
    }

    /// Creates a product for `user` and returns its id.
    #[tracing::instrument(skip_all, fields(user = %user.user_name(), name = %request.name))]
    pub async fn handle(
        &self,
        user: &dyn UserService,
        request: CreateProductRequest,
        output: &dyn OutputPort<ProductRecord>,
    ) -> Result<ProductId, DomainError> {
        against_unauthenticated(user)?;
        against_not_valid(&self.validators, &request).await?;

        let user_name = user.user_name();
        self.logger
            .log_information(messages::STARTING, &user_name)
            .await?;

        let product = request.to_new_product();
        let product_id = match self.insert(&request).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "product creation cancelled");
                self.logger
                    .log_information(messages::cancelled(&product.name, &e), &user_name)
                    .await?;
                return Err(e);
            }
        };

        self.logger
            .log_information(messages::created(product_id, &product.name), &user_name)
            .await?;

        output
            .handle(&ProductRecord {
                id: product_id,
                name: product.name,
                unit_price: product.unit_price,
                units_in_stock: product.units_in_stock,
            })
            .await;

        metrics::counter!("products_created_total").increment(1);
        Ok(product_id)
    }

    async fn insert(&self, request: &CreateProductRequest) -> Result<ProductId, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.stage_product(request.to_new_product());

        let product_id = tx.flush().await.and_then(|flushed| {
            flushed.product_ids.first().copied().ok_or_else(|| {
                StoreError::Unavailable("flush assigned no product id".to_string())
            })
        });

        match product_id {
            Ok(id) => {
                tx.commit().await?;
                Ok(id)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e.into())
            }
        }
    }
}
