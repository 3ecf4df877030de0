use std::sync::Arc;

use sales_store::{CustomerId, CustomerRecord, SalesStore, SalesTransaction};

use super::{CreateCustomerRequest, GetCustomerByIdRequest, UpdateCustomerRequest, messages};
use crate::DomainError;
use crate::logging::DomainLogger;
use crate::output::OutputPort;
use crate::user::UserService;
use crate::validation::{ModelValidatorHub, against_not_valid, against_unauthenticated};

/// Stages `stage` on a fresh transaction, flushes and commits it.
async fn write_customer<S: SalesStore>(
    store: &S,
    stage: impl FnOnce(&mut S::Transaction),
) -> Result<(), DomainError> {
    let mut tx = store.begin().await?;
    stage(&mut tx);

    match tx.flush().await {
        Ok(_) => {
            tx.commit().await?;
            Ok(())
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(e.into())
        }
    }
}

/// Registers new customers.
pub struct CreateCustomerInteractor<S: SalesStore> {
    store: S,
    validators: Arc<ModelValidatorHub<CreateCustomerRequest>>,
    logger: DomainLogger,
}

impl<S: SalesStore> CreateCustomerInteractor<S> {
    pub fn new(
        store: S,
        validators: Arc<ModelValidatorHub<CreateCustomerRequest>>,
        logger: DomainLogger,
    ) -> Self {
        Self {
            store,
            validators,
            logger,
        }
    }

    /// Creates a customer for `user` and returns its code.
    #[tracing::instrument(skip_all, fields(user = %user.user_name(), customer = %request.id))]
    pub async fn handle(
        &self,
        user: &dyn UserService,
        request: CreateCustomerRequest,
        output: &dyn OutputPort<CustomerRecord>,
    ) -> Result<CustomerId, DomainError> {
        against_unauthenticated(user)?;
        against_not_valid(&self.validators, &request).await?;

        let user_name = user.user_name();
        self.logger
            .log_information(messages::STARTING, &user_name)
            .await?;

        let customer = request.to_record();
        let staged = customer.clone();
        if let Err(e) = write_customer(&self.store, |tx| tx.stage_customer(staged)).await {
            tracing::warn!(error = %e, "customer creation cancelled");
            self.logger
                .log_information(messages::cancelled(&customer.id, &e), &user_name)
                .await?;
            return Err(e);
        }

        self.logger
            .log_information(messages::created(&customer.id), &user_name)
            .await?;
        output.handle(&customer).await;

        metrics::counter!("customers_created_total").increment(1);
        Ok(customer.id)
    }
}

/// Changes the name and balance of existing customers.
pub struct UpdateCustomerInteractor<S: SalesStore> {
    store: S,
    validators: Arc<ModelValidatorHub<UpdateCustomerRequest>>,
    logger: DomainLogger,
}

impl<S: SalesStore> UpdateCustomerInteractor<S> {
    pub fn new(
        store: S,
        validators: Arc<ModelValidatorHub<UpdateCustomerRequest>>,
        logger: DomainLogger,
    ) -> Self {
        Self {
            store,
            validators,
            logger,
        }
    }

    #[tracing::instrument(skip_all, fields(user = %user.user_name(), customer = %request.customer_id))]
    pub async fn handle(
        &self,
        user: &dyn UserService,
        request: UpdateCustomerRequest,
        output: &dyn OutputPort<CustomerRecord>,
    ) -> Result<(), DomainError> {
        against_unauthenticated(user)?;
        against_not_valid(&self.validators, &request).await?;

        let user_name = user.user_name();
        self.logger
            .log_information(messages::UPDATE_STARTING, &user_name)
            .await?;

        let customer = request.to_record();
        let staged = customer.clone();
        if let Err(e) = write_customer(&self.store, |tx| tx.stage_customer_update(staged)).await
        {
            tracing::warn!(error = %e, "customer update cancelled");
            self.logger
                .log_information(messages::update_cancelled(&customer.id, &e), &user_name)
                .await?;
            return Err(e);
        }

        self.logger
            .log_information(messages::updated(&customer.id), &user_name)
            .await?;
        output.handle(&customer).await;

        metrics::counter!("customers_updated_total").increment(1);
        Ok(())
    }
}

/// Looks up a customer by code. Reads committed data only.
pub struct GetCustomerByIdInteractor<S: SalesStore> {
    store: S,
    validators: Arc<ModelValidatorHub<GetCustomerByIdRequest>>,
}

impl<S: SalesStore> GetCustomerByIdInteractor<S> {
    pub fn new(store: S, validators: Arc<ModelValidatorHub<GetCustomerByIdRequest>>) -> Self {
        Self { store, validators }
    }

    /// Presents the customer, or `None` when the code is unknown.
    pub async fn handle(
        &self,
        user: &dyn UserService,
        request: GetCustomerByIdRequest,
        output: &dyn OutputPort<Option<CustomerRecord>>,
    ) -> Result<(), DomainError> {
        against_unauthenticated(user)?;
        against_not_valid(&self.validators, &request).await?;

        let customer = self.store.get_customer(&request.id()).await?;
        output.handle(&customer).await;
        Ok(())
    }
}
