//! Wiring of stores, validators, event handlers and interactors.

use std::sync::Arc;

use domain::{
    CreateCustomerBusinessValidator, CreateCustomerInteractor, CreateCustomerRequestValidator,
    GetCustomerByIdInteractor, GetCustomerByIdRequestValidator, UpdateCustomerBusinessValidator,
    UpdateCustomerInteractor, UpdateCustomerRequestValidator, CreateOrderInteractor, CreateOrderLineValidator, CreateOrderRequestValidator,
    CreateProductBusinessValidator, CreateProductInteractor, CreateProductRequestValidator,
    DomainEventHub, DomainLogger, Mailer, ModelValidatorHub, SendEmailWhenSpecialOrderCreated,
    TracingMailer,
};
use sales_store::{
    DomainLogStore, InMemoryDomainLogStore, InMemorySalesStore, PostgresDomainLogStore,
    PostgresSalesStore, SalesStore,
};
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::error::SetupError;

/// The use cases of the backend, ready to be called.
pub struct SalesServices<S: SalesStore> {
    pub create_order: CreateOrderInteractor<S>,
    pub create_product: CreateProductInteractor<S>,
    pub create_customer: CreateCustomerInteractor<S>,
    pub update_customer: UpdateCustomerInteractor<S>,
    pub get_customer_by_id: GetCustomerByIdInteractor<S>,
    store: S,
}

impl<S> SalesServices<S>
where
    S: SalesStore + Clone + 'static,
{
    /// Wires every use case on top of `store`.
    pub fn build(
        config: &Config,
        store: S,
        log_store: Arc<dyn DomainLogStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let order_validators = ModelValidatorHub::new()
            .with(CreateOrderRequestValidator)
            .with(CreateOrderLineValidator);
        let product_validators = ModelValidatorHub::new()
            .with(CreateProductRequestValidator)
            .with(CreateProductBusinessValidator::new(store.clone()));
        let create_customer_validators = ModelValidatorHub::new()
            .with(CreateCustomerRequestValidator)
            .with(CreateCustomerBusinessValidator::new(store.clone()));
        let update_customer_validators = ModelValidatorHub::new()
            .with(UpdateCustomerRequestValidator)
            .with(UpdateCustomerBusinessValidator::new(store.clone()));
        let events = DomainEventHub::new().with(SendEmailWhenSpecialOrderCreated::new(
            mailer,
            config.special_order_recipient.clone(),
        ));
        let logger = DomainLogger::new(log_store);

        tracing::debug!(
            order_validators = order_validators.len(),
            product_validators = product_validators.len(),
            customer_validators =
                create_customer_validators.len() + update_customer_validators.len(),
            event_handlers = events.handler_count(),
            "sales services wired"
        );

        Self {
            create_order: CreateOrderInteractor::new(
                store.clone(),
                Arc::new(order_validators),
                Arc::new(events),
                logger.clone(),
                config.special_order_specification(),
            ),
            create_product: CreateProductInteractor::new(
                store.clone(),
                Arc::new(product_validators),
                logger.clone(),
            ),
            create_customer: CreateCustomerInteractor::new(
                store.clone(),
                Arc::new(create_customer_validators),
                logger.clone(),
            ),
            update_customer: UpdateCustomerInteractor::new(
                store.clone(),
                Arc::new(update_customer_validators),
                logger,
            ),
            get_customer_by_id: GetCustomerByIdInteractor::new(
                store.clone(),
                Arc::new(ModelValidatorHub::new().with(GetCustomerByIdRequestValidator)),
            ),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl SalesServices<PostgresSalesStore> {
    /// Connects to Postgres, applies migrations and wires the services.
    pub async fn connect(config: &Config) -> Result<Self, SetupError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        let store = PostgresSalesStore::new(pool.clone()).with_lock_timeout(config.lock_timeout());
        store.run_migrations().await?;
        tracing::info!(
            max_connections = config.database_max_connections,
            lock_timeout_ms = config.lock_timeout_ms,
            "connected to database"
        );

        Ok(Self::build(
            config,
            store,
            Arc::new(PostgresDomainLogStore::new(pool)),
            Arc::new(TracingMailer),
        ))
    }
}

impl SalesServices<InMemorySalesStore> {
    /// Services backed entirely by memory. Mail goes to the tracing log.
    pub fn in_memory(config: &Config, store: InMemorySalesStore) -> Self {
        let store = store.with_lock_timeout(config.lock_timeout());
        Self::build(
            config,
            store,
            Arc::new(InMemoryDomainLogStore::new()),
            Arc::new(TracingMailer),
        )
    }
}
