use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::Span;

use sales_store::{OrderId, ProductId, ProductSnapshot, SalesStore, SalesTransaction, StoreError};

use super::{
    CreateOrderRequest, OrderAggregate, PlacementStage, SpecialOrderCreatedEvent,
    SpecialOrderSpecification, messages,
};
use crate::DomainError;
use crate::events::DomainEventHub;
use crate::logging::DomainLogger;
use crate::output::OutputPort;
use crate::user::UserService;
use crate::validation::{ModelValidatorHub, against_not_valid, against_unauthenticated};

/// Places orders.
///
/// One call runs the whole placement: guard, validation, start log, then a
/// transaction that locks the referenced product rows, checks and decrements
/// stock, and persists the order. After commit the created log is written,
/// the order is handed to the output port and the special-order event is
/// raised when the policy holds.
pub struct CreateOrderInteractor<S: SalesStore> {
    store: S,
    validators: Arc<ModelValidatorHub<CreateOrderRequest>>,
    events: Arc<DomainEventHub<SpecialOrderCreatedEvent>>,
    logger: DomainLogger,
    specification: SpecialOrderSpecification,
}

impl<S: SalesStore> CreateOrderInteractor<S> {
    pub fn new(
        store: S,
        validators: Arc<ModelValidatorHub<CreateOrderRequest>>,
        events: Arc<DomainEventHub<SpecialOrderCreatedEvent>>,
        logger: DomainLogger,
        specification: SpecialOrderSpecification,
    ) -> Self {
        Self {
            store,
            validators,
            events,
            logger,
            specification,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for `user` and returns its id.
    #[tracing::instrument(
        skip_all,
        fields(
            user = %user.user_name(),
            lines = request.lines.len(),
            order_id = tracing::field::Empty,
            stage = tracing::field::Empty,
        )
    )]
    pub async fn handle(
        &self,
        user: &dyn UserService,
        request: CreateOrderRequest,
        output: &dyn OutputPort<OrderAggregate>,
    ) -> Result<OrderId, DomainError> {
        let started = Instant::now();
        record_stage(PlacementStage::Started);

        against_unauthenticated(user)?;
        let user_id = user.user_id().ok_or(DomainError::Unauthenticated)?;
        against_not_valid(&self.validators, &request).await?;

        let user_name = user.user_name();
        self.logger
            .log_information(messages::STARTING, &user_name)
            .await?;

        let mut order = OrderAggregate::from_request(&request, user_id);
        let mut stage = PlacementStage::Validated;
        record_stage(stage);

        let order_id = match self.place(&mut order, &mut stage).await {
            Ok(id) => id,
            Err(e) => {
                record_stage(PlacementStage::RolledBack);
                tracing::warn!(failed_at = %stage, error = %e, "order placement cancelled");
                metrics::counter!("orders_cancelled_total").increment(1);

                self.logger
                    .log_information(messages::cancelled(order.id(), &e), &user_name)
                    .await?;
                return Err(e);
            }
        };
        record_stage(PlacementStage::Committed);
        Span::current().record("order_id", order_id.as_i64());

        self.logger
            .log_information(messages::created(order_id), &user_name)
            .await?;

        output.handle(&order).await;

        if self.specification.is_satisfied_by(&order) {
            let outcome = self
                .events
                .raise(SpecialOrderCreatedEvent::new(order_id, order.line_count()))
                .await;
            metrics::counter!("special_orders_raised_total").increment(1);
            tracing::info!(
                handled = outcome.handled,
                failed = outcome.failed,
                "special order event raised"
            );
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order_id, total = %order.total(), "order placed");

        Ok(order_id)
    }

    /// Runs the transactional region and returns the committed order id.
    /// On any failure the transaction is rolled back before the error is
    /// returned.
    async fn place(
        &self,
        order: &mut OrderAggregate,
        stage: &mut PlacementStage,
    ) -> Result<OrderId, DomainError> {
        let mut tx = self.store.begin().await?;

        match Self::stage_and_flush(&mut tx, order, stage).await {
            Ok(order_id) => {
                tx.commit().await?;
                Ok(order_id)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn stage_and_flush(
        tx: &mut S::Transaction,
        order: &mut OrderAggregate,
        stage: &mut PlacementStage,
    ) -> Result<OrderId, DomainError> {
        let locked = tx.lock_products_for_update(&order.product_ids()).await?;
        advance(stage, PlacementStage::Locked);

        let mut stock: HashMap<ProductId, ProductSnapshot> =
            locked.into_iter().map(|p| (p.id, p)).collect();

        for line in order.lines() {
            let product = stock
                .get_mut(&line.product_id)
                .ok_or(DomainError::ProductNotFound(line.product_id))?;

            let available = i64::from(product.units_in_stock);
            let requested = i64::from(line.quantity);
            if available < requested {
                return Err(DomainError::InsufficientStock {
                    product_id: line.product_id,
                    available: product.units_in_stock,
                    requested: line.quantity,
                });
            }

            // Fits: 0 <= available - requested <= available.
            product.units_in_stock = (available - requested) as i32;
            tx.stage_stock_update(product.id, product.units_in_stock);
        }
        advance(stage, PlacementStage::StockChecked);

        tx.stage_order(order.to_new_order());
        let flushed = tx.flush().await?;
        let order_id = flushed
            .order_ids
            .first()
            .copied()
            .ok_or_else(|| StoreError::Unavailable("flush assigned no order id".into()))?;
        order.assign_id(order_id);
        advance(stage, PlacementStage::Persisted);

        Ok(order_id)
    }
}

fn advance(stage: &mut PlacementStage, next: PlacementStage) {
    *stage = next;
    record_stage(next);
}

fn record_stage(stage: PlacementStage) {
    Span::current().record("stage", stage.as_str());
}
