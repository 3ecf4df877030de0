//! End-to-end tests for the order placement, product creation and customer
//! maintenance use cases.
//!
//! Everything runs against the in-memory store, which has the same locking
//! and visibility rules as Postgres.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{
    AnonymousUser, AuthenticatedUser, CreateCustomerBusinessValidator, CreateCustomerInteractor,
    CreateCustomerRequest, CreateCustomerRequestValidator, CustomerPresenter,
    GetCustomerByIdInteractor, GetCustomerByIdRequest, GetCustomerByIdRequestValidator,
    UpdateCustomerBusinessValidator, UpdateCustomerInteractor, UpdateCustomerRequest,
    UpdateCustomerRequestValidator, CreateOrderInteractor, CreateOrderLineValidator,
    CreateOrderRequest, CreateOrderRequestValidator, CreateProductBusinessValidator,
    CreateProductInteractor, CreateProductRequest, CreateProductRequestValidator, DomainError,
    DomainEventHandler, DomainEventHub, DomainLogger, HandlerError, InMemoryMailer,
    ModelValidatorHub, OrderPresenter, ProductPresenter, SendEmailWhenSpecialOrderCreated,
    SpecialOrderCreatedEvent, SpecialOrderSpecification, customer, order, product,
};
use sales_store::{
    CustomerId, CustomerRecord, InMemoryDomainLogStore, InMemorySalesStore, Money, NewProduct, OrderId, ProductId,
    SalesStore, SalesTransaction, StoreError,
};
use tokio::sync::Mutex;

#[ctor::ctor]
unsafe fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Products 1..=5 of the sample catalog.
fn catalog() -> InMemorySalesStore {
    InMemorySalesStore::with_products([
        new_product("Chai", 3500, 20),
        new_product("Chang", 5500, 0),
        new_product("Aniseed Syrup", 1000, 13),
        new_product("Chef Anton's Cajun Seasoning", 2200, 53),
        new_product("Chef Anton's Gumbo Mix", 2135, 50),
    ])
}

fn new_product(name: &str, cents: i64, stock: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        unit_price: Money::from_cents(cents),
        units_in_stock: stock,
    }
}

fn alice() -> AuthenticatedUser {
    AuthenticatedUser::new("u-alice", "alice")
}

fn request() -> CreateOrderRequest {
    CreateOrderRequest::new("Obere Str. 57", "Berlin", "Germany", "12209")
}

/// Records whether each special-order event found its order committed.
struct CommitWatcher {
    store: InMemorySalesStore,
    seen: Arc<Mutex<Vec<(OrderId, bool)>>>,
}

#[async_trait]
impl DomainEventHandler<SpecialOrderCreatedEvent> for CommitWatcher {
    fn name(&self) -> &'static str {
        "CommitWatcher"
    }

    async fn handle(&self, event: &SpecialOrderCreatedEvent) -> Result<(), HandlerError> {
        let committed = self
            .store
            .get_order(event.order_id)
            .await
            .map_err(|e| HandlerError::Other(e.to_string()))?
            .is_some();
        self.seen.lock().await.push((event.order_id, committed));
        Ok(())
    }
}

struct Harness {
    store: InMemorySalesStore,
    logs: InMemoryDomainLogStore,
    mailer: InMemoryMailer,
    seen_events: Arc<Mutex<Vec<(OrderId, bool)>>>,
    orders: CreateOrderInteractor<InMemorySalesStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(catalog())
    }

    fn with_store(store: InMemorySalesStore) -> Self {
        let logs = InMemoryDomainLogStore::new();
        let mailer = InMemoryMailer::new();
        let seen_events = Arc::new(Mutex::new(Vec::new()));

        let validators = ModelValidatorHub::new()
            .with(CreateOrderRequestValidator)
            .with(CreateOrderLineValidator);
        let events = DomainEventHub::new()
            .with(SendEmailWhenSpecialOrderCreated::new(
                Arc::new(mailer.clone()),
                "sales@northwind.test",
            ))
            .with(CommitWatcher {
                store: store.clone(),
                seen: Arc::clone(&seen_events),
            });

        let orders = CreateOrderInteractor::new(
            store.clone(),
            Arc::new(validators),
            Arc::new(events),
            DomainLogger::new(Arc::new(logs.clone())),
            SpecialOrderSpecification::default(),
        );

        Self {
            store,
            logs,
            mailer,
            seen_events,
            orders,
        }
    }

    async fn place(&self, request: CreateOrderRequest) -> Result<OrderId, DomainError> {
        self.orders
            .handle(&alice(), request, &OrderPresenter::new())
            .await
    }

    async fn stock(&self, id: i32) -> i32 {
        self.store
            .get_product(ProductId::new(id))
            .await
            .unwrap()
            .unwrap()
            .units_in_stock
    }
}

mod order_placement {
    use super::*;

    #[tokio::test]
    async fn order_commits_and_decrements_stock() {
        let h = Harness::new();
        let presenter = OrderPresenter::new();

        let order_id = h
            .orders
            .handle(
                &alice(),
                request().with_line(1, Money::from_dollars(35), 5),
                &presenter,
            )
            .await
            .unwrap();

        assert_eq!(h.stock(1).await, 15);

        let stored = h.store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.user_id.as_str(), "u-alice");
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].subtotal(), Money::from_dollars(175));

        let view = presenter.view().await.unwrap();
        assert_eq!(view.id, Some(order_id));
        assert_eq!(view.total, Money::from_dollars(175));
        assert_eq!(view.lines[0].subtotal.to_string(), "$175.00");

        assert_eq!(
            h.logs.messages().await,
            vec![
                order::messages::STARTING.to_string(),
                order::messages::created(order_id),
            ]
        );
    }

    #[tokio::test]
    async fn each_placement_returns_its_own_committed_order() {
        let h = Harness::new();
        let presenter = OrderPresenter::new();

        let first = h
            .place(request().with_line(3, Money::from_dollars(10), 1))
            .await
            .unwrap();
        let second = h
            .orders
            .handle(
                &alice(),
                request().with_line(4, Money::from_dollars(22), 2),
                &presenter,
            )
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(presenter.view().await.unwrap().id, Some(second));
        let stored = h.store.get_order(second).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].product_id, ProductId::new(4));
    }

    #[tokio::test]
    async fn duplicate_lines_persist_as_one() {
        let h = Harness::new();

        let order_id = h
            .place(
                request()
                    .with_line(3, Money::from_dollars(10), 2)
                    .with_line(3, Money::from_dollars(10), 4),
            )
            .await
            .unwrap();

        let stored = h.store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].quantity, 6);
        assert_eq!(h.stock(3).await, 7);
    }

    #[tokio::test]
    async fn merged_line_is_charged_at_latest_price() {
        // Merging keeps the price of the last submitted line, not a blend.
        let h = Harness::new();

        let order_id = h
            .place(
                request()
                    .with_line(4, Money::from_dollars(22), 1)
                    .with_line(4, Money::from_dollars(20), 1),
            )
            .await
            .unwrap();

        let stored = h.store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].unit_price, Money::from_dollars(20));
        assert_eq!(stored.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn out_of_stock_product_fails_the_whole_order() {
        let h = Harness::new();

        let err = h
            .place(
                request()
                    .with_line(1, Money::from_dollars(35), 1)
                    .with_line(2, Money::from_dollars(55), 1),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock { product_id, available: 0, requested: 1 }
                if product_id == ProductId::new(2)
        ));
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.stock(1).await, 20);
        assert_eq!(h.stock(2).await, 0);

        let messages = h.logs.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], order::messages::cancelled(None, &err));
        assert!(messages[1].contains("unassigned"));
    }

    #[tokio::test]
    async fn unknown_product_is_reported_and_nothing_changes() {
        let h = Harness::new();

        let err = h
            .place(
                request()
                    .with_line(1, Money::from_dollars(35), 2)
                    .with_line(999, Money::from_dollars(5), 1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductNotFound(id) if id == ProductId::new(999)));
        assert_eq!(h.stock(1).await, 20);
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn large_order_raises_special_order_event_after_commit() {
        let h = Harness::new();

        let order_id = h
            .place(
                request()
                    .with_line(1, Money::from_dollars(35), 1)
                    .with_line(3, Money::from_dollars(10), 1)
                    .with_line(4, Money::from_dollars(22), 1)
                    .with_line(5, Money::from_cents(2135), 1),
            )
            .await
            .unwrap();

        assert_eq!(*h.seen_events.lock().await, vec![(order_id, true)]);
        let sent = h.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            format!("Order {order_id} was placed with 4 lines.")
        );
    }

    #[tokio::test]
    async fn ordinary_order_raises_nothing() {
        let h = Harness::new();

        h.place(request().with_line(1, Money::from_dollars(35), 1))
            .await
            .unwrap();

        assert!(h.seen_events.lock().await.is_empty());
        assert!(h.mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn failing_handler_does_not_affect_the_order() {
        let h = Harness::new();
        h.mailer.set_fail_on_send(true);

        let order_id = h
            .place(
                request()
                    .with_line(1, Money::from_dollars(35), 1)
                    .with_line(3, Money::from_dollars(10), 1)
                    .with_line(4, Money::from_dollars(22), 1)
                    .with_line(5, Money::from_cents(2135), 1),
            )
            .await
            .unwrap();

        assert!(h.store.get_order(order_id).await.unwrap().is_some());
        // The watcher registered after the mailer still ran.
        assert_eq!(h.seen_events.lock().await.len(), 1);
    }
}

mod rejections {
    use super::*;

    #[tokio::test]
    async fn unauthenticated_caller_is_rejected_before_anything_runs() {
        let h = Harness::new();

        let err = h
            .orders
            .handle(
                &AnonymousUser,
                request().with_line(1, Money::from_dollars(35), 1),
                &OrderPresenter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Unauthenticated));
        assert!(h.logs.entries().await.is_empty());
        assert_eq!(h.stock(1).await, 20);
    }

    #[tokio::test]
    async fn independent_rule_violations_are_reported_together() {
        let h = Harness::new();
        let mut invalid = request().with_line(1, Money::from_dollars(35), 0);
        invalid.ship_country = String::new();

        let err = h.place(invalid).await.unwrap_err();

        let fields: Vec<_> = err
            .validation_errors()
            .unwrap()
            .iter()
            .map(|e| e.property_name.as_str())
            .collect();
        assert_eq!(fields, vec!["ShipCountry", "OrderDetails[0].Quantity"]);
        assert!(h.logs.entries().await.is_empty());
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn start_log_failure_aborts_before_the_transaction() {
        let h = Harness::new();
        h.logs.set_fail_on_append(true);

        let err = h
            .place(request().with_line(1, Money::from_dollars(35), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PersistenceFailure(_)));
        assert_eq!(h.stock(1).await, 20);
        assert_eq!(h.store.order_count().await, 0);
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn flush_failure_rolls_back() {
        let h = Harness::new();
        h.store.set_fail_on_flush(true);

        let err = h
            .place(request().with_line(1, Money::from_dollars(35), 5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::PersistenceFailure(StoreError::Unavailable(_))
        ));
        assert_eq!(h.stock(1).await, 20);
        assert_eq!(h.store.order_count().await, 0);
        let messages = h.logs.messages().await;
        assert!(messages[1].starts_with("Purchase order unassigned creation cancelled"));
    }

    #[tokio::test]
    async fn commit_failure_raises_no_event() {
        let h = Harness::new();
        h.store.set_fail_on_commit(true);

        let err = h
            .place(
                request()
                    .with_line(1, Money::from_dollars(35), 1)
                    .with_line(3, Money::from_dollars(10), 1)
                    .with_line(4, Money::from_dollars(22), 1)
                    .with_line(5, Money::from_cents(2135), 1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PersistenceFailure(_)));
        assert!(h.seen_events.lock().await.is_empty());
        assert!(h.mailer.sent().await.is_empty());
        assert_eq!(h.store.order_count().await, 0);
        assert_eq!(h.stock(1).await, 20);

        // The flush had already assigned the working id.
        let messages = h.logs.messages().await;
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with("Purchase order 1 creation cancelled"));
    }

    #[tokio::test]
    async fn lock_timeout_is_a_persistence_failure() {
        let store = catalog().with_lock_timeout(Duration::from_millis(50));
        let h = Harness::with_store(store.clone());

        let mut holder = store.begin().await.unwrap();
        holder
            .lock_products_for_update(&[ProductId::new(1)])
            .await
            .unwrap();

        let err = h
            .place(request().with_line(1, Money::from_dollars(35), 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::PersistenceFailure(StoreError::LockTimeout { .. })
        ));
        holder.rollback().await.unwrap();
        assert_eq!(h.stock(1).await, 20);
    }
}

mod concurrency {
    use futures_util::future::join_all;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn competing_orders_for_the_last_units_never_oversell() {
        let h = Arc::new(Harness::new());

        let tasks = (0..2).map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                h.place(request().with_line(1, Money::from_dollars(35), 15))
                    .await
            })
        });
        let results: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let committed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DomainError::InsufficientStock { available: 5, requested: 15, .. })
        )));
        assert_eq!(h.stock(1).await, 5);
        assert_eq!(h.store.order_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_small_orders_drain_stock_exactly() {
        let h = Arc::new(Harness::new());

        let tasks = (0..10).map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                h.place(request().with_line(1, Money::from_dollars(35), 3))
                    .await
            })
        });
        let committed = join_all(tasks)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(_))))
            .count();

        assert_eq!(committed, 6);
        assert_eq!(h.stock(1).await, 2);
        assert_eq!(h.store.order_count().await, 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_products_in_opposite_order_do_not_deadlock() {
        let h = Arc::new(Harness::new());

        let tasks = (0..20).map(|i| {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                let request = if i % 2 == 0 {
                    request()
                        .with_line(4, Money::from_dollars(22), 1)
                        .with_line(5, Money::from_cents(2135), 1)
                } else {
                    request()
                        .with_line(5, Money::from_cents(2135), 1)
                        .with_line(4, Money::from_dollars(22), 1)
                };
                h.place(request).await
            })
        });

        let results = tokio::time::timeout(Duration::from_secs(5), join_all(tasks))
            .await
            .expect("placements deadlocked");

        assert!(results.iter().all(|joined| matches!(joined, Ok(Ok(_)))));
        assert_eq!(h.stock(4).await, 33);
        assert_eq!(h.stock(5).await, 30);
    }
}

mod product_creation {
    use sales_store::ProductRecord;

    use super::*;

    fn interactor(
        store: &InMemorySalesStore,
        logs: &InMemoryDomainLogStore,
    ) -> CreateProductInteractor<InMemorySalesStore> {
        let validators = ModelValidatorHub::new()
            .with(CreateProductRequestValidator)
            .with(CreateProductBusinessValidator::new(store.clone()));
        CreateProductInteractor::new(
            store.clone(),
            Arc::new(validators),
            DomainLogger::new(Arc::new(logs.clone())),
        )
    }

    #[tokio::test]
    async fn product_is_created_with_assigned_id() {
        let store = catalog();
        let logs = InMemoryDomainLogStore::new();
        let presenter = ProductPresenter::new();

        let id = interactor(&store, &logs)
            .handle(
                &alice(),
                CreateProductRequest::new("Ikura", Money::from_dollars(31), 31),
                &presenter,
            )
            .await
            .unwrap();

        assert_eq!(id, ProductId::new(6));
        assert_eq!(
            presenter.product().await,
            Some(ProductRecord {
                id,
                name: "Ikura".to_string(),
                unit_price: Money::from_dollars(31),
                units_in_stock: 31,
            })
        );
        assert_eq!(
            logs.messages().await,
            vec![
                product::messages::STARTING.to_string(),
                product::messages::created(id, "Ikura"),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_name_is_a_validation_failure() {
        let store = catalog();
        let logs = InMemoryDomainLogStore::new();

        let err = interactor(&store, &logs)
            .handle(
                &alice(),
                CreateProductRequest::new("CHANG", Money::from_dollars(19), 17),
                &ProductPresenter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ValidationFailed(ref errors) if errors.len() == 1));
        assert!(logs.entries().await.is_empty());
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_create_products() {
        let store = catalog();
        let logs = InMemoryDomainLogStore::new();

        let err = interactor(&store, &logs)
            .handle(
                &AnonymousUser,
                CreateProductRequest::new("Ikura", Money::from_dollars(31), 31),
                &ProductPresenter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn concurrent_creations_with_one_name_keep_a_single_product() {
        let store = catalog();
        let logs = InMemoryDomainLogStore::new();
        let creator = interactor(&store, &logs);
        let (first_presenter, second_presenter) = (ProductPresenter::new(), ProductPresenter::new());

        let (first, second) = futures_util::future::join(
            creator.handle(
                &alice(),
                CreateProductRequest::new("Ikura", Money::from_dollars(31), 31),
                &first_presenter,
            ),
            creator.handle(
                &alice(),
                CreateProductRequest::new("ikura", Money::from_dollars(30), 10),
                &second_presenter,
            ),
        )
        .await;

        let (created, rejected) = match (first, second) {
            (Ok(id), Err(e)) | (Err(e), Ok(id)) => (id, e),
            other => panic!("expected exactly one creation, got {other:?}"),
        };
        assert!(matches!(
            rejected,
            DomainError::ValidationFailed(_)
                | DomainError::PersistenceFailure(StoreError::ConstraintViolation { .. })
        ));
        assert!(store.get_product(created).await.unwrap().is_some());
        let mut committed = 0;
        for id in [6, 7] {
            if store.get_product(ProductId::new(id)).await.unwrap().is_some() {
                committed += 1;
            }
        }
        assert_eq!(committed, 1);
    }

    #[tokio::test]
    async fn flush_failure_logs_cancellation() {
        let store = catalog();
        store.set_fail_on_flush(true);
        let logs = InMemoryDomainLogStore::new();

        let err = interactor(&store, &logs)
            .handle(
                &alice(),
                CreateProductRequest::new("Ikura", Money::from_dollars(31), 31),
                &ProductPresenter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PersistenceFailure(_)));
        assert!(!store.product_name_exists("Ikura").await.unwrap());
        let messages = logs.messages().await;
        assert_eq!(messages[1], product::messages::cancelled("Ikura", &err));
    }
}

mod customer_management {
    use super::*;

    struct Customers {
        store: InMemorySalesStore,
        logs: InMemoryDomainLogStore,
        create: CreateCustomerInteractor<InMemorySalesStore>,
        update: UpdateCustomerInteractor<InMemorySalesStore>,
        get: GetCustomerByIdInteractor<InMemorySalesStore>,
    }

    async fn customers() -> Customers {
        let store = InMemorySalesStore::new();
        for (id, name, cents) in [
            ("ALFKI", "Alfreds Futterkiste", 0),
            ("ANATR", "Ana Trujillo Emparedados y helados", 0),
            ("ANTON", "Antonio Moreno Taquería", 10_000),
        ] {
            store
                .seed_customer(CustomerRecord {
                    id: CustomerId::new(id),
                    name: name.to_string(),
                    current_balance: Money::from_cents(cents),
                })
                .await;
        }
        let logs = InMemoryDomainLogStore::new();
        let logger = DomainLogger::new(Arc::new(logs.clone()));

        let create = CreateCustomerInteractor::new(
            store.clone(),
            Arc::new(
                ModelValidatorHub::new()
                    .with(CreateCustomerRequestValidator)
                    .with(CreateCustomerBusinessValidator::new(store.clone())),
            ),
            logger.clone(),
        );
        let update = UpdateCustomerInteractor::new(
            store.clone(),
            Arc::new(
                ModelValidatorHub::new()
                    .with(UpdateCustomerRequestValidator)
                    .with(UpdateCustomerBusinessValidator::new(store.clone())),
            ),
            logger,
        );
        let get = GetCustomerByIdInteractor::new(
            store.clone(),
            Arc::new(ModelValidatorHub::new().with(GetCustomerByIdRequestValidator)),
        );

        Customers {
            store,
            logs,
            create,
            update,
            get,
        }
    }

    #[tokio::test]
    async fn customer_is_created_and_logged() {
        let c = customers().await;
        let presenter = CustomerPresenter::new();

        let id = c
            .create
            .handle(
                &alice(),
                CreateCustomerRequest::new("BERGS", " Berglunds snabbköp ", Money::from_dollars(12)),
                &presenter,
            )
            .await
            .unwrap();

        assert_eq!(id, CustomerId::new("BERGS"));
        let expected = CustomerRecord {
            id: id.clone(),
            name: "Berglunds snabbköp".to_string(),
            current_balance: Money::from_dollars(12),
        };
        assert_eq!(presenter.customer().await, Some(expected.clone()));
        assert_eq!(c.store.get_customer(&id).await.unwrap(), Some(expected));
        assert_eq!(
            c.logs.messages().await,
            vec![
                customer::messages::STARTING.to_string(),
                customer::messages::created(&id),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_customers_are_rejected_before_logging() {
        let c = customers().await;

        for request in [
            CreateCustomerRequest::new("BERGS", "alfreds futterkiste", Money::zero()),
            CreateCustomerRequest::new("BERG", "Berglunds", Money::zero()),
            CreateCustomerRequest::new("BERGS", "Berglunds", Money::from_cents(-100)),
        ] {
            let err = c
                .create
                .handle(&alice(), request, &CustomerPresenter::new())
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::ValidationFailed(ref errors) if errors.len() == 1));
        }

        assert!(c.logs.entries().await.is_empty());
        assert!(c.store.get_customer(&CustomerId::new("BERGS")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_touch_customers() {
        let c = customers().await;

        let created = c
            .create
            .handle(
                &AnonymousUser,
                CreateCustomerRequest::new("BERGS", "Berglunds", Money::zero()),
                &CustomerPresenter::new(),
            )
            .await;
        let looked_up = c
            .get
            .handle(
                &AnonymousUser,
                GetCustomerByIdRequest::new("ALFKI"),
                &CustomerPresenter::new(),
            )
            .await;

        assert!(matches!(created, Err(DomainError::Unauthenticated)));
        assert!(matches!(looked_up, Err(DomainError::Unauthenticated)));
    }

    #[tokio::test]
    async fn customer_is_updated_and_presented() {
        let c = customers().await;
        let presenter = CustomerPresenter::new();

        c.update
            .handle(
                &alice(),
                UpdateCustomerRequest::new("ANTON", "Antonio Moreno", Money::from_dollars(250)),
                &presenter,
            )
            .await
            .unwrap();

        let id = CustomerId::new("ANTON");
        let stored = c.store.get_customer(&id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Antonio Moreno");
        assert_eq!(stored.current_balance, Money::from_dollars(250));
        assert_eq!(presenter.customer().await, Some(stored));
        assert_eq!(
            c.logs.messages().await,
            vec![
                customer::messages::UPDATE_STARTING.to_string(),
                customer::messages::updated(&id),
            ]
        );
    }

    #[tokio::test]
    async fn updating_unknown_customer_is_a_validation_failure() {
        let c = customers().await;

        let err = c
            .update
            .handle(
                &alice(),
                UpdateCustomerRequest::new("NOONE", "Nobody", Money::zero()),
                &CustomerPresenter::new(),
            )
            .await
            .unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors[0].property_name, "CustomerId");
        assert!(c.logs.entries().await.is_empty());
    }

    #[tokio::test]
    async fn update_flush_failure_logs_cancellation() {
        let c = customers().await;
        c.store.set_fail_on_flush(true);

        let err = c
            .update
            .handle(
                &alice(),
                UpdateCustomerRequest::new("ALFKI", "Alfreds", Money::from_dollars(1)),
                &CustomerPresenter::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PersistenceFailure(_)));
        let stored = c.store.get_customer(&CustomerId::new("ALFKI")).await.unwrap().unwrap();
        assert_eq!(stored.name, "Alfreds Futterkiste");
        let messages = c.logs.messages().await;
        assert_eq!(
            messages[1],
            customer::messages::update_cancelled(&CustomerId::new("ALFKI"), &err)
        );
    }

    #[tokio::test]
    async fn lookup_presents_the_customer_or_nothing() {
        let c = customers().await;
        let presenter = CustomerPresenter::new();

        c.get
            .handle(&alice(), GetCustomerByIdRequest::new("ANATR"), &presenter)
            .await
            .unwrap();
        let found = presenter.customer().await.unwrap();
        assert_eq!(found.name, "Ana Trujillo Emparedados y helados");

        c.get
            .handle(&alice(), GetCustomerByIdRequest::new("ZZZZZ"), &presenter)
            .await
            .unwrap();
        assert!(presenter.customer().await.is_none());

        let err = c
            .get
            .handle(&alice(), GetCustomerByIdRequest::new("AN"), &presenter)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        assert!(c.logs.entries().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_creations_with_one_name_keep_a_single_customer() {
        let c = customers().await;
        let (first_presenter, second_presenter) = (CustomerPresenter::new(), CustomerPresenter::new());

        let (first, second) = futures_util::future::join(
            c.create.handle(
                &alice(),
                CreateCustomerRequest::new("BERGS", "Berglunds snabbköp", Money::zero()),
                &first_presenter,
            ),
            c.create.handle(
                &alice(),
                CreateCustomerRequest::new("BERGL", "BERGLUNDS SNABBKÖP", Money::zero()),
                &second_presenter,
            ),
        )
        .await;

        assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
        let stored = [
            c.store.get_customer(&CustomerId::new("BERGS")).await.unwrap(),
            c.store.get_customer(&CustomerId::new("BERGL")).await.unwrap(),
        ];
        assert_eq!(stored.iter().flatten().count(), 1);
    }
}
