use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    CustomerId, CustomerRecord, DomainLog, FlushResult, NewOrder, NewProduct, OrderId,
    OrderLineRecord, OrderRecord, ProductId, ProductRecord, ProductSnapshot, Result, StoreError,
    constraint,
    store::{DomainLogStore, SalesStore, SalesTransaction, StagedWrites, canonical_lock_order},
};

#[derive(Debug, Default)]
struct SalesState {
    products: BTreeMap<ProductId, ProductRecord>,
    customers: BTreeMap<CustomerId, CustomerRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
}

/// In-memory sales store for testing.
///
/// Mirrors the Postgres implementation: product rows are locked with one
/// owned mutex per row, flushed writes stay private to their transaction and
/// become visible only on commit.
#[derive(Clone)]
pub struct InMemorySalesStore {
    state: Arc<RwLock<SalesState>>,
    row_locks: Arc<Mutex<HashMap<ProductId, Arc<Mutex<()>>>>>,
    next_product_id: Arc<AtomicI32>,
    next_order_id: Arc<AtomicI64>,
    lock_timeout: Option<Duration>,
    fail_on_flush: Arc<AtomicBool>,
    fail_on_commit: Arc<AtomicBool>,
}

impl Default for InMemorySalesStore {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            row_locks: Arc::default(),
            next_product_id: Arc::new(AtomicI32::new(1)),
            next_order_id: Arc::new(AtomicI64::new(1)),
            lock_timeout: None,
            fail_on_flush: Arc::default(),
            fail_on_commit: Arc::default(),
        }
    }
}

impl InMemorySalesStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given products, numbered from 1.
    pub fn with_products(products: impl IntoIterator<Item = NewProduct>) -> Self {
        let store = Self::default();
        let mut state = SalesState::default();
        for product in products {
            let id = store.allocate_product_id();
            state.products.insert(id, into_record(id, product));
        }
        Self {
            state: Arc::new(RwLock::new(state)),
            ..store
        }
    }

    /// Bounds how long a transaction waits for row locks.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Inserts a committed product directly.
    pub async fn seed_product(&self, product: NewProduct) -> ProductId {
        let id = self.allocate_product_id();
        self.state
            .write()
            .await
            .products
            .insert(id, into_record(id, product));
        id
    }

    /// Inserts a committed customer directly, replacing any with the same id.
    pub async fn seed_customer(&self, customer: CustomerRecord) {
        self.state
            .write()
            .await
            .customers
            .insert(customer.id.clone(), customer);
    }

    /// Makes every subsequent flush fail.
    pub fn set_fail_on_flush(&self, fail: bool) {
        self.fail_on_flush.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent commit fail. The failed transaction is rolled back.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns all committed orders in id order.
    pub async fn orders(&self) -> Vec<OrderRecord> {
        self.state.read().await.orders.values().cloned().collect()
    }

    fn allocate_product_id(&self) -> ProductId {
        ProductId::new(self.next_product_id.fetch_add(1, Ordering::SeqCst))
    }

    fn allocate_order_id(&self) -> OrderId {
        OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn row_lock(&self, product_id: ProductId) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        Arc::clone(locks.entry(product_id).or_default())
    }
}

fn into_record(id: ProductId, product: NewProduct) -> ProductRecord {
    ProductRecord {
        id,
        name: product.name,
        unit_price: product.unit_price,
        units_in_stock: product.units_in_stock,
    }
}

#[async_trait]
impl SalesStore for InMemorySalesStore {
    type Transaction = InMemorySalesTransaction;

    async fn begin(&self) -> Result<InMemorySalesTransaction> {
        Ok(InMemorySalesTransaction {
            store: self.clone(),
            guards: BTreeMap::new(),
            staged: StagedWrites::default(),
            flushed: FlushedWrites::default(),
        })
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn product_name_exists(&self, name: &str) -> Result<bool> {
        let name = name.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .any(|p| p.name.to_lowercase() == name))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>> {
        Ok(self.state.read().await.customers.get(customer_id).cloned())
    }

    async fn customer_name_exists(&self, name: &str, except: Option<&CustomerId>) -> Result<bool> {
        let state = self.state.read().await;
        Ok(customer_name_clash(state.customers.values(), name, except))
    }
}

/// Writes a transaction has flushed but not yet committed.
#[derive(Debug, Clone, Default)]
struct FlushedWrites {
    products: BTreeMap<ProductId, ProductRecord>,
    stock: BTreeMap<ProductId, i32>,
    customers: BTreeMap<CustomerId, CustomerRecord>,
    inserted_customers: BTreeSet<CustomerId>,
    orders: Vec<OrderRecord>,
}

impl FlushedWrites {
    /// Customers as the owning transaction sees them: its own writes
    /// overlaid on the committed rows.
    fn visible_customers<'a>(
        &'a self,
        committed: &'a BTreeMap<CustomerId, CustomerRecord>,
    ) -> impl Iterator<Item = &'a CustomerRecord> {
        self.customers.values().chain(
            committed
                .values()
                .filter(|c| !self.customers.contains_key(&c.id)),
        )
    }
}

/// A transaction on [`InMemorySalesStore`].
///
/// Holds the row guards it acquired until it is committed, rolled back or
/// dropped.
pub struct InMemorySalesTransaction {
    store: InMemorySalesStore,
    guards: BTreeMap<ProductId, OwnedMutexGuard<()>>,
    staged: StagedWrites,
    flushed: FlushedWrites,
}

impl InMemorySalesTransaction {
    /// Product ids whose rows this transaction currently holds.
    pub fn locked_product_ids(&self) -> Vec<ProductId> {
        self.guards.keys().copied().collect()
    }

    /// A product as this transaction sees it: committed state overlaid with
    /// its own flushed writes.
    fn visible_product(&self, state: &SalesState, product_id: ProductId) -> Option<ProductRecord> {
        let mut product = self
            .flushed
            .products
            .get(&product_id)
            .or_else(|| state.products.get(&product_id))
            .cloned()?;
        if let Some(stock) = self.flushed.stock.get(&product_id) {
            product.units_in_stock = *stock;
        }
        Some(product)
    }

    fn apply_staged(
        &self,
        state: &SalesState,
        staged: StagedWrites,
    ) -> Result<(FlushedWrites, FlushResult)> {
        let mut flushed = self.flushed.clone();
        let mut result = FlushResult::default();

        for product in staged.products {
            if !product.unit_price.is_positive() {
                return Err(StoreError::constraint(constraint::PRICE_POSITIVE));
            }
            if product.units_in_stock < 0 {
                return Err(StoreError::constraint(constraint::STOCK_NON_NEGATIVE));
            }
            let taken = name_in_use(
                state.products.values().chain(flushed.products.values()),
                &product.name,
            );
            if taken {
                return Err(StoreError::constraint(constraint::PRODUCT_NAME_UNIQUE));
            }
            let id = self.store.allocate_product_id();
            flushed.products.insert(id, into_record(id, product));
            result.product_ids.push(id);
        }

        for customer in staged.customers {
            check_customer(&customer)?;
            if flushed.customers.contains_key(&customer.id)
                || state.customers.contains_key(&customer.id)
            {
                return Err(StoreError::constraint(constraint::CUSTOMER_PKEY));
            }
            if customer_name_clash(
                flushed.visible_customers(&state.customers),
                &customer.name,
                Some(&customer.id),
            ) {
                return Err(StoreError::constraint(constraint::CUSTOMER_NAME_UNIQUE));
            }
            result.customer_ids.push(customer.id.clone());
            flushed.inserted_customers.insert(customer.id.clone());
            flushed.customers.insert(customer.id.clone(), customer);
        }

        for customer in staged.customer_updates {
            let exists = flushed.customers.contains_key(&customer.id)
                || state.customers.contains_key(&customer.id);
            if !exists {
                return Err(StoreError::CustomerNotFound(customer.id));
            }
            check_customer(&customer)?;
            if customer_name_clash(
                flushed.visible_customers(&state.customers),
                &customer.name,
                Some(&customer.id),
            ) {
                return Err(StoreError::constraint(constraint::CUSTOMER_NAME_UNIQUE));
            }
            flushed.customers.insert(customer.id.clone(), customer);
            result.customer_updates += 1;
        }

        for update in staged.stock_updates {
            if update.new_stock < 0 {
                return Err(StoreError::constraint(constraint::STOCK_NON_NEGATIVE));
            }
            if let Some(product) = flushed.products.get_mut(&update.product_id) {
                product.units_in_stock = update.new_stock;
                result.stock_updates += 1;
            } else if state.products.contains_key(&update.product_id) {
                flushed.stock.insert(update.product_id, update.new_stock);
                result.stock_updates += 1;
            }
        }

        for order in staged.orders {
            let id = self.store.allocate_order_id();
            let record = order_record(id, order, |product_id| {
                flushed.products.contains_key(&product_id)
                    || state.products.contains_key(&product_id)
            })?;
            flushed.orders.push(record);
            result.order_ids.push(id);
        }

        Ok((flushed, result))
    }
}

fn name_in_use<'a>(mut products: impl Iterator<Item = &'a ProductRecord>, name: &str) -> bool {
    let name = name.to_lowercase();
    products.any(|p| p.name.to_lowercase() == name)
}

fn customer_name_clash<'a>(
    mut customers: impl Iterator<Item = &'a CustomerRecord>,
    name: &str,
    except: Option<&CustomerId>,
) -> bool {
    let name = name.to_lowercase();
    customers.any(|c| Some(&c.id) != except && c.name.to_lowercase() == name)
}

fn check_customer(customer: &CustomerRecord) -> Result<()> {
    if customer.id.as_str().chars().count() != 5 {
        return Err(StoreError::constraint(constraint::CUSTOMER_ID_LENGTH));
    }
    if customer.current_balance.cents() < 0 {
        return Err(StoreError::constraint(
            constraint::CUSTOMER_BALANCE_NON_NEGATIVE,
        ));
    }
    Ok(())
}

fn order_record(
    id: OrderId,
    order: NewOrder,
    product_exists: impl Fn(ProductId) -> bool,
) -> Result<OrderRecord> {
    if i16::try_from(order.lines.len()).is_err() {
        return Err(StoreError::Unavailable("too many order lines".to_string()));
    }
    let mut lines: Vec<OrderLineRecord> = Vec::with_capacity(order.lines.len());
    for line in &order.lines {
        if !product_exists(line.product_id) {
            return Err(StoreError::constraint(constraint::LINE_PRODUCT_FK));
        }
        if line.quantity == 0 {
            return Err(StoreError::constraint(constraint::LINE_QUANTITY_POSITIVE));
        }
        if i16::try_from(line.quantity).is_err() {
            return Err(StoreError::constraint(constraint::LINE_QUANTITY_RANGE));
        }
        if lines.iter().any(|l| l.product_id == line.product_id) {
            return Err(StoreError::constraint(constraint::LINE_UNIQUE_PRODUCT));
        }
        lines.push(OrderLineRecord {
            product_id: line.product_id,
            unit_price: line.unit_price,
            quantity: line.quantity,
        });
    }

    Ok(OrderRecord {
        id,
        user_id: order.user_id,
        ship_address: order.ship_address,
        ship_city: order.ship_city,
        ship_country: order.ship_country,
        ship_postal_code: order.ship_postal_code,
        shipping_type: order.shipping_type,
        discount_type: order.discount_type,
        discount: order.discount,
        order_date: order.order_date,
        lines,
    })
}

#[async_trait]
impl SalesTransaction for InMemorySalesTransaction {
    async fn lock_products_for_update(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>> {
        let requested = canonical_lock_order(product_ids);
        let to_lock: Vec<ProductId> = requested
            .iter()
            .copied()
            .filter(|id| !self.guards.contains_key(id))
            .collect();

        let store = &self.store;
        let acquire = async {
            let mut acquired = Vec::with_capacity(to_lock.len());
            for id in to_lock {
                let row = store.row_lock(id).await;
                acquired.push((id, row.lock_owned().await));
            }
            acquired
        };

        // Guards taken before a timeout are dropped with the future.
        let acquired = match store.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire).await.map_err(|_| {
                tracing::warn!(product_ids = ?requested, "timed out waiting for row locks");
                metrics::counter!("store_lock_timeouts_total").increment(1);
                StoreError::LockTimeout {
                    product_ids: requested.clone(),
                }
            })?,
            None => acquire.await,
        };
        self.guards.extend(acquired);

        let state = self.store.state.read().await;
        Ok(requested
            .into_iter()
            .filter_map(|id| self.visible_product(&state, id))
            .map(ProductSnapshot::from)
            .collect())
    }

    async fn flush(&mut self) -> Result<FlushResult> {
        if self.store.fail_on_flush.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("flush rejected".to_string()));
        }

        let staged = self.staged.take();
        let state = self.store.state.read().await;
        let (flushed, result) = self.apply_staged(&state, staged)?;
        drop(state);
        self.flushed = flushed;

        tracing::debug!(
            orders = result.order_ids.len(),
            products = result.product_ids.len(),
            customers = result.customer_ids.len() + result.customer_updates,
            stock_updates = result.stock_updates,
            "flushed staged writes"
        );
        Ok(result)
    }

    async fn commit(mut self) -> Result<()> {
        if !self.staged.is_empty() {
            self.flush().await?;
        }
        if self.store.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit rejected".to_string()));
        }

        let flushed = std::mem::take(&mut self.flushed);

        let mut state = self.store.state.write().await;
        // Another transaction may have committed the same name since our flush.
        let name_taken = flushed
            .products
            .values()
            .any(|p| name_in_use(state.products.values(), &p.name));
        if name_taken {
            return Err(StoreError::constraint(constraint::PRODUCT_NAME_UNIQUE));
        }
        if flushed
            .inserted_customers
            .iter()
            .any(|id| state.customers.contains_key(id))
        {
            return Err(StoreError::constraint(constraint::CUSTOMER_PKEY));
        }
        let customer_clash = flushed.customers.values().any(|c| {
            customer_name_clash(
                flushed.visible_customers(&state.customers),
                &c.name,
                Some(&c.id),
            )
        });
        if customer_clash {
            return Err(StoreError::constraint(constraint::CUSTOMER_NAME_UNIQUE));
        }

        let FlushedWrites {
            products,
            stock,
            customers,
            orders,
            ..
        } = flushed;
        state.products.extend(products);
        state.customers.extend(customers);
        for (product_id, units_in_stock) in stock {
            if let Some(product) = state.products.get_mut(&product_id) {
                product.units_in_stock = units_in_stock;
            }
        }
        for order in orders {
            state.orders.insert(order.id, order);
        }
        drop(state);

        self.guards.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!(locked = self.guards.len(), "rolling back transaction");
        Ok(())
    }

    fn staged(&self) -> &StagedWrites {
        &self.staged
    }

    fn staged_mut(&mut self) -> &mut StagedWrites {
        &mut self.staged
    }
}

/// In-memory domain log store for testing.
#[derive(Clone, Default)]
pub struct InMemoryDomainLogStore {
    entries: Arc<RwLock<Vec<DomainLog>>>,
    fail_on_append: Arc<AtomicBool>,
}

impl InMemoryDomainLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent append fail.
    pub fn set_fail_on_append(&self, fail: bool) {
        self.fail_on_append.store(fail, Ordering::SeqCst);
    }

    /// Returns all entries in append order.
    pub async fn entries(&self) -> Vec<DomainLog> {
        self.entries.read().await.clone()
    }

    /// Returns the information text of every entry in append order.
    pub async fn messages(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.information.clone())
            .collect()
    }
}

#[async_trait]
impl DomainLogStore for InMemoryDomainLogStore {
    async fn append(&self, log: &DomainLog) -> Result<()> {
        if self.fail_on_append.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("domain log rejected".to_string()));
        }
        self.entries.write().await.push(log.clone());
        Ok(())
    }
}
