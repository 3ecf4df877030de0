use async_trait::async_trait;

use crate::{
    CustomerId, CustomerRecord, DomainLog, FlushResult, NewOrder, NewProduct, OrderId,
    OrderRecord, ProductId, ProductRecord, ProductSnapshot, Result,
};

/// A stock counter write waiting for the next flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub new_stock: i32,
}

/// Writes staged in a transaction and not yet flushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedWrites {
    pub stock_updates: Vec<StockUpdate>,
    pub orders: Vec<NewOrder>,
    pub products: Vec<NewProduct>,
    pub customers: Vec<CustomerRecord>,
    pub customer_updates: Vec<CustomerRecord>,
}

impl StagedWrites {
    pub fn is_empty(&self) -> bool {
        self.stock_updates.is_empty()
            && self.orders.is_empty()
            && self.products.is_empty()
            && self.customers.is_empty()
            && self.customer_updates.is_empty()
    }

    /// Stages a stock write. A later write for the same product replaces the
    /// earlier one.
    pub fn push_stock_update(&mut self, product_id: ProductId, new_stock: i32) {
        match self
            .stock_updates
            .iter_mut()
            .find(|u| u.product_id == product_id)
        {
            Some(existing) => existing.new_stock = new_stock,
            None => self.stock_updates.push(StockUpdate {
                product_id,
                new_stock,
            }),
        }
    }

    /// Moves the staged writes out, leaving the buffer empty.
    pub fn take(&mut self) -> StagedWrites {
        std::mem::take(self)
    }
}

/// Returns the distinct ids in ascending order.
///
/// Every implementation locks rows in this order so two transactions with
/// overlapping product sets can never wait on each other in a cycle.
pub fn canonical_lock_order(product_ids: &[ProductId]) -> Vec<ProductId> {
    let mut ids = product_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Entry point to the sales database.
///
/// Opens transactions for writes and serves reads of committed data only.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// The unit of work handed out by [`SalesStore::begin`].
    type Transaction: SalesTransaction;

    /// Begins a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Retrieves a committed product.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>>;

    /// Returns true if a committed product has this name, ignoring case.
    async fn product_name_exists(&self, name: &str) -> Result<bool>;

    /// Retrieves a committed order with its lines.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Retrieves a committed customer.
    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>>;

    /// Returns true if a committed customer other than `except` has this
    /// name, ignoring case.
    async fn customer_name_exists(&self, name: &str, except: Option<&CustomerId>) -> Result<bool>;
}

/// Convenience reads built on [`SalesStore`].
#[async_trait]
pub trait SalesStoreExt: SalesStore {
    /// Checks if a committed product exists.
    async fn product_exists(&self, product_id: ProductId) -> Result<bool> {
        Ok(self.get_product(product_id).await?.is_some())
    }

    /// Checks if a committed customer exists.
    async fn customer_exists(&self, customer_id: &CustomerId) -> Result<bool> {
        Ok(self.get_customer(customer_id).await?.is_some())
    }
}

impl<T: SalesStore + ?Sized> SalesStoreExt for T {}

/// A transaction-scoped unit of work.
///
/// Writes are staged in memory and reach storage only on [`flush`], and are
/// durable only after [`commit`]. `commit` and `rollback` consume the handle;
/// a handle dropped without either is rolled back and releases its locks.
///
/// [`flush`]: SalesTransaction::flush
/// [`commit`]: SalesTransaction::commit
#[async_trait]
pub trait SalesTransaction: Send {
    /// Locks the given product rows for the rest of the transaction and
    /// returns their current state.
    ///
    /// Rows are locked in ascending id order in a single call. Ids with no
    /// matching row are absent from the result. Blocks while another
    /// transaction holds any of the rows; rows already held by this
    /// transaction are not locked twice.
    async fn lock_products_for_update(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>>;

    /// Writes all staged changes as one batch.
    ///
    /// Assigns ids to staged orders and products. Nothing is visible to other
    /// transactions until commit. Fails with [`StoreError::CustomerNotFound`]
    /// when a staged customer update has no row to change.
    ///
    /// [`StoreError::CustomerNotFound`]: crate::StoreError::CustomerNotFound
    async fn flush(&mut self) -> Result<FlushResult>;

    /// Commits the transaction, releasing all locks.
    async fn commit(self) -> Result<()>;

    /// Discards everything staged or flushed, releasing all locks.
    async fn rollback(self) -> Result<()>;

    /// Writes staged since the last flush.
    fn staged(&self) -> &StagedWrites;

    fn staged_mut(&mut self) -> &mut StagedWrites;

    /// Stages a new stock level for a product.
    fn stage_stock_update(&mut self, product_id: ProductId, new_stock: i32) {
        self.staged_mut().push_stock_update(product_id, new_stock);
    }

    /// Stages an order header and its lines.
    fn stage_order(&mut self, order: NewOrder) {
        self.staged_mut().orders.push(order);
    }

    /// Stages a new catalog product.
    fn stage_product(&mut self, product: NewProduct) {
        self.staged_mut().products.push(product);
    }

    fn stage_customer(&mut self, customer: CustomerRecord) {
        self.staged_mut().customers.push(customer);
    }

    /// Stages the full new state of an existing customer.
    fn stage_customer_update(&mut self, customer: CustomerRecord) {
        self.staged_mut().customer_updates.push(customer);
    }
}

/// Append-only sink for the domain audit trail.
#[async_trait]
pub trait DomainLogStore: Send + Sync {
    async fn append(&self, log: &DomainLog) -> Result<()>;
}
