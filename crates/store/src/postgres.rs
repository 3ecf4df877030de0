use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    CustomerId, CustomerRecord, DiscountType, DomainLog, FlushResult, Money, NewOrder, NewProduct, OrderId, OrderLineRecord,
    OrderRecord, ProductId, ProductRecord, ProductSnapshot, Result, ShippingType, StoreError,
    UserId, constraint,
    store::{DomainLogStore, SalesStore, SalesTransaction, StagedWrites, canonical_lock_order},
};

/// Postgres SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// PostgreSQL-backed sales store.
#[derive(Clone)]
pub struct PostgresSalesStore {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PostgresSalesStore {
    /// Creates a new PostgreSQL sales store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Bounds how long a transaction waits for row locks.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            units_in_stock: row.try_get("units_in_stock")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<CustomerRecord> {
        Ok(CustomerRecord {
            id: CustomerId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            current_balance: Money::from_cents(row.try_get("current_balance_cents")?),
        })
    }

    fn row_to_order(row: PgRow, lines: Vec<OrderLineRecord>) -> Result<OrderRecord> {
        let shipping_type = ShippingType::try_from(row.try_get::<i16, _>("shipping_type")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let discount_type = DiscountType::try_from(row.try_get::<i16, _>("discount_type")?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            ship_address: row.try_get("ship_address")?,
            ship_city: row.try_get("ship_city")?,
            ship_country: row.try_get("ship_country")?,
            ship_postal_code: row.try_get("ship_postal_code")?,
            shipping_type,
            discount_type,
            discount: row.try_get("discount")?,
            order_date: row.try_get("order_date")?,
            lines,
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLineRecord> {
        let quantity: i16 = row.try_get("quantity")?;
        Ok(OrderLineRecord {
            product_id: ProductId::new(row.try_get("product_id")?),
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity: u32::try_from(quantity).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        })
    }
}

/// Maps driver errors to store errors, surfacing lock timeouts and named
/// constraint violations.
fn map_db_error(e: sqlx::Error, product_ids: &[ProductId]) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
            return StoreError::LockTimeout {
                product_ids: product_ids.to_vec(),
            };
        }
        if let Some(name) = db_err.constraint() {
            return StoreError::constraint(name);
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl SalesStore for PostgresSalesStore {
    type Transaction = PostgresSalesTransaction;

    async fn begin(&self) -> Result<PostgresSalesTransaction> {
        let mut tx = self.pool.begin().await?;

        if let Some(timeout) = self.lock_timeout {
            // Scoped to this transaction only.
            sqlx::query("SELECT set_config('lock_timeout', $1, true)")
                .bind(format!("{}ms", timeout.as_millis()))
                .execute(&mut *tx)
                .await?;
        }

        Ok(PostgresSalesTransaction {
            tx,
            staged: StagedWrites::default(),
            locked: BTreeSet::new(),
        })
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT id, name, unit_price_cents, units_in_stock FROM products WHERE id = $1",
        )
        .bind(product_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn product_name_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE LOWER(name) = LOWER($1))",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn get_customer(&self, customer_id: &CustomerId) -> Result<Option<CustomerRecord>> {
        let row =
            sqlx::query("SELECT id, name, current_balance_cents FROM customers WHERE id = $1")
                .bind(customer_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn customer_name_exists(&self, name: &str, except: Option<&CustomerId>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM customers
                WHERE LOWER(name) = LOWER($1) AND ($2::varchar IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except.map(CustomerId::as_str))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let header = sqlx::query(
            r#"
            SELECT id, user_id, ship_address, ship_city, ship_country, ship_postal_code,
                   shipping_type, discount_type, discount, order_date
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query(
            r#"
            SELECT product_id, unit_price_cents, quantity
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_line)
        .collect::<Result<Vec<_>>>()?;

        Self::row_to_order(header, lines).map(Some)
    }
}

/// A transaction on [`PostgresSalesStore`].
///
/// Wraps a pooled `sqlx` transaction; dropping it without commit rolls back
/// and releases every row lock it took.
pub struct PostgresSalesTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
    staged: StagedWrites,
    locked: BTreeSet<ProductId>,
}

impl PostgresSalesTransaction {
    /// Product ids whose rows this transaction has locked.
    pub fn locked_product_ids(&self) -> Vec<ProductId> {
        self.locked.iter().copied().collect()
    }

    async fn insert_product(&mut self, product: &NewProduct) -> Result<ProductId> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, unit_price_cents, units_in_stock)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(product.unit_price.cents())
        .bind(product.units_in_stock)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_db_error(e, &[]))?;

        Ok(ProductId::new(id))
    }

    async fn insert_customer(&mut self, customer: &CustomerRecord) -> Result<CustomerId> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, current_balance_cents)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(customer.id.as_str())
        .bind(&customer.name)
        .bind(customer.current_balance.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_db_error(e, &[]))?;

        Ok(customer.id.clone())
    }

    async fn update_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        let result = sqlx::query(
            "UPDATE customers SET name = $2, current_balance_cents = $3 WHERE id = $1",
        )
        .bind(customer.id.as_str())
        .bind(&customer.name)
        .bind(customer.current_balance.cents())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_db_error(e, &[]))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CustomerNotFound(customer.id.clone()));
        }
        Ok(())
    }

    async fn update_stock(&mut self, product_id: ProductId, new_stock: i32) -> Result<u64> {
        let result = sqlx::query("UPDATE products SET units_in_stock = $2 WHERE id = $1")
            .bind(product_id.as_i32())
            .bind(new_stock)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_db_error(e, &[product_id]))?;

        Ok(result.rows_affected())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderId> {
        // Line positions are stored as SMALLINT.
        if i16::try_from(order.lines.len()).is_err() {
            return Err(StoreError::Unavailable("too many order lines".to_string()));
        }
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, ship_address, ship_city, ship_country, ship_postal_code,
                                shipping_type, discount_type, discount, order_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(order.user_id.as_str())
        .bind(&order.ship_address)
        .bind(&order.ship_city)
        .bind(&order.ship_country)
        .bind(&order.ship_postal_code)
        .bind(order.shipping_type.code())
        .bind(order.discount_type.code())
        .bind(order.discount)
        .bind(order.order_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_db_error(e, &[]))?;

        for (position, line) in order.lines.iter().enumerate() {
            let quantity = i16::try_from(line.quantity)
                .map_err(|_| StoreError::constraint(constraint::LINE_QUANTITY_RANGE))?;
            let position = i16::try_from(position)
                .map_err(|_| StoreError::Unavailable("too many order lines".to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, position, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(line.product_id.as_i32())
            .bind(position)
            .bind(line.unit_price.cents())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_db_error(e, &[line.product_id]))?;
        }

        Ok(OrderId::new(id))
    }
}

#[async_trait]
impl SalesTransaction for PostgresSalesTransaction {
    async fn lock_products_for_update(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductSnapshot>> {
        let ids = canonical_lock_order(product_ids);
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        // One statement, ascending id order: concurrent placements queue on
        // the first shared row instead of deadlocking.
        let rows = sqlx::query(
            r#"
            SELECT id, name, unit_price_cents, units_in_stock
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&raw)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| {
            let err = map_db_error(e, &ids);
            if matches!(err, StoreError::LockTimeout { .. }) {
                tracing::warn!(product_ids = ?ids, "timed out waiting for row locks");
                metrics::counter!("store_lock_timeouts_total").increment(1);
            }
            err
        })?;

        let snapshots = rows
            .into_iter()
            .map(|row| PostgresSalesStore::row_to_product(row).map(ProductSnapshot::from))
            .collect::<Result<Vec<_>>>()?;
        self.locked.extend(snapshots.iter().map(|s| s.id));
        Ok(snapshots)
    }

    async fn flush(&mut self) -> Result<FlushResult> {
        let staged = self.staged.take();
        let mut result = FlushResult::default();

        for product in &staged.products {
            result.product_ids.push(self.insert_product(product).await?);
        }
        for customer in &staged.customers {
            result.customer_ids.push(self.insert_customer(customer).await?);
        }
        for customer in &staged.customer_updates {
            self.update_customer(customer).await?;
            result.customer_updates += 1;
        }
        for update in &staged.stock_updates {
            let affected = self.update_stock(update.product_id, update.new_stock).await?;
            result.stock_updates += affected as usize;
        }
        for order in &staged.orders {
            result.order_ids.push(self.insert_order(order).await?);
        }

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
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!(locked = self.locked.len(), "rolling back transaction");
        self.tx.rollback().await?;
        Ok(())
    }

    fn staged(&self) -> &StagedWrites {
        &self.staged
    }

    fn staged_mut(&mut self) -> &mut StagedWrites {
        &mut self.staged
    }
}

/// PostgreSQL-backed domain log store.
#[derive(Clone)]
pub struct PostgresDomainLogStore {
    pool: PgPool,
}

impl PostgresDomainLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainLogStore for PostgresDomainLogStore {
    async fn append(&self, log: &DomainLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO domain_logs (id, created_at, information, user_name)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(log.id)
        .bind(log.created_at)
        .bind(&log.information)
        .bind(&log.user_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
