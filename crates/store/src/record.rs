//! Persisted shapes and staged-write payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CustomerId, DiscountType, Money, OrderId, ProductId, ShippingType, UserId};

/// A committed catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub units_in_stock: i32,
}

/// The state of a product row read under an exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub units_in_stock: i32,
}

impl From<ProductRecord> for ProductSnapshot {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            unit_price: record.unit_price,
            units_in_stock: record.units_in_stock,
        }
    }
}

/// A product staged for insertion. Its id is assigned on flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: Money,
    pub units_in_stock: i32,
}

/// A customer account. Staged for insertion or update with its full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    pub current_balance: Money,
}

/// An order header and its lines staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_country: String,
    pub ship_postal_code: String,
    pub shipping_type: ShippingType,
    pub discount_type: DiscountType,
    pub discount: f64,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<NewOrderLine>,
}

/// A line of a staged order. At most one per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A committed order with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_country: String,
    pub ship_postal_code: String,
    pub shipping_type: ShippingType,
    pub discount_type: DiscountType,
    pub discount: f64,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<OrderLineRecord>,
}

/// A committed order line, keyed by (order id, product id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLineRecord {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Ids assigned by a flush, in staging order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushResult {
    pub order_ids: Vec<OrderId>,
    pub product_ids: Vec<ProductId>,
    pub customer_ids: Vec<CustomerId>,
    pub customer_updates: usize,
    pub stock_updates: usize,
}

/// One entry of the domain audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainLog {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub information: String,
    pub user_name: String,
}

impl DomainLog {
    /// Creates an entry stamped with the current time.
    pub fn new(information: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            information: information.into(),
            user_name: user_name.into(),
        }
    }
}
