//! Order aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sales_store::{
    DiscountType, Money, NewOrder, NewOrderLine, OrderId, ProductId, ShippingType, UserId,
};

use super::CreateOrderRequest;

/// Order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned when the order is flushed.
    pub id: Option<OrderId>,
    pub user_id: UserId,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_country: String,
    pub ship_postal_code: String,
    pub shipping_type: ShippingType,
    pub discount_type: DiscountType,
    pub discount: f64,
    pub order_date: DateTime<Utc>,
}

/// A line owned by one order. At most one per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Price frozen at order time.
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order header and the lines it owns.
///
/// Lines are only added through [`OrderAggregate::add_line`], which keeps one
/// line per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    order: Order,
    lines: Vec<OrderLine>,
}

impl OrderAggregate {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            lines: Vec::new(),
        }
    }

    /// Builds the aggregate for `user_id` from a submitted request.
    ///
    /// Shipping fields are copied verbatim and every requested line is added
    /// in order, so repeated products are merged.
    pub fn from_request(request: &CreateOrderRequest, user_id: UserId) -> Self {
        let mut aggregate = Self::new(Order {
            id: None,
            user_id,
            ship_address: request.ship_address.clone(),
            ship_city: request.ship_city.clone(),
            ship_country: request.ship_country.clone(),
            ship_postal_code: request.ship_postal_code.clone(),
            shipping_type: request.shipping_type,
            discount_type: request.discount_type,
            discount: request.discount,
            order_date: Utc::now(),
        });

        for line in &request.lines {
            aggregate.add_line(line.product_id, line.unit_price, line.quantity);
        }
        aggregate
    }

    /// Adds a line, merging it into an existing line for the same product.
    ///
    /// A merged line takes the summed quantity and the price of this call,
    /// and moves to the end of the line list.
    pub fn add_line(&mut self, product_id: ProductId, unit_price: Money, quantity: u32) {
        let mut quantity = quantity;
        if let Some(index) = self.lines.iter().position(|l| l.product_id == product_id) {
            let existing = self.lines.remove(index);
            quantity = quantity.saturating_add(existing.quantity);
        }
        self.lines.push(OrderLine {
            product_id,
            unit_price,
            quantity,
        });
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn id(&self) -> Option<OrderId> {
        self.order.id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    /// Distinct product ids in ascending order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub(crate) fn assign_id(&mut self, id: OrderId) {
        self.order.id = Some(id);
    }

    /// The header and lines as a staged write.
    pub fn to_new_order(&self) -> NewOrder {
        NewOrder {
            user_id: self.order.user_id.clone(),
            ship_address: self.order.ship_address.clone(),
            ship_city: self.order.ship_city.clone(),
            ship_country: self.order.ship_country.clone(),
            ship_postal_code: self.order.ship_postal_code.clone(),
            shipping_type: self.order.shipping_type,
            discount_type: self.order.discount_type,
            discount: self.order.discount,
            order_date: self.order.order_date,
            lines: self
                .lines
                .iter()
                .map(|l| NewOrderLine {
                    product_id: l.product_id,
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}
