use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use sales_store::{Money, OrderId, ProductId, ShippingType, UserId};

use super::OrderAggregate;
use crate::output::OutputPort;

/// A committed order as shown to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub id: Option<OrderId>,
    pub user_id: UserId,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_country: String,
    pub ship_postal_code: String,
    pub shipping_type: ShippingType,
    pub lines: Vec<OrderLineView>,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl From<&OrderAggregate> for OrderView {
    fn from(aggregate: &OrderAggregate) -> Self {
        let order = aggregate.order();
        Self {
            id: order.id,
            user_id: order.user_id.clone(),
            ship_address: order.ship_address.clone(),
            ship_city: order.ship_city.clone(),
            ship_country: order.ship_country.clone(),
            ship_postal_code: order.ship_postal_code.clone(),
            shipping_type: order.shipping_type,
            lines: aggregate
                .lines()
                .iter()
                .map(|l| OrderLineView {
                    product_id: l.product_id,
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                    subtotal: l.subtotal(),
                })
                .collect(),
            total: aggregate.total(),
        }
    }
}

/// Captures the created order.
#[derive(Default)]
pub struct OrderPresenter {
    view: RwLock<Option<OrderView>>,
}

impl OrderPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured order, if one was delivered.
    pub async fn view(&self) -> Option<OrderView> {
        self.view.read().await.clone()
    }
}

#[async_trait]
impl OutputPort<OrderAggregate> for OrderPresenter {
    async fn handle(&self, value: &OrderAggregate) {
        *self.view.write().await = Some(OrderView::from(value));
    }
}
