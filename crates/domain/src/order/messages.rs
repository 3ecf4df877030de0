//! Domain log texts for order placement.

use std::fmt::Display;

use sales_store::OrderId;

pub const STARTING: &str = "Starting purchase order creation";

pub fn created(order_id: OrderId) -> String {
    format!("Purchase order {order_id} created")
}

pub fn cancelled(working_id: Option<OrderId>, error: &impl Display) -> String {
    let id = working_id.map_or_else(|| "unassigned".to_string(), |id| id.to_string());
    format!("Purchase order {id} creation cancelled. Error: {error}")
}
