//! Domain log texts for product creation.

use std::fmt::Display;

use sales_store::ProductId;

pub const STARTING: &str = "Starting product creation";

pub fn created(product_id: ProductId, name: &str) -> String {
    format!("Product {product_id} ({name}) created")
}

pub fn cancelled(name: &str, error: &impl Display) -> String {
    format!("Product {name} creation cancelled. Error: {error}")
}

pub fn already_exists(name: &str) -> String {
    format!("A product named '{name}' already exists")
}
