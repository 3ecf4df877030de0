//! Domain log and validation texts for customer maintenance.

use std::fmt::Display;

use sales_store::CustomerId;

pub const STARTING: &str = "Starting customer creation";

pub const UPDATE_STARTING: &str = "Starting customer update";

pub fn created(customer_id: &CustomerId) -> String {
    format!("Customer {customer_id} created")
}

pub fn cancelled(customer_id: &CustomerId, error: &impl Display) -> String {
    format!("Customer {customer_id} creation cancelled. Error: {error}")
}

pub fn updated(customer_id: &CustomerId) -> String {
    format!("Customer {customer_id} updated")
}

pub fn update_cancelled(customer_id: &CustomerId, error: &impl Display) -> String {
    format!("Customer {customer_id} update cancelled. Error: {error}")
}

pub fn already_exists(name: &str) -> String {
    format!("A customer named '{name}' already exists")
}

pub fn not_found(customer_id: &str) -> String {
    format!("Customer {customer_id} does not exist")
}
