use serde::{Deserialize, Serialize};

use sales_store::{Money, NewProduct};

/// A new catalog product, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub unit_price: Money,
    pub units_in_stock: i32,
}

impl CreateProductRequest {
    pub fn new(name: impl Into<String>, unit_price: Money, units_in_stock: i32) -> Self {
        Self {
            name: name.into(),
            unit_price,
            units_in_stock,
        }
    }

    pub(crate) fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            unit_price: self.unit_price,
            units_in_stock: self.units_in_stock,
        }
    }
}
