//! Input of the create-order use case.

use serde::{Deserialize, Serialize};

use sales_store::{DiscountType, Money, ProductId, ShippingType};

fn default_discount() -> f64 {
    10.0
}

/// A submitted order, as received from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub ship_address: String,
    pub ship_city: String,
    pub ship_country: String,
    pub ship_postal_code: String,
    #[serde(default)]
    pub shipping_type: ShippingType,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default = "default_discount")]
    pub discount: f64,
    pub lines: Vec<CreateOrderLine>,
}

/// One requested line. The same product may appear more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderLine {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CreateOrderRequest {
    /// Creates a request with the default classifiers and no lines.
    pub fn new(
        ship_address: impl Into<String>,
        ship_city: impl Into<String>,
        ship_country: impl Into<String>,
        ship_postal_code: impl Into<String>,
    ) -> Self {
        Self {
            ship_address: ship_address.into(),
            ship_city: ship_city.into(),
            ship_country: ship_country.into(),
            ship_postal_code: ship_postal_code.into(),
            shipping_type: ShippingType::default(),
            discount_type: DiscountType::default(),
            discount: default_discount(),
            lines: Vec::new(),
        }
    }

    /// Appends a line.
    pub fn with_line(
        mut self,
        product_id: impl Into<ProductId>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        self.lines.push(CreateOrderLine {
            product_id: product_id.into(),
            unit_price,
            quantity,
        });
        self
    }

    pub fn with_shipping_type(mut self, shipping_type: ShippingType) -> Self {
        self.shipping_type = shipping_type;
        self
    }
}
