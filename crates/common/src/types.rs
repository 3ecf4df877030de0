use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a persisted order.
///
/// Assigned by the store when the order is flushed; an order that has not
/// been persisted yet has no id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Creates an order ID from its raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Identifier of a catalog product.
///
/// Ordering is significant: inventory rows are always locked in ascending
/// product id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i32);

impl ProductId {
    /// Creates a product ID from its raw value.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ProductId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Five-character customer code, such as `ALFKI`.
///
/// Chosen by the caller rather than generated by the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the authenticated user who owns an order.
///
/// Issued by the external authenticator; opaque to this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored classifier code that does not map to a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownClassifier {
    pub kind: &'static str,
    pub code: i16,
}

/// How an order is shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShippingType {
    #[default]
    Road,
    Air,
}

impl ShippingType {
    /// Returns the code stored in the orders table.
    pub fn code(&self) -> i16 {
        match self {
            ShippingType::Road => 0,
            ShippingType::Air => 1,
        }
    }
}

impl TryFrom<i16> for ShippingType {
    type Error = UnknownClassifier;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ShippingType::Road),
            1 => Ok(ShippingType::Air),
            _ => Err(UnknownClassifier {
                kind: "shipping type",
                code,
            }),
        }
    }
}

/// How the order discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiscountType {
    #[default]
    Percentage,
    Absolute,
}

impl DiscountType {
    /// Returns the code stored in the orders table.
    pub fn code(&self) -> i16 {
        match self {
            DiscountType::Percentage => 0,
            DiscountType::Absolute => 1,
        }
    }
}

impl TryFrom<i16> for DiscountType {
    type Error = UnknownClassifier;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DiscountType::Percentage),
            1 => Ok(DiscountType::Absolute),
            _ => Err(UnknownClassifier {
                kind: "discount type",
                code,
            }),
        }
    }
}
