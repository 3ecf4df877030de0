use serde::{Deserialize, Serialize};

use sales_store::{CustomerId, CustomerRecord, Money};

/// A new customer, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub id: String,
    pub name: String,
    pub current_balance: Money,
}

impl CreateCustomerRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, current_balance: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_balance,
        }
    }

    pub(crate) fn to_record(&self) -> CustomerRecord {
        CustomerRecord {
            id: CustomerId::new(self.id.trim()),
            name: self.name.trim().to_string(),
            current_balance: self.current_balance,
        }
    }
}

/// Replacement name and balance for an existing customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomerRequest {
    pub customer_id: String,
    pub name: String,
    pub current_balance: Money,
}

impl UpdateCustomerRequest {
    pub fn new(
        customer_id: impl Into<String>,
        name: impl Into<String>,
        current_balance: Money,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            name: name.into(),
            current_balance,
        }
    }

    pub(crate) fn id(&self) -> CustomerId {
        CustomerId::new(self.customer_id.trim())
    }

    pub(crate) fn to_record(&self) -> CustomerRecord {
        CustomerRecord {
            id: self.id(),
            name: self.name.trim().to_string(),
            current_balance: self.current_balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCustomerByIdRequest {
    pub customer_id: String,
}

impl GetCustomerByIdRequest {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
        }
    }

    pub(crate) fn id(&self) -> CustomerId {
        CustomerId::new(self.customer_id.trim())
    }
}
