//! Storage ports for the sales backend.
//!
//! This crate owns the persisted shape of products, customers, orders and
//! the domain audit log, and the ports the use cases talk to:
//! - [`SalesStore`] opens [`SalesTransaction`]s and serves committed reads
//! - [`SalesTransaction`] locks inventory rows, stages writes and flushes
//!   them as one unit before commit
//! - [`DomainLogStore`] appends audit entries
//!
//! Each port has a Postgres implementation and an in-memory one with the same
//! locking and visibility semantics.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{CustomerId, DiscountType, Money, OrderId, ProductId, ShippingType, UserId};
pub use error::{Result, StoreError, constraint};
pub use memory::{InMemoryDomainLogStore, InMemorySalesStore, InMemorySalesTransaction};
pub use postgres::{PostgresDomainLogStore, PostgresSalesStore, PostgresSalesTransaction};
pub use record::{
    CustomerRecord, DomainLog, FlushResult, NewOrder, NewOrderLine, NewProduct, OrderLineRecord,
    OrderRecord, ProductRecord, ProductSnapshot,
};
pub use store::{
    DomainLogStore, SalesStore, SalesStoreExt, SalesTransaction, StagedWrites, StockUpdate,
    canonical_lock_order,
};
