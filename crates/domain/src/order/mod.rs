//! Order placement.

mod aggregate;
mod events;
mod interactor;
pub mod messages;
mod presenter;
mod request;
mod specification;
mod stage;
mod validators;

pub use aggregate::{Order, OrderAggregate, OrderLine};
pub use events::{SendEmailWhenSpecialOrderCreated, SpecialOrderCreatedEvent};
pub use interactor::CreateOrderInteractor;
pub use presenter::{OrderLineView, OrderPresenter, OrderView};
pub use request::{CreateOrderLine, CreateOrderRequest};
pub use specification::SpecialOrderSpecification;
pub use stage::PlacementStage;
pub use validators::{
    CreateOrderLineValidator, CreateOrderRequestValidator, MAX_LINE_QUANTITY, MAX_ORDER_LINES,
};
