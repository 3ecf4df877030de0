//! Use cases of the sales backend.
//!
//! This crate provides:
//! - The validation pipeline and the guards every use case runs first
//! - The order aggregate, special-order policy and the order placement
//!   transaction ([`CreateOrderInteractor`])
//! - Product creation ([`CreateProductInteractor`])
//! - Customer maintenance ([`CreateCustomerInteractor`], [`UpdateCustomerInteractor`],
//!   [`GetCustomerByIdInteractor`])
//! - Domain event publishing and the domain audit log
//!
//! Storage is reached only through the `sales-store` ports.

pub mod customer;
pub mod error;
pub mod events;
pub mod logging;
pub mod mail;
pub mod order;
pub mod output;
pub mod product;
pub mod user;
pub mod validation;

pub use customer::{
    CreateCustomerBusinessValidator, CreateCustomerInteractor, CreateCustomerRequest,
    CreateCustomerRequestValidator, CustomerPresenter, GetCustomerByIdInteractor,
    GetCustomerByIdRequest, GetCustomerByIdRequestValidator, UpdateCustomerBusinessValidator,
    UpdateCustomerInteractor, UpdateCustomerRequest, UpdateCustomerRequestValidator,
};
pub use error::DomainError;
pub use events::{DomainEvent, DomainEventHandler, DomainEventHub, HandlerError, RaiseOutcome};
pub use logging::DomainLogger;
pub use mail::{InMemoryMailer, MailError, MailMessage, Mailer, TracingMailer};
pub use order::{
    CreateOrderInteractor, CreateOrderLine, CreateOrderLineValidator, CreateOrderRequest,
    CreateOrderRequestValidator, Order, OrderAggregate, OrderLine, OrderPresenter, OrderView,
    PlacementStage, SendEmailWhenSpecialOrderCreated, SpecialOrderCreatedEvent,
    SpecialOrderSpecification,
};
pub use output::OutputPort;
pub use product::{
    CreateProductBusinessValidator, CreateProductInteractor, CreateProductRequest,
    CreateProductRequestValidator, ProductPresenter,
};
pub use user::{AnonymousUser, AuthenticatedUser, UserService};
pub use validation::{
    ModelValidator, ModelValidatorHub, ValidationConstraint, ValidationError, ValidationErrors,
    ValidationFlow,
};
