//! Customer maintenance: create, update and look up by id.

mod interactor;
pub mod messages;
mod presenter;
mod request;
mod validators;

pub use interactor::{CreateCustomerInteractor, GetCustomerByIdInteractor, UpdateCustomerInteractor};
pub use presenter::CustomerPresenter;
pub use request::{CreateCustomerRequest, GetCustomerByIdRequest, UpdateCustomerRequest};
pub use validators::{
    CUSTOMER_ID_LEN, CreateCustomerBusinessValidator, CreateCustomerRequestValidator,
    GetCustomerByIdRequestValidator, MAX_CUSTOMER_NAME_LEN, UpdateCustomerBusinessValidator,
    UpdateCustomerRequestValidator,
};
