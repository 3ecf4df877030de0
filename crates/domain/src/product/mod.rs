//! Catalog product creation.

mod interactor;
pub mod messages;
mod presenter;
mod request;
mod validators;

pub use interactor::CreateProductInteractor;
pub use presenter::ProductPresenter;
pub use request::CreateProductRequest;
pub use validators::{
    CreateProductBusinessValidator, CreateProductRequestValidator, MAX_PRODUCT_NAME_LEN,
};
