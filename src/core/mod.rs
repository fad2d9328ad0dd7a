//! Core module containing the fundamental traits and types of the service

pub mod entity;
pub mod error;
pub mod repository;
pub mod store;

pub use entity::Document;
pub use error::{ErrorResponse, TallyError, TallyResult};
pub use repository::Repository;
pub use store::{DocumentStore, Filter, Sort, SortOrder};
