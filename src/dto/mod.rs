//! DTOs de la API
//!
//! Requests validados con `validator` y respuestas serializadas de la API.

pub mod catalog_dto;
pub mod common_dto;
pub mod driver_dto;
pub mod trip_dto;

pub use common_dto::{ApiResponse, Page, Pagination};
