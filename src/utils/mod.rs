//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! reloj inyectable y generación de códigos.

pub mod clock;
pub mod codes;
pub mod errors;
pub mod validation;

pub use errors::{AppError, AppResult};
