//! Middleware HTTP
//!
//! CORS y trazas de peticiones.

pub mod cors;
pub mod trace;
