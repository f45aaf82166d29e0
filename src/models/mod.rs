//! Modelos del sistema
//!
//! Entidades del catálogo (vehículos, rutas, tarifas), conductores y el
//! agregado viaje + reservas.

pub mod booking;
pub mod driver;
pub mod pricing;
pub mod route;
pub mod trip;
pub mod trip_ledger;
pub mod vehicle_config;
