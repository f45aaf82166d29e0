//! Services module
//!
//! Lógica de negocio: catálogo, motor de tarifas, programación de viajes,
//! reservas, despacho y tareas periódicas. Los servicios reciben repositorios
//! y reloj por inyección y no conocen HTTP.

pub mod background_jobs;
pub mod booking_manager;
pub mod dashboard_service;
pub mod dispatch_coordinator;
pub mod driver_service;
pub mod pricing_config_service;
pub mod pricing_engine;
pub mod route_service;
pub mod trip_ledgers;
pub mod trip_scheduler;
pub mod vehicle_config_service;

pub use background_jobs::BackgroundJobs;
pub use booking_manager::BookingManager;
pub use dashboard_service::DashboardService;
pub use dispatch_coordinator::DispatchCoordinator;
pub use driver_service::DriverService;
pub use pricing_config_service::PricingConfigService;
pub use route_service::RouteService;
pub use trip_ledgers::TripLedgers;
pub use trip_scheduler::TripScheduler;
pub use vehicle_config_service::VehicleConfigService;
