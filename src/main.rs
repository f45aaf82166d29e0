use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

use intercity_rides::build_app;
use intercity_rides::config::{DatabaseConfig, EnvironmentConfig};
use intercity_rides::repositories::Repositories;
use intercity_rides::services::BackgroundJobs;
use intercity_rides::state::AppState;
use intercity_rides::utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (RUST_LOG o debug por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    info!("🚐 Intercity Rides - API de viajes compartidos");
    info!("================================================");

    let config = EnvironmentConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuración inválida: {}", e))?;

    // Almacenamiento: PostgreSQL si hay DATABASE_URL, memoria en caso contrario
    let repositories = match &config.database_url {
        Some(url) => {
            let pool = match DatabaseConfig::new(url.clone()).create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            DatabaseConfig::run_migrations(&pool).await?;
            info!("✅ PostgreSQL conectado");
            Repositories::postgres(pool)
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida: usando almacenamiento en memoria");
            Repositories::in_memory()
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let state = AppState::new(repositories, config, Arc::new(SystemClock));

    info!(
        "⚙️ Retención {} min, margen de despacho {} min, estrategia {}",
        state.config.hold_ttl_minutes,
        state.config.dispatch_lead_minutes,
        state.dispatch.strategy_name()
    );

    let jobs = BackgroundJobs::start(
        sweep_interval,
        state.bookings.clone(),
        state.dispatch.clone(),
        state.trips.clone(),
    );

    let app = build_app(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles bajo /api:");
    info!("   GET/POST /vehicle-configs, GET/PUT/DELETE /vehicle-configs/:id");
    info!("   GET/POST /routes, GET /routes/lookup, GET/PUT/DELETE /routes/:id");
    info!("   GET/PUT  /pricing-config");
    info!("   GET/POST /trips, GET /trips/:id, POST /trips/:id/{{dispatch,cancel,depart,arrive}}");
    info!("   GET/POST /trips/:id/bookings");
    info!("   GET /bookings, GET /bookings/:id, POST /bookings/:id/{{payment,confirm,cancel,board,assign-driver}}");
    info!("   GET/POST /drivers, PUT /drivers/:id/availability, POST /dispatch/auto");
    info!("   GET /dashboard, GET /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    jobs.shutdown().await;

    if let Err(e) = served {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
