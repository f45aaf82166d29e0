//! Tareas periódicas
//!
//! Barrido de retenciones vencidas, auto-despacho y cancelación de viajes sin
//! mínimo. Cada tarea corre en su propio intervalo y se detiene con la señal de apagado.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::booking_manager::BookingManager;
use crate::services::dispatch_coordinator::DispatchCoordinator;
use crate::services::trip_scheduler::TripScheduler;

/// Handles de las tareas en marcha
pub struct BackgroundJobs {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("⏱️ Tarea '{}' iniciada (cada {:?})", name, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => job().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("🛑 Tarea '{}' detenida", name);
    })
}

impl BackgroundJobs {
    pub fn start(
        period: Duration,
        bookings: Arc<BookingManager>,
        dispatch: Arc<DispatchCoordinator>,
        scheduler: Arc<TripScheduler>,
    ) -> Self {
        let (shutdown, receiver) = watch::channel(false);

        let hold_sweep = spawn_periodic("hold-expiry", period, receiver.clone(), move || {
            let bookings = bookings.clone();
            async move {
                if let Err(e) = bookings.expire_holds().await {
                    log::error!("❌ Barrido de retenciones fallido: {}", e);
                }
            }
        });

        let auto_dispatch = spawn_periodic("auto-dispatch", period, receiver.clone(), move || {
            let dispatch = dispatch.clone();
            async move {
                if let Err(e) = dispatch.auto_dispatch().await {
                    log::error!("❌ Auto-despacho fallido: {}", e);
                }
            }
        });

        let stale_trips = spawn_periodic("stale-trips", period, receiver, move || {
            let scheduler = scheduler.clone();
            async move {
                if let Err(e) = scheduler.cancel_stale_trips().await {
                    log::error!("❌ Cancelación de viajes vencidos fallida: {}", e);
                }
            }
        });

        Self {
            shutdown,
            handles: vec![hold_sweep, auto_dispatch, stale_trips],
        }
    }

    /// Señalar el apagado y esperar a que terminen las tareas
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("❌ Tarea en segundo plano terminó con error: {}", e);
            }
        }
    }
}
