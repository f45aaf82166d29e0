//! Acceso serializado a los agregados viaje + reservas
//!
//! Cada viaje tiene su propio candado asíncrono. Una operación toma el candado,
//! carga el agregado, trabaja sobre una copia y la persiste con control de
//! versión optimista. Si la operación falla antes de `commit`, no queda rastro.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::trip_ledger::TripLedger;
use crate::repositories::TripRepository;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Tiempo máximo de espera por el candado de un viaje
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
/// Tamaño a partir del cual se purgan candados sin uso
const PRUNE_THRESHOLD: usize = 1024;

pub struct TripLedgers {
    repository: Arc<dyn TripRepository>,
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Agregado bloqueado en exclusiva hasta que se confirma o se descarta
pub struct TripLease {
    repository: Arc<dyn TripRepository>,
    ledger: TripLedger,
    expected_version: i64,
    _guard: OwnedMutexGuard<()>,
}

impl TripLedgers {
    pub fn new(repository: Arc<dyn TripRepository>) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn TripRepository> {
        &self.repository
    }

    fn lock_for(&self, trip_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(trip_id).or_default().clone()
    }

    /// Bloquear y cargar el agregado del viaje
    pub async fn lock(&self, trip_id: Uuid) -> AppResult<TripLease> {
        let guard = tokio::time::timeout(LOCK_TIMEOUT, self.lock_for(trip_id).lock_owned())
            .await
            .map_err(|_| AppError::Conflict(format!("Trip {} is busy, retry later", trip_id)))?;

        let ledger = self
            .repository
            .load(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))?;

        Ok(TripLease {
            repository: self.repository.clone(),
            expected_version: ledger.trip.version,
            ledger,
            _guard: guard,
        })
    }

    /// Lectura sin bloqueo
    pub async fn load(&self, trip_id: Uuid) -> AppResult<TripLedger> {
        self.repository
            .load(trip_id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &trip_id.to_string()))
    }

    /// Bloquear, aplicar una mutación síncrona y persistir
    pub async fn mutate<T, F>(&self, trip_id: Uuid, mutation: F) -> AppResult<(T, TripLedger)>
    where
        F: FnOnce(&mut TripLedger) -> AppResult<T>,
    {
        let mut lease = self.lock(trip_id).await?;
        let value = mutation(lease.ledger_mut())?;
        let ledger = lease.commit().await?;
        Ok((value, ledger))
    }
}

impl TripLease {
    pub fn ledger(&self) -> &TripLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut TripLedger {
        &mut self.ledger
    }

    /// Persistir la copia de trabajo con la siguiente versión
    pub async fn commit(mut self) -> AppResult<TripLedger> {
        if !self.ledger.is_consistent() {
            return Err(AppError::Internal(format!(
                "Trip {} seat counter {} does not match its bookings ({})",
                self.ledger.trip.id,
                self.ledger.trip.booked_seats,
                self.ledger.seats_held_by_bookings()
            )));
        }

        self.ledger.trip.version = self.expected_version + 1;
        self.repository.save(&self.ledger, self.expected_version).await?;
        Ok(self.ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::fixtures;
    use crate::models::trip_ledger::HoldRequest;
    use crate::repositories::InMemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};

    async fn setup() -> (TripLedgers, Uuid) {
        let store = Arc::new(InMemoryStore::default());
        let ledger = TripLedger::new(fixtures::trip(Utc::now()));
        let trip_id = ledger.trip.id;
        TripRepository::insert(store.as_ref(), &ledger).await.unwrap();
        (TripLedgers::new(store), trip_id)
    }

    fn hold(seats: i32) -> HoldRequest {
        HoldRequest { user_id: Uuid::new_v4(), seat_count: seats, pickup_point: None, drop_point: None }
    }

    #[tokio::test]
    async fn test_commit_bumps_version() {
        let (ledgers, trip_id) = setup().await;
        let (_, ledger) = ledgers
            .mutate(trip_id, |l| l.place_hold(hold(2), ChronoDuration::minutes(10), Utc::now()))
            .await
            .unwrap();
        assert_eq!(ledger.trip.version, 1);
        assert_eq!(ledgers.load(trip_id).await.unwrap().trip.booked_seats, 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_no_trace() {
        let (ledgers, trip_id) = setup().await;
        let err = ledgers
            .mutate(trip_id, |l| l.place_hold(hold(5), ChronoDuration::minutes(10), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded(_)));

        let stored = ledgers.load(trip_id).await.unwrap();
        assert_eq!(stored.trip.version, 0);
        assert_eq!(stored.trip.booked_seats, 0);
        assert!(stored.bookings.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_lease_is_not_persisted() {
        let (ledgers, trip_id) = setup().await;
        {
            let mut lease = ledgers.lock(trip_id).await.unwrap();
            lease.ledger_mut().trip.cancellation_reason = Some("draft".to_string());
        }
        assert!(ledgers.load(trip_id).await.unwrap().trip.cancellation_reason.is_none());
    }

    #[tokio::test]
    async fn test_unknown_trip_is_not_found() {
        let (ledgers, _) = setup().await;
        assert!(matches!(ledgers.lock(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }
}
