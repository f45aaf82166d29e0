//! Motor de tarifas
//!
//! Funciones puras: precio total del viaje, precio por cabeza según ocupación,
//! desglose de comisión/tasas y reembolsos por antelación de cancelación.
//! No leen configuración global: reciben siempre el snapshot del viaje.

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::pricing::PricingConfig;
use crate::models::route::Route;
use crate::models::vehicle_config::VehicleConfig;
use crate::utils::errors::AppError;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("vehicle config {0} is inactive")]
    ConfigInactive(Uuid),

    #[error("route {0} is inactive")]
    RouteInactive(Uuid),

    #[error("invalid pricing parameters: {0}")]
    InvalidParameters(String),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ConfigInactive(_) | PricingError::RouteInactive(_) => {
                AppError::Configuration(err.to_string())
            }
            PricingError::InvalidParameters(_) => AppError::Validation(err.to_string()),
        }
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// ¿La hora local de salida cae en la ventana nocturna?
pub fn is_night_departure(pricing: &PricingConfig, departure: DateTime<Utc>) -> bool {
    let (start, end) = (pricing.night_start_hour, pricing.night_end_hour);
    if start == end {
        return false;
    }

    let hour = match FixedOffset::east_opt(pricing.utc_offset_minutes * 60) {
        Some(offset) => departure.with_timezone(&offset).hour(),
        None => departure.hour(),
    };

    if start < end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Precio total del viaje en el momento de crearlo
pub fn trip_total_price(
    vehicle: &VehicleConfig,
    route: &Route,
    pricing: &PricingConfig,
    departure: DateTime<Utc>,
) -> Result<Decimal, PricingError> {
    if !vehicle.is_active {
        return Err(PricingError::ConfigInactive(vehicle.id));
    }
    if !route.is_active {
        return Err(PricingError::RouteInactive(route.id));
    }
    if vehicle.total_price <= Decimal::ZERO {
        return Err(PricingError::InvalidParameters(format!(
            "vehicle total price must be positive, got {}",
            vehicle.total_price
        )));
    }
    if route.price_multiplier <= Decimal::ZERO {
        return Err(PricingError::InvalidParameters(format!(
            "route price multiplier must be positive, got {}",
            route.price_multiplier
        )));
    }

    let mut total = vehicle.total_price * route.price_multiplier;
    if pricing.night_fare_enabled && is_night_departure(pricing, departure) {
        if pricing.night_fare_multiplier <= Decimal::ZERO {
            return Err(PricingError::InvalidParameters(
                "night fare multiplier must be positive".to_string(),
            ));
        }
        total *= pricing.night_fare_multiplier;
    }

    Ok(money(total))
}

/// Precio por cabeza: total repartido entre los asientos reservados (mínimo 1)
pub fn per_head_price(total_price: Decimal, booked_seats: i32) -> Decimal {
    let divisor = Decimal::from(booked_seats.max(1));
    money(total_price / divisor)
}

/// Comisión limitada a [min, max] cuando está activada
pub fn commission_amount(total_amount: Decimal, pricing: &PricingConfig) -> Decimal {
    if !pricing.commission_enabled {
        return Decimal::ZERO;
    }
    let raw = percent_of(total_amount, pricing.commission_percent);
    money(raw.max(pricing.min_commission_amount).min(pricing.max_commission_amount))
}

/// Desglose de importes de una reserva
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FareBreakdown {
    pub price_per_seat: Decimal,
    pub total_amount: Decimal,
    pub commission_amount: Decimal,
    pub platform_fee_amount: Decimal,
    pub gst_amount: Decimal,
    pub payable_amount: Decimal,
}

pub fn fare_breakdown(price_per_seat: Decimal, seats: i32, pricing: &PricingConfig) -> FareBreakdown {
    let total_amount = money(price_per_seat * Decimal::from(seats));
    let commission = commission_amount(total_amount, pricing);
    let platform_fee = money(percent_of(total_amount, pricing.platform_fee_percent));
    let gst = money(percent_of(platform_fee + commission, pricing.gst_percent));

    FareBreakdown {
        price_per_seat,
        total_amount,
        commission_amount: commission,
        platform_fee_amount: platform_fee,
        gst_amount: gst,
        payable_amount: total_amount + platform_fee + gst,
    }
}

/// Antelación máxima admitida en un tramo de reembolso (un año)
const MAX_REFUND_TIER_HOURS: i64 = 365 * 24;

/// Tramo de reembolso: con al menos `min_hours_before_departure` de antelación
/// se devuelve `refund_percent` del importe pagado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RefundTier {
    pub min_hours_before_departure: i64,
    pub refund_percent: Decimal,
}

/// Tabla de reembolsos configurable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundPolicy {
    tiers: Vec<RefundTier>,
}

impl RefundPolicy {
    pub fn new(mut tiers: Vec<RefundTier>) -> Result<Self, PricingError> {
        for tier in &tiers {
            if !(0..=MAX_REFUND_TIER_HOURS).contains(&tier.min_hours_before_departure) {
                return Err(PricingError::InvalidParameters(format!(
                    "refund tier hours {} out of range 0-{}",
                    tier.min_hours_before_departure, MAX_REFUND_TIER_HOURS
                )));
            }
            if tier.refund_percent < Decimal::ZERO || tier.refund_percent > Decimal::ONE_HUNDRED {
                return Err(PricingError::InvalidParameters(format!(
                    "refund percent {} out of range 0-100",
                    tier.refund_percent
                )));
            }
        }
        tiers.sort_by(|a, b| b.min_hours_before_departure.cmp(&a.min_hours_before_departure));
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[RefundTier] {
        &self.tiers
    }

    /// Porcentaje aplicable según la antelación; 0 si la salida ya pasó
    pub fn refund_percent(&self, lead_time: Duration) -> Decimal {
        if lead_time < Duration::zero() {
            return Decimal::ZERO;
        }
        self.tiers
            .iter()
            .find(|tier| lead_time >= Duration::hours(tier.min_hours_before_departure))
            .map(|tier| tier.refund_percent)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn refund_amount(&self, paid_amount: Decimal, lead_time: Duration) -> Decimal {
        money(percent_of(paid_amount, self.refund_percent(lead_time)))
    }
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                RefundTier { min_hours_before_departure: 24, refund_percent: Decimal::ONE_HUNDRED },
                RefundTier { min_hours_before_departure: 6, refund_percent: Decimal::new(50, 0) },
                RefundTier { min_hours_before_departure: 0, refund_percent: Decimal::ZERO },
            ],
        }
    }
}

/// Formato `horas:porcentaje` separados por comas, ej. `24:100,6:50,0:0`
impl FromStr for RefundPolicy {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiers = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                let (hours, percent) = part.trim().split_once(':').ok_or_else(|| {
                    PricingError::InvalidParameters(format!("refund tier '{}' must be hours:percent", part))
                })?;
                let min_hours_before_departure = hours.trim().parse::<i64>().map_err(|e| {
                    PricingError::InvalidParameters(format!("refund tier hours '{}': {}", hours, e))
                })?;
                let refund_percent = Decimal::from_str(percent.trim()).map_err(|e| {
                    PricingError::InvalidParameters(format!("refund tier percent '{}': {}", percent, e))
                })?;
                Ok(RefundTier { min_hours_before_departure, refund_percent })
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        RefundPolicy::new(tiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::route::GeoPoint;
    use crate::models::vehicle_config::VehicleType;
    use chrono::TimeZone;

    fn vehicle(total: i64) -> VehicleConfig {
        VehicleConfig {
            id: Uuid::new_v4(),
            vehicle_type: VehicleType::SharedCar,
            display_name: "Shared Sedan".to_string(),
            total_price: Decimal::new(total, 0),
            min_seats: 2,
            max_seats: 4,
            display_order: 1,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn route(multiplier: Decimal) -> Route {
        Route {
            id: Uuid::new_v4(),
            origin: GeoPoint { name: "Pune".into(), lat: 18.52, lng: 73.85 },
            destination: GeoPoint { name: "Mumbai".into(), lat: 19.07, lng: 72.87 },
            distance_km: 150.0,
            duration_minutes: 200,
            price_multiplier: multiplier,
            is_bidirectional: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn utc_pricing() -> PricingConfig {
        PricingConfig { utc_offset_minutes: 0, ..PricingConfig::default() }
    }

    #[test]
    fn test_total_price_applies_route_multiplier() {
        let departure = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let total =
            trip_total_price(&vehicle(400), &route(Decimal::new(15, 1)), &utc_pricing(), departure).unwrap();
        assert_eq!(total, Decimal::new(600, 0));
    }

    #[test]
    fn test_night_fare_window_wraps_midnight() {
        let pricing = PricingConfig { night_fare_enabled: true, ..utc_pricing() };
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 3, 1, 5, 59, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        assert!(is_night_departure(&pricing, late));
        assert!(is_night_departure(&pricing, early));
        assert!(!is_night_departure(&pricing, morning));

        let total = trip_total_price(&vehicle(400), &route(Decimal::ONE), &pricing, late).unwrap();
        assert_eq!(total, Decimal::new(500, 0));
    }

    #[test]
    fn test_night_window_uses_local_offset() {
        // 17:00 UTC son las 22:30 en IST
        let pricing = PricingConfig { night_fare_enabled: true, ..PricingConfig::default() };
        let departure = Utc.with_ymd_and_hms(2026, 3, 1, 17, 0, 0).unwrap();
        assert!(is_night_departure(&pricing, departure));
    }

    #[test]
    fn test_inactive_inputs_are_distinguished() {
        let departure = Utc::now();
        let mut inactive_vehicle = vehicle(400);
        inactive_vehicle.is_active = false;
        assert!(matches!(
            trip_total_price(&inactive_vehicle, &route(Decimal::ONE), &utc_pricing(), departure),
            Err(PricingError::ConfigInactive(_))
        ));

        let mut inactive_route = route(Decimal::ONE);
        inactive_route.is_active = false;
        assert!(matches!(
            trip_total_price(&vehicle(400), &inactive_route, &utc_pricing(), departure),
            Err(PricingError::RouteInactive(_))
        ));

        assert!(matches!(
            trip_total_price(&vehicle(0), &route(Decimal::ONE), &utc_pricing(), departure),
            Err(PricingError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_per_head_price_amortizes_total() {
        let total = Decimal::new(400, 0);
        assert_eq!(per_head_price(total, 0), Decimal::new(400, 0));
        assert_eq!(per_head_price(total, 2), Decimal::new(200, 0));
        assert_eq!(per_head_price(total, 4), Decimal::new(100, 0));
        // 400 / 3 = 133.33 → 133.33 * 3 ≈ 400
        let third = per_head_price(total, 3);
        assert_eq!(third, Decimal::new(13333, 2));
        assert!((third * Decimal::from(3) - total).abs() < Decimal::new(1, 1));
    }

    #[test]
    fn test_commission_is_clamped() {
        let pricing = PricingConfig::default();
        // 10% de 50 = 5 → mínimo 10
        assert_eq!(commission_amount(Decimal::new(50, 0), &pricing), Decimal::new(10, 0));
        // 10% de 10000 = 1000 → máximo 500
        assert_eq!(commission_amount(Decimal::new(10000, 0), &pricing), Decimal::new(500, 0));
        assert_eq!(commission_amount(Decimal::new(400, 0), &pricing), Decimal::new(40, 0));

        let disabled = PricingConfig { commission_enabled: false, ..pricing };
        assert_eq!(commission_amount(Decimal::new(400, 0), &disabled), Decimal::ZERO);
    }

    #[test]
    fn test_fare_breakdown() {
        let fare = fare_breakdown(Decimal::new(200, 0), 2, &PricingConfig::default());
        assert_eq!(fare.total_amount, Decimal::new(400, 0));
        assert_eq!(fare.commission_amount, Decimal::new(40, 0));
        assert_eq!(fare.platform_fee_amount, Decimal::new(8, 0));
        // 18% de (8 + 40)
        assert_eq!(fare.gst_amount, Decimal::new(864, 2));
        assert_eq!(fare.payable_amount, Decimal::new(41664, 2));
    }

    #[test]
    fn test_refund_policy_tiers() {
        let policy: RefundPolicy = "6:50, 24:100, 0:0".parse().unwrap();
        assert_eq!(policy.tiers()[0].min_hours_before_departure, 24);
        let paid = Decimal::new(400, 0);
        assert_eq!(policy.refund_amount(paid, Duration::hours(30)), Decimal::new(400, 0));
        assert_eq!(policy.refund_amount(paid, Duration::hours(12)), Decimal::new(200, 0));
        assert_eq!(policy.refund_amount(paid, Duration::hours(1)), Decimal::ZERO);
        assert_eq!(policy.refund_amount(paid, Duration::hours(-1)), Decimal::ZERO);
    }

    #[test]
    fn test_refund_policy_rejects_bad_input() {
        assert!("24-100".parse::<RefundPolicy>().is_err());
        assert!("24:150".parse::<RefundPolicy>().is_err());
        assert!("9223372036854775807:100".parse::<RefundPolicy>().is_err());
        assert!("-1:100".parse::<RefundPolicy>().is_err());
    }
}
