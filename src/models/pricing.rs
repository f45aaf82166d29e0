//! Modelo de PricingConfig
//!
//! Configuración de tarifas única por despliegue. Cada viaje guarda una copia
//! (snapshot) tomada en el momento de su creación.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    pub commission_percent: Decimal,
    pub platform_fee_percent: Decimal,
    pub gst_percent: Decimal,
    pub min_commission_amount: Decimal,
    pub max_commission_amount: Decimal,
    pub commission_enabled: bool,
    pub night_fare_enabled: bool,
    pub night_fare_multiplier: Decimal,
    /// Hora local de inicio de la tarifa nocturna (inclusive)
    pub night_start_hour: u32,
    /// Hora local de fin de la tarifa nocturna (exclusiva); puede cruzar medianoche
    pub night_end_hour: u32,
    pub utc_offset_minutes: i32,
    pub updated_at: DateTime<Utc>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            commission_percent: Decimal::new(10, 0),
            platform_fee_percent: Decimal::new(2, 0),
            gst_percent: Decimal::new(18, 0),
            min_commission_amount: Decimal::new(10, 0),
            max_commission_amount: Decimal::new(500, 0),
            commission_enabled: true,
            night_fare_enabled: false,
            night_fare_multiplier: Decimal::new(125, 2),
            night_start_hour: 22,
            night_end_hour: 6,
            utc_offset_minutes: 330, // IST
            updated_at: Utc::now(),
        }
    }
}
