//! Configuración de variables de entorno
//!
//! Lee el entorno una sola vez al arrancar. Los valores ausentes toman su
//! valor por defecto; los valores inválidos son un error de configuración.

use chrono::Duration;
use std::env;
use std::str::FromStr;

use crate::services::dispatch_coordinator::StrategyKind;
use crate::services::pricing_engine::RefundPolicy;
use crate::utils::errors::{AppError, AppResult};

/// Límites superiores de los intervalos configurables
const MAX_HOLD_TTL_MINUTES: i64 = 24 * 60;
const MAX_DISPATCH_LEAD_MINUTES: i64 = 7 * 24 * 60;
const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Sin URL se usa almacenamiento en memoria
    pub database_url: Option<String>,
    pub hold_ttl_minutes: i64,
    pub dispatch_lead_minutes: i64,
    pub sweep_interval_secs: u64,
    pub refund_policy: RefundPolicy,
    pub dispatch_strategy: StrategyKind,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            database_url: None,
            hold_ttl_minutes: 10,
            dispatch_lead_minutes: 60,
            sweep_interval_secs: 30,
            refund_policy: RefundPolicy::default(),
            dispatch_strategy: StrategyKind::Nearest,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Configuration(format!("{} has an invalid value '{}': {}", name, raw, e))),
        _ => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Construir la configuración desde el entorno
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            hold_ttl_minutes: parse_var("HOLD_TTL_MINUTES", defaults.hold_ttl_minutes)?,
            dispatch_lead_minutes: parse_var("DISPATCH_LEAD_MINUTES", defaults.dispatch_lead_minutes)?,
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            refund_policy: parse_var("REFUND_TIERS", defaults.refund_policy)?,
            dispatch_strategy: parse_var("DISPATCH_STRATEGY", defaults.dispatch_strategy)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if !(1..=MAX_HOLD_TTL_MINUTES).contains(&self.hold_ttl_minutes) {
            return Err(AppError::Configuration(format!(
                "HOLD_TTL_MINUTES must be between 1 and {}",
                MAX_HOLD_TTL_MINUTES
            )));
        }
        if !(0..=MAX_DISPATCH_LEAD_MINUTES).contains(&self.dispatch_lead_minutes) {
            return Err(AppError::Configuration(format!(
                "DISPATCH_LEAD_MINUTES must be between 0 and {}",
                MAX_DISPATCH_LEAD_MINUTES
            )));
        }
        if !(1..=MAX_SWEEP_INTERVAL_SECS).contains(&self.sweep_interval_secs) {
            return Err(AppError::Configuration(format!(
                "SWEEP_INTERVAL_SECS must be between 1 and {}",
                MAX_SWEEP_INTERVAL_SECS
            )));
        }
        Ok(())
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn hold_ttl(&self) -> Duration {
        Duration::minutes(self.hold_ttl_minutes)
    }

    pub fn dispatch_lead(&self) -> Duration {
        Duration::minutes(self.dispatch_lead_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EnvironmentConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_development());
        assert_eq!(config.hold_ttl(), Duration::minutes(10));
        assert_eq!(config.server_url(), "0.0.0.0:3000");
    }

    #[test]
    fn test_rejects_zero_sweep_interval() {
        let config = EnvironmentConfig { sweep_interval_secs: 0, ..EnvironmentConfig::default() };
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_rejects_out_of_range_durations() {
        let hold = EnvironmentConfig { hold_ttl_minutes: i64::MAX, ..EnvironmentConfig::default() };
        assert!(matches!(hold.validate(), Err(AppError::Configuration(_))));

        let lead = EnvironmentConfig { dispatch_lead_minutes: MAX_DISPATCH_LEAD_MINUTES + 1, ..EnvironmentConfig::default() };
        assert!(matches!(lead.validate(), Err(AppError::Configuration(_))));

        let week = EnvironmentConfig { dispatch_lead_minutes: MAX_DISPATCH_LEAD_MINUTES, ..EnvironmentConfig::default() };
        assert!(week.validate().is_ok());
        assert_eq!(week.dispatch_lead(), Duration::days(7));
    }
}
