//! Application configuration loaded from environment variables.

use std::str::FromStr;

use domain::{Money, PricingPolicy};
use domain::pricing::{
    DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_SHIPPING_FEE_CENTS, DEFAULT_TAX_RATE_PERCENT,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// How the simulated payment gateway answers charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentSimulation {
    #[default]
    Approve,
    Decline,
}

impl FromStr for PaymentSimulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(PaymentSimulation::Approve),
            "decline" => Ok(PaymentSimulation::Decline),
            other => Err(format!("unknown payment simulation: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` bind address (default: `"0.0.0.0"`)
/// - `PORT` listen port (default: `3000`)
/// - `RUST_LOG` tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL` Postgres URL; unset means the in-memory store
/// - `DATABASE_MAX_CONNECTIONS` pool size (default: `5`)
/// - `LOW_STOCK_THRESHOLD` (default: `5`)
/// - `TAX_RATE_PERCENT` (default: `10`)
/// - `SHIPPING_FEE_CENTS` (default: `2000`)
/// - `EVENT_CHANNEL_CAPACITY` live event buffer (default: `1024`)
/// - `PAYMENT_SIMULATION` `approve` or `decline` (default: `approve`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub low_stock_threshold: u32,
    pub tax_rate_percent: u32,
    pub shipping_fee_cents: i64,
    pub event_channel_capacity: usize,
    pub payment_simulation: PaymentSimulation,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            low_stock_threshold: parse_or(
                &lookup,
                "LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            ),
            tax_rate_percent: parse_or(&lookup, "TAX_RATE_PERCENT", defaults.tax_rate_percent),
            shipping_fee_cents: parse_or(
                &lookup,
                "SHIPPING_FEE_CENTS",
                defaults.shipping_fee_cents,
            ),
            event_channel_capacity: parse_or(
                &lookup,
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            ),
            payment_simulation: parse_or(
                &lookup,
                "PAYMENT_SIMULATION",
                defaults.payment_simulation,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the pricing rules configured for checkout.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate_percent: self.tax_rate_percent,
            shipping_fee: Money::from_cents(self.shipping_fee_cents),
            low_stock_threshold: self.low_stock_threshold,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            shipping_fee_cents: DEFAULT_SHIPPING_FEE_CENTS,
            event_channel_capacity: checkout::DEFAULT_CHANNEL_CAPACITY,
            payment_simulation: PaymentSimulation::Approve,
        }
    }
}
