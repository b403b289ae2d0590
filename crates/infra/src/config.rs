//! Runtime configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use estore_checkout::CheckoutSettings;

pub const HOLD_WINDOW_VAR: &str = "ESTORE_HOLD_WINDOW_SECS";
pub const TOP_PRODUCTS_LEN_VAR: &str = "ESTORE_TOP_PRODUCTS_LEN";
pub const BIND_ADDR_VAR: &str = "ESTORE_BIND_ADDR";
pub const SESSION_IDLE_VAR: &str = "ESTORE_SESSION_IDLE_SECS";

const DEFAULT_HOLD_WINDOW_SECS: u64 = 600;
const DEFAULT_TOP_PRODUCTS_LEN: usize = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 1_800;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub hold_window: Duration,
    pub top_products_len: usize,
    pub bind_addr: SocketAddr,
    /// Settled sessions untouched this long are evicted.
    pub session_idle: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            hold_window: Duration::from_secs(DEFAULT_HOLD_WINDOW_SECS),
            top_products_len: DEFAULT_TOP_PRODUCTS_LEN,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

impl CheckoutConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let hold_secs = positive_secs(&lookup, HOLD_WINDOW_VAR, DEFAULT_HOLD_WINDOW_SECS)?;
        let idle_secs = positive_secs(&lookup, SESSION_IDLE_VAR, DEFAULT_SESSION_IDLE_SECS)?;
        let top_products_len = parse(&lookup, TOP_PRODUCTS_LEN_VAR, DEFAULT_TOP_PRODUCTS_LEN.to_string())?;
        let bind_addr = parse(&lookup, BIND_ADDR_VAR, DEFAULT_BIND_ADDR.to_string())?;

        Ok(Self {
            hold_window: Duration::from_secs(hold_secs),
            top_products_len,
            bind_addr,
            session_idle: Duration::from_secs(idle_secs),
        })
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            hold_window: self.hold_window,
            top_products_len: self.top_products_len,
        }
    }
}

fn positive_secs(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let secs: u64 = parse(lookup, key, default.to_string())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".into(),
            reason: "must be positive".into(),
        });
    }
    Ok(secs)
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup(key).unwrap_or(default);
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: err.to_string(),
    })
}
