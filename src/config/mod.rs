use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::ledger::RetryPolicy;

// Container for all runtime settings, filled from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Bounded retry for transient store faults, applied at the ledger boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

// Background stuck-seat sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "showseat=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            ledger: LedgerConfig {
                retry_attempts: env::var("LEDGER_RETRY_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("LEDGER_RETRY_ATTEMPTS must be a valid number"),
                retry_backoff_ms: env::var("LEDGER_RETRY_BACKOFF_MS")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("LEDGER_RETRY_BACKOFF_MS must be a valid number"),
            },
            reconcile: ReconcileConfig {
                sweep_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("RECONCILE_INTERVAL_SECS must be a valid number"),
            },
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.ledger.retry_attempts,
            backoff: Duration::from_millis(self.ledger.retry_backoff_ms),
        }
    }
}
