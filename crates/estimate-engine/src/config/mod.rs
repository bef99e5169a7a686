use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the estimator.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let region_id = env::var("APP_REGION_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "DEFAULT".to_string());

        let raw_rate = env::var("APP_FALLBACK_TAX_RATE").unwrap_or_else(|_| "0".to_string());
        let fallback_tax_rate = raw_rate
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidTaxRate(raw_rate.clone()))?;
        if !(0.0..=100.0).contains(&fallback_tax_rate) {
            return Err(ConfigError::InvalidTaxRate(raw_rate));
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            pricing: PricingConfig {
                region_id,
                fallback_tax_rate,
                catalog_path: path_var("APP_CATALOG_PATH"),
                price_list_path: path_var("APP_PRICE_LIST_PATH"),
            },
        })
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Regional pricing inputs and the catalog files the CLI loads.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub region_id: String,
    pub fallback_tax_rate: f64,
    pub catalog_path: Option<PathBuf>,
    pub price_list_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTaxRate(String),
    MissingCatalog,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTaxRate(value) => write!(
                f,
                "APP_FALLBACK_TAX_RATE must be a percentage between 0 and 100 (found '{}')",
                value
            ),
            ConfigError::MissingCatalog => write!(
                f,
                "APP_CATALOG_PATH and APP_PRICE_LIST_PATH must be set to price an inspection"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
