use crate::config::ConfigError;
use crate::estimation::interchange::InterchangeError;
use crate::estimation::pipeline::PipelineError;
use crate::estimation::scope::CatalogError;
use crate::estimation::settlement::RulesError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Catalog(CatalogError),
    Rules(RulesError),
    Pipeline(PipelineError),
    Interchange(InterchangeError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Json(err) => write!(f, "invalid request document: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Rules(err) => write!(f, "settlement rules error: {}", err),
            AppError::Pipeline(err) => write!(f, "estimate error: {}", err),
            AppError::Interchange(err) => write!(f, "export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Rules(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Interchange(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<RulesError> for AppError {
    fn from(value: RulesError) -> Self {
        Self::Rules(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<InterchangeError> for AppError {
    fn from(value: InterchangeError) -> Self {
        Self::Interchange(value)
    }
}
