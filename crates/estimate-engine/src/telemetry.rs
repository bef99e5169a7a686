use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Full filter override, read before `APP_LOG_LEVEL`.
pub const FILTER_ENV: &str = "ESTIMATE_LOG";

/// Targets that follow the configured level; everything else stays at `warn`.
const ENGINE_TARGETS: [&str; 2] = ["estimate_engine", "inspection_estimator"];

#[derive(Debug)]
pub enum TelemetryError {
    InvalidLogLevel { level: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidLogLevel { level, .. } => {
                write!(f, "APP_LOG_LEVEL '{}' is not a usable log level", level)
            }
            TelemetryError::Subscriber(err) => write!(f, "unable to install subscriber: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidLogLevel { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Install the global fmt subscriber on stderr, leaving stdout to command output.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_env(FILTER_ENV) {
        Ok(filter) => filter,
        Err(_) => log_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// A bare level scopes to the engine targets; anything with directives is used as given.
fn log_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives(level)).map_err(|source| TelemetryError::InvalidLogLevel {
        level: level.to_string(),
        source,
    })
}

fn directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        ENGINE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}
