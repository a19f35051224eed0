use chartboard_core::canvas::DEFAULT_CANVAS_SIZE;
use chartboard_core::dataset::NumericMode;
use chartboard_core::geometry::Size;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the data-modeling service.
    pub api_url: String,
    /// Optional bearer token forwarded on every request.
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Canvas size reported by the embedding page.
    pub canvas: Size,
    /// How numeric cells are parsed (default: precise).
    pub numeric_mode: NumericMode,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `DATA_MODEL_API_URL`   | required    |
    /// | `API_TOKEN`            | unset       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`        |
    /// | `CANVAS_WIDTH`         | `1200`      |
    /// | `CANVAS_HEIGHT`        | `800`       |
    /// | `NUMERIC_MODE`         | `precise`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("DATA_MODEL_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATA_MODEL_API_URL"))?;

        let api_token = lookup("API_TOKEN").filter(|v| !v.is_empty());

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let width = parse_or(&lookup, "CANVAS_WIDTH", DEFAULT_CANVAS_SIZE.width)?;
        let height = parse_or(&lookup, "CANVAS_HEIGHT", DEFAULT_CANVAS_SIZE.height)?;

        let numeric_mode = match lookup("NUMERIC_MODE") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                name: "NUMERIC_MODE",
                value,
                reason,
            })?,
            None => NumericMode::default(),
        };

        Ok(Self {
            api_url,
            api_token,
            request_timeout_secs,
            canvas: Size::new(width, height),
            numeric_mode,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
