use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_base_url = require("BIZMAP_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZMAP_API_BASE_URL".to_string(),
            reason: "must be an http(s) URL".to_string(),
        });
    }

    let env = parse_environment(&or_default("BIZMAP_ENV", "development"))?;
    let log_level = or_default("BIZMAP_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("BIZMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("BIZMAP_USER_AGENT", "bizmap/0.1 (business-explorer)");
    let max_retries = parse_u32("BIZMAP_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("BIZMAP_RETRY_BACKOFF_BASE_MS", "500")?;

    let page_size = parse_usize("BIZMAP_PAGE_SIZE", "25")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZMAP_PAGE_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let session_path = PathBuf::from(or_default("BIZMAP_SESSION_PATH", "./.bizmap/session.json"));
    let default_city = lookup("BIZMAP_DEFAULT_CITY")
        .ok()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        page_size,
        session_path,
        default_city,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BIZMAP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
