use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Log filter directive from `PRICEWATCH_LOG_LEVEL`, defaulting to `info`.
///
/// Read on its own so logging can be set up before the rest of the config is
/// validated.
#[must_use]
pub fn log_level_from_env() -> String {
    resolve_log_level(|key| std::env::var(key))
}

fn resolve_log_level<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("PRICEWATCH_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so an empty line in `.env` does not
    // half-configure a publisher.
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
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

    let sources_path = PathBuf::from(or_default(
        "PRICEWATCH_SOURCES_PATH",
        "./config/sources.yaml",
    ));

    let google_sheet_id = optional("GOOGLE_SHEET_ID");
    let google_sheets_access_token = optional("GOOGLE_SHEETS_ACCESS_TOKEN");
    let sheets_api_base = or_default("PRICEWATCH_SHEETS_API_BASE", "https://sheets.googleapis.com");

    let sendgrid_api_key = optional("SENDGRID_API_KEY");
    let from_email = optional("FROM_EMAIL");
    let to_email = optional("TO_EMAIL");
    let sendgrid_api_base = or_default("PRICEWATCH_SENDGRID_API_BASE", "https://api.sendgrid.com");

    let http_timeout_secs = parse_u64("PRICEWATCH_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PRICEWATCH_USER_AGENT", "pricewatch/0.1 (listing-report)");
    let publish_max_retries = parse_u32("PRICEWATCH_PUBLISH_MAX_RETRIES", "3")?;
    let publish_backoff_base_ms = parse_u64("PRICEWATCH_PUBLISH_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        sources_path,
        google_sheet_id,
        google_sheets_access_token,
        sheets_api_base,
        sendgrid_api_key,
        from_email,
        to_email,
        sendgrid_api_base,
        http_timeout_secs,
        user_agent,
        publish_max_retries,
        publish_backoff_base_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
