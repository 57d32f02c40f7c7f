use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with both publishers fully configured.
fn publishing_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("GOOGLE_SHEET_ID", "sheet-123");
    m.insert("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.token");
    m.insert("SENDGRID_API_KEY", "SG.key");
    m.insert("FROM_EMAIL", "bot@example.com");
    m.insert("TO_EMAIL", "team@example.com");
    m
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.sources_path,
        std::path::PathBuf::from("./config/sources.yaml")
    );
    assert_eq!(cfg.sheets_api_base, "https://sheets.googleapis.com");
    assert_eq!(cfg.sendgrid_api_base, "https://api.sendgrid.com");
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "pricewatch/0.1 (listing-report)");
    assert_eq!(cfg.publish_max_retries, 3);
    assert_eq!(cfg.publish_backoff_base_ms, 1000);
    assert!(cfg.sheets_config().is_none());
    assert!(cfg.email_config().is_none());
}

#[test]
fn sheets_config_present_when_id_and_token_set() {
    let map = publishing_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let sheets = cfg.sheets_config().expect("sheets config");
    assert_eq!(sheets.sheet_id, "sheet-123");
    assert_eq!(
        sheets.sheet_url(),
        "https://docs.google.com/spreadsheets/d/sheet-123"
    );
}

#[test]
fn sheets_config_absent_without_token() {
    let mut map = publishing_env();
    map.remove("GOOGLE_SHEETS_ACCESS_TOKEN");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.sheets_config().is_none());
}

#[test]
fn email_config_absent_when_recipient_blank() {
    let mut map = publishing_env();
    map.insert("TO_EMAIL", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.email_config().is_none());
}

#[test]
fn email_config_present_when_all_set() {
    let map = publishing_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let email = cfg.email_config().expect("email config");
    assert_eq!(email.from_email, "bot@example.com");
    assert_eq!(email.to_email, "team@example.com");
}

#[test]
fn debug_output_redacts_secrets() {
    let map = publishing_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("ya29.token"));
    assert!(!rendered.contains("SG.key"));
    assert!(rendered.contains("[redacted]"));

    let sheets = format!("{:?}", cfg.sheets_config().unwrap());
    assert!(!sheets.contains("ya29.token"));
    let email = format!("{:?}", cfg.email_config().unwrap());
    assert!(!email.contains("SG.key"));
}

#[test]
fn http_timeout_override() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_HTTP_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.http_timeout_secs, 60);
}

#[test]
fn http_timeout_invalid() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_HTTP_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_HTTP_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PRICEWATCH_HTTP_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn publish_max_retries_invalid() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_PUBLISH_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEWATCH_PUBLISH_MAX_RETRIES"),
        "expected InvalidEnvVar(PRICEWATCH_PUBLISH_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn publish_backoff_override() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_PUBLISH_BACKOFF_BASE_MS", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.publish_backoff_base_ms, 250);
}

#[test]
fn sources_path_override() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_SOURCES_PATH", "/etc/pricewatch/sources.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.sources_path,
        std::path::PathBuf::from("/etc/pricewatch/sources.yaml")
    );
}

#[test]
fn log_level_defaults_to_info() {
    let map: HashMap<&str, &str> = HashMap::new();
    assert_eq!(resolve_log_level(lookup_from_map(&map)), "info");
}

#[test]
fn log_level_blank_falls_back_to_info() {
    let mut map = HashMap::new();
    map.insert("PRICEWATCH_LOG_LEVEL", "  ");
    assert_eq!(resolve_log_level(lookup_from_map(&map)), "info");
}

#[test]
fn log_level_resolves_when_rest_of_config_is_invalid() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_LOG_LEVEL", "pricewatch=debug");
    map.insert("PRICEWATCH_PUBLISH_BACKOFF_BASE_MS", "fast");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
    assert_eq!(resolve_log_level(lookup_from_map(&map)), "pricewatch=debug");
}

#[test]
fn unknown_variables_are_ignored() {
    let mut map = publishing_env();
    map.insert("PRICEWATCH_ENV", "staging");
    assert!(build_app_config(lookup_from_map(&map)).is_ok());
}
