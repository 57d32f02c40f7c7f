use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub sources_path: PathBuf,
    pub google_sheet_id: Option<String>,
    pub google_sheets_access_token: Option<String>,
    pub sheets_api_base: String,
    pub sendgrid_api_key: Option<String>,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub sendgrid_api_base: String,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub publish_max_retries: u32,
    pub publish_backoff_base_ms: u64,
}

/// Everything the spreadsheet publisher needs, resolved up front.
#[derive(Clone)]
pub struct SheetsConfig {
    pub sheet_id: String,
    pub access_token: String,
    pub api_base: String,
}

impl SheetsConfig {
    /// Browser link to the spreadsheet, as shared in notifications.
    #[must_use]
    pub fn sheet_url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", self.sheet_id)
    }
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("sheet_id", &self.sheet_id)
            .field("access_token", &"[redacted]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Everything the email publisher needs, resolved up front.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from_email: String,
    pub to_email: String,
    pub api_base: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[redacted]")
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AppConfig {
    /// Spreadsheet settings, or `None` if the sheet id or token is unset.
    #[must_use]
    pub fn sheets_config(&self) -> Option<SheetsConfig> {
        Some(SheetsConfig {
            sheet_id: self.google_sheet_id.clone()?,
            access_token: self.google_sheets_access_token.clone()?,
            api_base: self.sheets_api_base.clone(),
        })
    }

    /// Email settings, or `None` if any of key, sender or recipient is unset.
    #[must_use]
    pub fn email_config(&self) -> Option<EmailConfig> {
        Some(EmailConfig {
            api_key: self.sendgrid_api_key.clone()?,
            from_email: self.from_email.clone()?,
            to_email: self.to_email.clone()?,
            api_base: self.sendgrid_api_base.clone(),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("sources_path", &self.sources_path)
            .field("google_sheet_id", &self.google_sheet_id)
            .field(
                "google_sheets_access_token",
                &self.google_sheets_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("sheets_api_base", &self.sheets_api_base)
            .field(
                "sendgrid_api_key",
                &self.sendgrid_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("sendgrid_api_base", &self.sendgrid_api_base)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("publish_max_retries", &self.publish_max_retries)
            .field("publish_backoff_base_ms", &self.publish_backoff_base_ms)
            .finish()
    }
}
