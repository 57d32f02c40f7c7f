//! Google Sheets v4 client that replaces the contents of one worksheet per
//! published table.
//!
//! Every upload is a full overwrite: the target range is cleared, then the
//! header row and all data rows are written from `A1`. Worksheets that do not
//! exist yet are created first.

use std::collections::HashSet;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pricewatch_core::SheetsConfig;
use pricewatch_pipeline::Table;
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::retry::retry_with_backoff;

/// Grid size for newly created worksheets.
pub const NEW_SHEET_ROWS: u32 = 1000;
pub const NEW_SHEET_COLUMNS: u32 = 20;

/// Characters escaped inside a single path segment (sheet id or A1 range).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<Vec<serde_json::Value>>,
}

/// Rows written to one worksheet by [`SheetsClient::upload_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedSheet {
    pub name: String,
    /// Data rows, not counting the header.
    pub rows: usize,
}

/// Client for one spreadsheet.
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    sheet_id: String,
    access_token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl SheetsClient {
    /// Creates a client for the spreadsheet in `config`.
    ///
    /// The API base comes from [`SheetsConfig::api_base`], so tests can point
    /// it at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PublishError::InvalidBaseUrl`] if the API base does not parse.
    pub fn new(
        config: &SheetsConfig,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", config.api_base.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PublishError::InvalidBaseUrl {
            base: config.api_base.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            sheet_id: config.sheet_id.clone(),
            access_token: config.access_token.clone(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Uploads every table to the worksheet of the same name.
    ///
    /// # Errors
    ///
    /// Returns the first [`PublishError`] that survives retrying. Worksheets
    /// uploaded before the failure keep their new contents.
    pub async fn upload_report(&self, tables: &[Table]) -> Result<Vec<UploadedSheet>, PublishError> {
        let existing: HashSet<String> = self.worksheet_titles().await?.into_iter().collect();

        let missing: Vec<&str> = tables
            .iter()
            .map(|t| t.name)
            .filter(|name| !existing.contains(*name))
            .collect();
        if !missing.is_empty() {
            self.add_worksheets(&missing).await?;
        }

        let mut uploaded = Vec::with_capacity(tables.len());
        for table in tables {
            self.replace_contents(table).await?;
            tracing::info!(sheet = table.name, rows = table.rows.len(), "worksheet updated");
            uploaded.push(UploadedSheet {
                name: table.name.to_string(),
                rows: table.rows.len(),
            });
        }
        Ok(uploaded)
    }

    /// Titles of all worksheets currently in the spreadsheet.
    ///
    /// # Errors
    ///
    /// - [`PublishError::UnexpectedStatus`] on a non-2xx response.
    /// - [`PublishError::Deserialize`] if the body is not spreadsheet metadata.
    pub async fn worksheet_titles(&self) -> Result<Vec<String>, PublishError> {
        let mut url = self.spreadsheet_url("")?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let body = self.send(Method::GET, &url, None).await?;
        let meta: SpreadsheetMeta =
            serde_json::from_str(&body).map_err(|e| PublishError::Deserialize {
                context: format!("spreadsheet metadata ({})", self.sheet_id),
                source: e,
            })?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Creates one worksheet per title in a single batch update.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::UnexpectedStatus`] on a non-2xx response.
    pub async fn add_worksheets(&self, titles: &[&str]) -> Result<(), PublishError> {
        let requests: Vec<serde_json::Value> = titles
            .iter()
            .map(|title| {
                serde_json::json!({
                    "addSheet": {
                        "properties": {
                            "title": title,
                            "gridProperties": {
                                "rowCount": NEW_SHEET_ROWS,
                                "columnCount": NEW_SHEET_COLUMNS,
                            }
                        }
                    }
                })
            })
            .collect();
        let body = serde_json::json!({ "requests": requests });

        let url = self.spreadsheet_url(":batchUpdate")?;
        self.send(Method::POST, &url, Some(&body)).await?;
        tracing::info!(sheets = ?titles, "created missing worksheets");
        Ok(())
    }

    /// Clears the worksheet, then writes the header and rows from `A1`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::UnexpectedStatus`] on a non-2xx response.
    pub async fn replace_contents(&self, table: &Table) -> Result<(), PublishError> {
        let range = sheet_range(table.name);

        let clear_url = self.values_url(&range, ":clear")?;
        self.send(Method::POST, &clear_url, Some(&serde_json::json!({})))
            .await?;

        let mut update_url = self.values_url(&range, "")?;
        update_url
            .query_pairs_mut()
            .append_pair("valueInputOption", "RAW");
        let payload = ValueRange {
            range: &range,
            major_dimension: "ROWS",
            values: table.to_values(),
        };
        let body = serde_json::to_value(&payload).map_err(|e| PublishError::Deserialize {
            context: format!("values for {}", table.name),
            source: e,
        })?;
        self.send(Method::PUT, &update_url, Some(&body)).await?;
        Ok(())
    }

    fn spreadsheet_url(&self, suffix: &str) -> Result<Url, PublishError> {
        self.join(&format!(
            "v4/spreadsheets/{}{suffix}",
            utf8_percent_encode(&self.sheet_id, SEGMENT)
        ))
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, PublishError> {
        self.join(&format!(
            "v4/spreadsheets/{}/values/{}{suffix}",
            utf8_percent_encode(&self.sheet_id, SEGMENT),
            utf8_percent_encode(range, SEGMENT)
        ))
    }

    fn join(&self, path: &str) -> Result<Url, PublishError> {
        self.base_url
            .join(path)
            .map_err(|e| PublishError::InvalidBaseUrl {
                base: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends one authorised request with retry, returning the body of a 2xx
    /// response.
    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<String, PublishError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&self.access_token);
            if let Some(json) = body {
                request = request.json(json);
            }
            async move {
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                if !status.is_success() {
                    return Err(PublishError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                        body: text,
                    });
                }
                Ok(text)
            }
        })
        .await
    }
}

/// A1 range for the top-left cell of a worksheet, quoted so titles with spaces
/// resolve.
fn sheet_range(title: &str) -> String {
    format!("'{}'!A1", title.replace('\'', "''"))
}
