//! The `run` command: read a collected batch, run the pipeline, publish.
//!
//! Upload failures abort the run. Notification failures are logged and
//! swallowed so a mail outage never masks a successful upload.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use pricewatch_core::{AppConfig, CleanedRecord};
use pricewatch_pipeline::{run_pipeline, PipelineReport, RawBatch};
use pricewatch_publish::{
    failure_message, success_message, EmailClient, EmailMessage, SheetsClient,
};
use serde::Serialize;
use uuid::Uuid;

/// Rows of the unified table logged after each run.
const PREVIEW_ROWS: usize = 3;

#[derive(Debug)]
pub(crate) struct RunOptions {
    pub(crate) input: PathBuf,
    pub(crate) output: Option<PathBuf>,
    pub(crate) dry_run: bool,
}

/// What `--output` writes.
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    run_id: Uuid,
    completed_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a PipelineReport,
}

pub(crate) async fn run(config: &AppConfig, options: &RunOptions) -> anyhow::Result<()> {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, input = %options.input.display(), dry_run = options.dry_run, "starting run");

    let result = execute(config, options, run_id).await;

    if let Err(e) = &result {
        tracing::error!(%run_id, error = %format!("{e:#}"), "run failed");
        if !options.dry_run {
            notify(config, &failure_message(&format!("{e:#}"))).await;
        }
    }

    println!("run {run_id} finished at {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
    result
}

async fn execute(config: &AppConfig, options: &RunOptions, run_id: Uuid) -> anyhow::Result<()> {
    let sources = pricewatch_core::load_sources(&config.sources_path).with_context(|| {
        format!(
            "failed to load source layouts from {}",
            config.sources_path.display()
        )
    })?;
    let batch = read_batch(&options.input)?;

    let report = run_pipeline(&sources, &batch)?;
    log_preview(&report.cleaned);
    for source in &report.summary.sources {
        tracing::info!(
            source = %source.source,
            raw = source.raw,
            normalized = source.normalized,
            cleaned = source.cleaned,
            "source totals"
        );
    }

    if let Some(path) = &options.output {
        write_report(path, run_id, Utc::now(), &report)?;
        tracing::info!(path = %path.display(), "report written");
    }

    if options.dry_run {
        println!(
            "dry-run: {} products across {} sources; skipping upload and notification",
            report.summary.total_cleaned(),
            report.summary.sources.len()
        );
        return Ok(());
    }

    let sheet_url = publish_sheets(config, &report).await?;
    notify(
        config,
        &success_message(&report.summary, sheet_url.as_deref()),
    )
    .await;

    println!(
        "run {run_id}: {} products published",
        report.summary.total_cleaned()
    );
    Ok(())
}

/// Reads a batch file: a JSON object mapping source id to a list of raw
/// records.
pub(crate) fn read_batch(path: &Path) -> anyhow::Result<RawBatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input batch {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("input batch {} is not a valid raw batch", path.display()))
}

fn write_report(
    path: &Path,
    run_id: Uuid,
    completed_at: DateTime<Utc>,
    report: &PipelineReport,
) -> anyhow::Result<()> {
    let file = ReportFile {
        run_id,
        completed_at,
        report,
    };
    let json = serde_json::to_string_pretty(&file).context("failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))
}

fn log_preview(records: &[CleanedRecord]) {
    for record in records.iter().take(PREVIEW_ROWS) {
        tracing::info!(
            source = %record.source,
            page = record.page,
            name = %record.name,
            price = record.price,
            brand = %record.brand,
            "preview"
        );
    }
}

/// Uploads all tables, returning the sheet link, or `None` when the
/// spreadsheet is not configured.
async fn publish_sheets(
    config: &AppConfig,
    report: &PipelineReport,
) -> anyhow::Result<Option<String>> {
    let Some(sheets) = config.sheets_config() else {
        tracing::warn!("GOOGLE_SHEET_ID or GOOGLE_SHEETS_ACCESS_TOKEN not set; skipping upload");
        return Ok(None);
    };

    let client = SheetsClient::new(
        &sheets,
        config.http_timeout_secs,
        &config.user_agent,
        config.publish_max_retries,
        config.publish_backoff_base_ms,
    )
    .context("failed to build Sheets client")?;

    let uploaded = client
        .upload_report(&report.tables())
        .await
        .context("failed to upload to Google Sheets")?;
    tracing::info!(sheets = uploaded.len(), "upload complete");

    Ok(Some(sheets.sheet_url()))
}

/// Sends a notification if email is configured. Failures are logged only.
async fn notify(config: &AppConfig, message: &EmailMessage) {
    let Some(email) = config.email_config() else {
        tracing::warn!(subject = %message.subject, "email not configured; skipping notification");
        return;
    };

    let client = match EmailClient::new(
        &email,
        config.http_timeout_secs,
        &config.user_agent,
        config.publish_max_retries,
        config.publish_backoff_base_ms,
    ) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build email client; skipping notification");
            return;
        }
    };

    if let Err(e) = client.send(message).await {
        tracing::warn!(error = %e, subject = %message.subject, "email sending failed");
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
