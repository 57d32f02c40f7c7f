//! End-to-end batch run: raw records → normalized → cleaned → aggregates.

use std::collections::BTreeMap;

use pricewatch_core::{CanonicalRecord, CleanedRecord, RawRecord, SourcesFile};
use serde::Serialize;

use crate::aggregate::{aggregate, Aggregates};
use crate::clean::clean;
use crate::error::{PipelineError, RecordIssue};
use crate::normalize::normalize;
use crate::report::{build_tables, DropCounts, RunSummary, SourceCounts, Table};

/// Raw records keyed by source id, as delivered by the collection stage.
/// A missing key means the same as an empty list.
pub type RawBatch = BTreeMap<String, Vec<RawRecord>>;

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// The unified, cleaned table.
    pub cleaned: Vec<CleanedRecord>,
    pub aggregates: Aggregates,
    pub summary: RunSummary,
    /// Every dropped record with the reason it was dropped.
    #[serde(skip)]
    pub issues: Vec<RecordIssue>,
}

impl PipelineReport {
    /// The five publishable tables.
    #[must_use]
    pub fn tables(&self) -> Vec<Table> {
        build_tables(&self.cleaned, &self.aggregates)
    }
}

/// Runs the full pipeline over one batch.
///
/// Sources are processed in configured order. A source with no raw records is
/// skipped without error; only a batch where every source is empty fails.
///
/// # Errors
///
/// - [`PipelineError::UnknownSource`] if the batch contains a source id that
///   has no layout.
/// - [`PipelineError::EmptyBatch`] if no configured source produced any raw
///   record.
pub fn run_pipeline(sources: &SourcesFile, batch: &RawBatch) -> Result<PipelineReport, PipelineError> {
    if let Some(unknown) = batch.keys().find(|id| sources.layout(id).is_none()) {
        return Err(PipelineError::UnknownSource(unknown.clone()));
    }

    let source_ids = sources.source_ids();
    let raw_total: usize = batch.values().map(Vec::len).sum();
    if raw_total == 0 {
        return Err(PipelineError::EmptyBatch {
            sources: source_ids.len(),
        });
    }

    let mut canonical: Vec<CanonicalRecord> = Vec::with_capacity(raw_total);
    let mut issues: Vec<RecordIssue> = Vec::new();
    let mut counts: Vec<SourceCounts> = Vec::with_capacity(source_ids.len());

    for layout in &sources.sources {
        let raw = batch.get(&layout.id).map_or(&[][..], Vec::as_slice);
        let mut source_counts = SourceCounts {
            source: layout.id.clone(),
            raw: raw.len(),
            ..SourceCounts::default()
        };

        if raw.is_empty() {
            tracing::info!(source = %layout.id, "no raw records for source; skipping");
            counts.push(source_counts);
            continue;
        }

        let normalized = normalize(layout, raw);
        source_counts.normalized = normalized.records.len();
        counts.push(source_counts);
        canonical.extend(normalized.records);
        issues.extend(normalized.issues);
    }

    let malformed_records = issues.len();
    let cleaned = clean(canonical);
    let unparseable_prices = cleaned.dropped();
    issues.extend(cleaned.issues);

    for c in &mut counts {
        c.cleaned = cleaned.records.iter().filter(|r| r.source == c.source).count();
    }

    let aggregates = aggregate(&source_ids, &cleaned.records);

    let summary = RunSummary {
        sources: counts,
        dropped: DropCounts {
            malformed_records,
            unparseable_prices,
        },
    };

    tracing::info!(
        raw = summary.total_raw(),
        cleaned = summary.total_cleaned(),
        malformed_records,
        unparseable_prices,
        "pipeline run complete"
    );

    Ok(PipelineReport {
        cleaned: cleaned.records,
        aggregates,
        summary,
        issues,
    })
}
