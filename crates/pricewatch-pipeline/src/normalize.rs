//! Raw, source-shaped records to [`CanonicalRecord`]s.
//!
//! One routine serves every retailer; the per-source differences live in the
//! [`SourceLayout`] loaded from `config/sources.yaml`.

use pricewatch_core::{CanonicalRecord, Field, RawField, RawRecord, SourceLayout, MISSING};

use crate::error::RecordIssue;

/// Output of [`normalize`]: the records that fit the layout plus one issue
/// per dropped record.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<CanonicalRecord>,
    pub issues: Vec<RecordIssue>,
}

impl Normalized {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.issues.len()
    }
}

/// Maps every raw record of one source into the canonical schema.
///
/// Records too short for a required field, or with a page that is not a
/// positive integer, are dropped and reported in [`Normalized::issues`].
/// Optional fields that are unmapped, out of range, or `null` become
/// [`MISSING`] (`offer` uses the layout's `offer_default`).
#[must_use]
pub fn normalize(layout: &SourceLayout, raw_records: &[RawRecord]) -> Normalized {
    let mut out = Normalized::default();
    if raw_records.is_empty() {
        return out;
    }

    let min_arity = layout.min_arity();

    for (index, raw) in raw_records.iter().enumerate() {
        match normalize_record(layout, min_arity, index, raw) {
            Ok(record) => out.records.push(record),
            Err(issue) => {
                tracing::debug!(source = %layout.id, %issue, "dropping raw record");
                out.issues.push(issue);
            }
        }
    }

    if !out.issues.is_empty() {
        tracing::warn!(
            source = %layout.id,
            dropped = out.issues.len(),
            kept = out.records.len(),
            "dropped malformed raw records"
        );
    }

    out
}

fn normalize_record(
    layout: &SourceLayout,
    min_arity: usize,
    index: usize,
    raw: &RawRecord,
) -> Result<CanonicalRecord, RecordIssue> {
    if raw.len() < min_arity {
        return Err(RecordIssue::RecordShape {
            source_id: layout.id.clone(),
            index,
            len: raw.len(),
            min_arity,
        });
    }

    let page_field = &raw[layout.fields.page];
    let page = page_field.as_page().ok_or_else(|| RecordIssue::InvalidPage {
        source_id: layout.id.clone(),
        index,
        value: page_field.as_text().unwrap_or_else(|| "null".to_string()),
    })?;

    let text = |field: Field, default: &str| -> String {
        layout
            .fields
            .position(field)
            .and_then(|p| raw.get(p))
            .and_then(RawField::as_text)
            .unwrap_or_else(|| default.to_string())
    };

    Ok(CanonicalRecord {
        source: layout.id.clone(),
        page,
        name: text(Field::Name, MISSING),
        price_raw: text(Field::Price, MISSING),
        brand: text(Field::Brand, MISSING),
        url: text(Field::Url, MISSING),
        offer: text(Field::Offer, layout.offer_default()),
    })
}
