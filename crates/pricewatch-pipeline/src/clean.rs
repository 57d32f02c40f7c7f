//! Price coercion: [`CanonicalRecord`] → [`CleanedRecord`].

use pricewatch_core::{CanonicalRecord, CleanedRecord};

use crate::error::{PriceParseFailure, RecordIssue};

/// Output of [`clean`]: records with a usable price plus one issue per drop.
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    pub records: Vec<CleanedRecord>,
    pub issues: Vec<RecordIssue>,
}

impl Cleaned {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.issues.len()
    }
}

/// Parses a scraped price string such as `"$1,299.00"` or `"  49.99 USD"`.
///
/// Every character other than an ASCII digit or `.` is discarded first, so
/// currency symbols, thousands separators, whitespace and signs never reach
/// the number parser. The result is always non-negative.
///
/// # Errors
///
/// Returns a [`PriceParseFailure`] when nothing numeric is left, when more than
/// one decimal point remains, or when the value does not fit a finite `f64`.
pub fn parse_price(raw: &str) -> Result<f64, PriceParseFailure> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if stripped.is_empty() {
        return Err(PriceParseFailure::Empty);
    }
    if stripped.matches('.').count() > 1 {
        return Err(PriceParseFailure::MultipleDecimalPoints);
    }

    let value = stripped
        .parse::<f64>()
        .map_err(|_| PriceParseFailure::Invalid)?;
    if !value.is_finite() {
        return Err(PriceParseFailure::NotFinite);
    }
    Ok(value)
}

/// Coerces the whole dataset in one pass. Records whose price does not parse
/// are excluded, never defaulted.
#[must_use]
pub fn clean(records: Vec<CanonicalRecord>) -> Cleaned {
    let mut out = Cleaned::default();

    for record in records {
        match parse_price(&record.price_raw) {
            Ok(price) => out.records.push(CleanedRecord::from_canonical(record, price)),
            Err(reason) => {
                let issue = RecordIssue::PriceParse {
                    source_id: record.source,
                    name: record.name,
                    price_raw: record.price_raw,
                    reason,
                };
                tracing::debug!(%issue, "dropping record");
                out.issues.push(issue);
            }
        }
    }

    if !out.issues.is_empty() {
        tracing::warn!(
            dropped = out.issues.len(),
            kept = out.records.len(),
            "dropped records with unparseable prices"
        );
    }

    out
}
