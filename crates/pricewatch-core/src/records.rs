use serde::{Deserialize, Serialize};

/// Sentinel written into canonical fields the collector did not supply.
pub const MISSING: &str = "N/A";

/// One scalar field of a raw record, exactly as the collector emitted it.
///
/// Collectors write the page index as a JSON number and everything else as
/// strings; `null` marks a field the collector looked for but did not find.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl RawField {
    /// Text form of the field, or `None` for `null`.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawField::Int(n) => Some(n.to_string()),
            RawField::Float(n) => Some(n.to_string()),
            RawField::Text(s) => Some(s.clone()),
            RawField::Null => None,
        }
    }

    /// Interprets the field as a 1-based page index.
    ///
    /// Accepts integer numbers and integer-looking strings (surrounding
    /// whitespace allowed). Zero and negatives are rejected.
    #[must_use]
    pub fn as_page(&self) -> Option<u32> {
        match self {
            RawField::Int(n) => u32::try_from(*n).ok().filter(|p| *p > 0),
            RawField::Text(s) => s.trim().parse::<u32>().ok().filter(|p| *p > 0),
            RawField::Float(_) | RawField::Null => None,
        }
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_owned())
    }
}

/// An ordered, source-shaped field sequence. Field meaning is defined by the
/// source's [`crate::SourceLayout`], not by the record itself.
pub type RawRecord = Vec<RawField>;

/// A listing in the unified schema. Every field is populated; absent data is
/// [`MISSING`] (or the source's configured offer default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub source: String,
    pub page: u32,
    pub name: String,
    /// Price text as scraped, e.g. `"$1,299.00"`.
    pub price_raw: String,
    pub brand: String,
    pub url: String,
    pub offer: String,
}

/// A [`CanonicalRecord`] whose price parsed to a finite, non-negative number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub source: String,
    pub page: u32,
    pub name: String,
    pub price: f64,
    pub brand: String,
    pub url: String,
    pub offer: String,
}

impl CleanedRecord {
    /// Builds a cleaned record from its canonical form and the parsed price.
    #[must_use]
    pub fn from_canonical(record: CanonicalRecord, price: f64) -> Self {
        Self {
            source: record.source,
            page: record.page,
            name: record.name,
            price,
            brand: record.brand,
            url: record.url,
            offer: record.offer,
        }
    }

    /// Turns the record back into canonical form with `price_raw` set to the
    /// display form of the parsed price.
    #[must_use]
    pub fn to_canonical(&self) -> CanonicalRecord {
        CanonicalRecord {
            source: self.source.clone(),
            page: self.page,
            name: self.name.clone(),
            price_raw: self.price.to_string(),
            brand: self.brand.clone(),
            url: self.url.clone(),
            offer: self.offer.clone(),
        }
    }
}
