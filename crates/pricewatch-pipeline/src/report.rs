//! Named, fixed-schema tables handed to publishers, and the run summary used
//! for notifications.

use pricewatch_core::CleanedRecord;
use serde::Serialize;

use crate::aggregate::{Aggregates, BrandCount, BrandStat};

pub const RAW_DATA_SHEET: &str = "Raw Data";
pub const STATS_SHEET: &str = "Stats";
pub const TOP_BRANDS_SHEET: &str = "Top Brands";
pub const TOP_EXPENSIVE_SHEET: &str = "Top Expensive";
pub const BEST_DEALS_SHEET: &str = "Best Deals";

pub const LISTING_COLUMNS: &[&str] = &[
    "Source",
    "Page",
    "Name",
    "Price",
    "Brand",
    "URL",
    "Offer/Savings",
];

pub const STATS_COLUMNS: &[&str] = &[
    "Brand",
    "Average_Price",
    "Min_Price",
    "Max_Price",
    "Product_Count",
    "Source",
];

pub const TOP_BRANDS_COLUMNS: &[&str] = &["Brand", "Product_Count"];

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Count(u64),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Count(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Count(u64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// A result set with a fixed column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Header row followed by data rows, as JSON values.
    #[must_use]
    pub fn to_values(&self) -> Vec<Vec<serde_json::Value>> {
        let header = self
            .columns
            .iter()
            .map(|c| serde_json::Value::String((*c).to_string()))
            .collect();
        std::iter::once(header)
            .chain(self.rows.iter().map(|row| {
                row.iter()
                    .map(|cell| serde_json::to_value(cell).unwrap_or(serde_json::Value::Null))
                    .collect()
            }))
            .collect()
    }
}

fn listing_row(r: &CleanedRecord) -> Vec<Cell> {
    vec![
        r.source.as_str().into(),
        r.page.into(),
        r.name.as_str().into(),
        r.price.into(),
        r.brand.as_str().into(),
        r.url.as_str().into(),
        r.offer.as_str().into(),
    ]
}

fn stat_row(s: &BrandStat) -> Vec<Cell> {
    vec![
        s.brand.as_str().into(),
        s.average_price.into(),
        s.min_price.into(),
        s.max_price.into(),
        s.count.into(),
        s.source.as_str().into(),
    ]
}

fn brand_count_row(b: &BrandCount) -> Vec<Cell> {
    vec![b.brand.as_str().into(), b.count.into()]
}

#[must_use]
pub fn listings_table(name: &'static str, records: &[CleanedRecord]) -> Table {
    Table {
        name,
        columns: LISTING_COLUMNS,
        rows: records.iter().map(listing_row).collect(),
    }
}

#[must_use]
pub fn stats_table<'a>(name: &'static str, stats: impl Iterator<Item = &'a BrandStat>) -> Table {
    Table {
        name,
        columns: STATS_COLUMNS,
        rows: stats.map(stat_row).collect(),
    }
}

/// The five published tables, in upload order.
#[must_use]
pub fn build_tables(cleaned: &[CleanedRecord], aggregates: &Aggregates) -> Vec<Table> {
    vec![
        listings_table(RAW_DATA_SHEET, cleaned),
        stats_table(STATS_SHEET, aggregates.all_stats()),
        Table {
            name: TOP_BRANDS_SHEET,
            columns: TOP_BRANDS_COLUMNS,
            rows: aggregates.top_brands.iter().map(brand_count_row).collect(),
        },
        listings_table(TOP_EXPENSIVE_SHEET, &aggregates.top_expensive),
        stats_table(BEST_DEALS_SHEET, aggregates.best_deals.iter()),
    ]
}

/// Record counts for one source at each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub source: String,
    pub raw: usize,
    pub normalized: usize,
    pub cleaned: usize,
}

/// Records dropped at each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub malformed_records: usize,
    pub unparseable_prices: usize,
}

impl DropCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.malformed_records + self.unparseable_prices
    }
}

/// Counts handed to the notification publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceCounts>,
    pub dropped: DropCounts,
}

impl RunSummary {
    #[must_use]
    pub fn total_raw(&self) -> usize {
        self.sources.iter().map(|s| s.raw).sum()
    }

    #[must_use]
    pub fn total_cleaned(&self) -> usize {
        self.sources.iter().map(|s| s.cleaned).sum()
    }
}
