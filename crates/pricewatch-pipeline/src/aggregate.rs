//! Derived views over the cleaned dataset.
//!
//! Every view is computed independently from the same immutable input and
//! every one is total: an empty dataset yields empty views.

use std::collections::{BTreeMap, HashMap};

use pricewatch_core::CleanedRecord;
use serde::Serialize;

/// Row limit for every ranked view.
pub const TOP_N: usize = 10;

/// Price statistics for one (source, brand) group, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandStat {
    pub source: String,
    pub brand: String,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub count: usize,
}

/// All brand stats of one source, brands in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBrandStats {
    pub source: String,
    pub stats: Vec<BrandStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    /// One entry per configured source, in configured order, even when the
    /// source has no cleaned records.
    pub per_source_brand_stats: Vec<SourceBrandStats>,
    pub top_brands: Vec<BrandCount>,
    pub top_expensive: Vec<CleanedRecord>,
    pub best_deals: Vec<BrandStat>,
}

impl Aggregates {
    /// Every per-source stats row, concatenated in source order.
    pub fn all_stats(&self) -> impl Iterator<Item = &BrandStat> {
        self.per_source_brand_stats.iter().flat_map(|s| s.stats.iter())
    }
}

/// Computes every derived view.
///
/// `source_ids` fixes both which sources get a stats entry and the order that
/// breaks ties in [`best_deals`].
#[must_use]
pub fn aggregate(source_ids: &[&str], records: &[CleanedRecord]) -> Aggregates {
    let per_source_brand_stats: Vec<SourceBrandStats> = source_ids
        .iter()
        .map(|source| SourceBrandStats {
            source: (*source).to_string(),
            stats: brand_stats_for_source(source, records),
        })
        .collect();

    let best_deals = best_deals(&per_source_brand_stats, TOP_N);

    Aggregates {
        top_brands: top_brands(records, TOP_N),
        top_expensive: top_expensive(records, TOP_N),
        best_deals,
        per_source_brand_stats,
    }
}

#[derive(Default)]
struct PriceAccumulator {
    mean: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl PriceAccumulator {
    fn add(&mut self, price: f64) {
        if self.count == 0 {
            self.min = price;
            self.max = price;
        } else {
            self.min = self.min.min(price);
            self.max = self.max.max(price);
        }
        self.count += 1;
        // Running mean: prices are non-negative, so the delta never overflows.
        #[allow(clippy::cast_precision_loss)]
        let n = self.count as f64;
        self.mean += (price - self.mean) / n;
    }

    fn into_stat(self, source: &str, brand: String) -> BrandStat {
        BrandStat {
            source: source.to_string(),
            brand,
            average_price: round_cents(self.mean),
            min_price: round_cents(self.min),
            max_price: round_cents(self.max),
            count: self.count,
        }
    }
}

/// Groups one source's records by brand. Records of other sources are
/// ignored, so brands sharing a name across retailers never blend.
#[must_use]
pub fn brand_stats_for_source(source: &str, records: &[CleanedRecord]) -> Vec<BrandStat> {
    let mut groups: BTreeMap<&str, PriceAccumulator> = BTreeMap::new();
    for record in records.iter().filter(|r| r.source == source) {
        groups.entry(record.brand.as_str()).or_default().add(record.price);
    }

    groups
        .into_iter()
        .map(|(brand, acc)| acc.into_stat(source, brand.to_string()))
        .collect()
}

/// Lowest minimum prices across every (source, brand) row. The sort is
/// stable, so equal minimums keep source order, then brand order.
#[must_use]
pub fn best_deals(per_source: &[SourceBrandStats], limit: usize) -> Vec<BrandStat> {
    let mut rows: Vec<BrandStat> = per_source
        .iter()
        .flat_map(|s| s.stats.iter().cloned())
        .collect();
    rows.sort_by(|a, b| a.min_price.total_cmp(&b.min_price));
    rows.truncate(limit);
    rows
}

/// Brands with the most listings across all sources. Ties go to the brand
/// seen first in the dataset.
#[must_use]
pub fn top_brands(records: &[CleanedRecord], limit: usize) -> Vec<BrandCount> {
    let mut order: Vec<BrandCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.brand.as_str()) {
            Some(&i) => order[i].count += 1,
            None => {
                index.insert(record.brand.as_str(), order.len());
                order.push(BrandCount {
                    brand: record.brand.clone(),
                    count: 1,
                });
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(limit);
    order
}

/// Highest-priced listings across all sources, full records retained.
#[must_use]
pub fn top_expensive(records: &[CleanedRecord], limit: usize) -> Vec<CleanedRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.price.total_cmp(&a.price));
    sorted.truncate(limit);
    sorted
}

/// Rounds to two decimal places, ties to even.
///
/// Values too large to scale by 100 have no fractional cents and are returned
/// unchanged.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 100.0
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
