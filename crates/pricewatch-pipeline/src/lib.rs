//! Normalization, cleaning and aggregation of scraped retailer listings.
//!
//! The stages are pure and synchronous: [`normalize`] maps source-shaped raw
//! records into one schema, [`clean`] parses prices and drops what cannot be
//! parsed, and [`aggregate`] derives the ranked views. [`run_pipeline`] chains
//! them for a whole batch and threads the dropped-record counts through.

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use aggregate::{aggregate, Aggregates, BrandCount, BrandStat, SourceBrandStats, TOP_N};
pub use clean::{clean, parse_price, Cleaned};
pub use error::{PipelineError, PriceParseFailure, RecordIssue};
pub use normalize::{normalize, Normalized};
pub use pipeline::{run_pipeline, PipelineReport, RawBatch};
pub use report::{Cell, DropCounts, RunSummary, SourceCounts, Table};
