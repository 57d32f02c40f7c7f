use thiserror::Error;

/// Fatal, batch-level failures. Per-record problems are [`RecordIssue`]s and
/// never abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no raw records from any of the {sources} configured sources")]
    EmptyBatch { sources: usize },

    #[error("raw records supplied for unconfigured source '{0}'")]
    UnknownSource(String),
}

/// Why a price string could not be turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceParseFailure {
    #[error("no digits")]
    Empty,
    #[error("more than one decimal point")]
    MultipleDecimalPoints,
    #[error("not a number")]
    Invalid,
    #[error("not finite")]
    NotFinite,
}

/// A recoverable problem with one record. The record is dropped and counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIssue {
    #[error("{source_id} record #{index} has {len} fields; layout needs at least {min_arity}")]
    RecordShape {
        source_id: String,
        index: usize,
        len: usize,
        min_arity: usize,
    },

    #[error("{source_id} record #{index} has invalid page value {value:?}")]
    InvalidPage {
        source_id: String,
        index: usize,
        value: String,
    },

    #[error("{source_id} listing '{name}' has unparseable price {price_raw:?}: {reason}")]
    PriceParse {
        source_id: String,
        name: String,
        price_raw: String,
        reason: PriceParseFailure,
    },
}

impl RecordIssue {
    /// `true` for issues raised by the normalizer (bad record shape).
    #[must_use]
    pub fn is_shape_issue(&self) -> bool {
        matches!(
            self,
            RecordIssue::RecordShape { .. } | RecordIssue::InvalidPage { .. }
        )
    }
}
