use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Too many buckets: limit is {limit} but the reduction reached {count}. \
         Raise reduce.max_buckets to allow more"
    )]
    TooManyBuckets { limit: usize, count: i64 },

    #[error("Reduction cancelled")]
    Cancelled,

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Unsupported reduce mode: {0}")]
    UnsupportedMode(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Cannot reduce aggregation of type [{found}] with aggregations of type [{expected}]")]
    IncompatibleAggregations {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid partial result: {0}")]
    InvalidPartial(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::TooManyBuckets { .. } => "too_many_buckets",
            Error::Cancelled => "cancelled",
            Error::Invariant(_) => "invariant",
            Error::UnsupportedMode(_) => "unsupported_mode",
            Error::NotImplemented(_) => "not_implemented",
            Error::IncompatibleAggregations { .. } => "incompatible_aggregations",
            Error::InvalidPartial(_) => "invalid_partial",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    /// Whether the error aborted a reduction because of the bucket budget
    /// or a cancellation signalled through the budget tracker.
    pub fn is_budget_abort(&self) -> bool {
        matches!(self, Error::TooManyBuckets { .. } | Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
