use thiserror::Error;

/// A row failed ingestion. The row is skipped; the rest of the batch
/// proceeds.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("row {row}: {source}")]
    Unparseable {
        row: u64,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: {reason}")]
    Invalid { row: u64, reason: String },
}

/// A threshold override failed validation. Rejected before any scoring runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("override `{0}` is not of the form key=value")]
    Malformed(String),

    #[error("unknown threshold key `{0}`")]
    UnknownKey(String),

    #[error("threshold `{key}` has non-numeric value `{value}`")]
    NotNumeric { key: String, value: String },

    #[error("threshold `{key}` = {value} is outside its domain ({domain})")]
    OutOfDomain {
        key: String,
        value: f64,
        domain: &'static str,
    },
}
