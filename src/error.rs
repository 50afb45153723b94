use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Start-up errors (fatal)
// ---------------------------------------------------------------------------

/// The plant table could not be read from its source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .columns.join(", "))]
    MissingColumn { columns: Vec<&'static str> },

    #[error("line {line}, column {column}: '{value}' is not a finite number")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: capacity {value} is negative")]
    NegativeCapacity { line: usize, value: f64 },
}

/// k-means could not partition the records.
#[derive(Debug, Error, PartialEq)]
pub enum ClusteringError {
    #[error("cluster count must be at least 1")]
    ZeroClusters,

    #[error("need at least {k} records to form {k} clusters, got {points}")]
    TooFewPoints { k: usize, points: usize },

    #[error("record {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// The configuration file is unreadable or holds unusable values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Anything that stops the dashboard from initialising.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Clustering(#[from] ClusteringError),
}

// ---------------------------------------------------------------------------
// Per-query errors (recoverable)
// ---------------------------------------------------------------------------

/// A statistic is mathematically undefined for the requested subset.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InsufficientDataError {
    #[error("correlation needs at least 2 records, got {count}")]
    TooFewRecords { count: usize },

    #[error("column {column} has zero variance")]
    ZeroVariance { column: &'static str },

    #[error("correlation overflowed for values this large")]
    NonFiniteCoefficient,
}
