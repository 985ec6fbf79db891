use thiserror::Error;

/// Why a tier of the crawl produced nothing and the next one was used.
///
/// None of these abort a crawl; they are carried on the outcome so callers
/// can tell live data from degraded data. Cover failures are only logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegradedReason {
    #[error("search capability not configured")]
    SearchUnavailable,

    #[error("{provider} query failed: {message}")]
    QueryFailed { provider: String, message: String },

    #[error("movie database returned HTTP {0}")]
    MovieDbStatus(u16),

    #[error("{provider} does not support content type {content_type}")]
    UnsupportedType { provider: String, content_type: String },

    #[error("{provider} returned no usable records")]
    NoResults { provider: String },
}

impl DegradedReason {
    pub(crate) fn query_failed(provider: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::QueryFailed { provider: provider.into(), message: format!("{err:#}") }
    }

    pub(crate) fn no_results(provider: impl Into<String>) -> Self {
        Self::NoResults { provider: provider.into() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("unknown data source: {0}")]
    UnknownSource(String),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
