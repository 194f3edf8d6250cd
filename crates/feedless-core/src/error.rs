/// Failures surfaced by the query layer.
///
/// None of these are retried internally; callers see exactly one.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Log query failed: {0}")]
    QueryFailure(String),

    #[error("Could not resolve profile for {identity}: {message}")]
    ProfileResolution { identity: String, message: String },

    #[error("Trust graph lookup failed: {0}")]
    GraphLookup(String),

    #[error("Append failed: {0}")]
    AppendFailure(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

impl QueryError {
    /// Stable machine-readable code used on the UI boundary.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::QueryFailure(_) => "query_failure",
            QueryError::ProfileResolution { .. } => "profile_unavailable",
            QueryError::GraphLookup(_) => "graph_lookup_failure",
            QueryError::AppendFailure(_) => "append_failure",
            QueryError::InvalidRecord(_) => "invalid_record",
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
