use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphCrawlError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("export error: {0}")]
    Export(String),
}

impl GraphCrawlError {
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::QueryError(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::InvalidInput(msg.into())
    }

    pub fn backend<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::Backend(msg.into())
    }

    pub fn export<T: Into<String>>(msg: T) -> Self {
        GraphCrawlError::Export(msg.into())
    }
}
