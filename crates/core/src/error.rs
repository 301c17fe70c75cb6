use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("invalid page: {0}")]
    InvalidPage(String),
}
