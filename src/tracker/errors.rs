use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User directory is unavailable: {0}")]
    Unavailable(String)
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event could not be published, broker unavailable: {0}")]
    Unavailable(String),
    #[error("Event was rejected by the broker: {0}")]
    Rejected(String)
}

impl PublishError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
