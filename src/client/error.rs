#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
}

impl ClientError {
    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }

    pub fn is_request(&self) -> bool {
        matches!(self, ClientError::Request(_))
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidAddress(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
