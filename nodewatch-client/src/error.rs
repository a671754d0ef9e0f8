use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The service answered with a non-success status. `detail` is already
    /// normalised to display text, whatever shape the payload had.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Progress stream closed")]
    StreamClosed,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } => Some(*status),
            ClientError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for failures where the request never got a service answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::HttpError(_) | ClientError::Connection(_) | ClientError::StreamClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
