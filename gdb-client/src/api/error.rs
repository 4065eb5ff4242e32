/// Errors from the remote account API.
///
/// The split matters to the caller: `Auth` means the credential was
/// rejected or expired and a human has to act; `Transport` covers
/// everything that a later retry can plausibly fix (network faults,
/// server errors, malformed bodies).
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}
