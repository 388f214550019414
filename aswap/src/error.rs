use crate::{ethereum::wallet::AuthError, jsonrpc::ConnectionFailed};

/// Everything a swap command can fail with. The variant decides the exit
/// code; the source chain carries the details.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input")]
    Validation(#[source] anyhow::Error),
    #[error("chain connection failed")]
    Connection(#[source] anyhow::Error),
    #[error("failed to unlock account")]
    Auth(#[from] AuthError),
    #[error("unexpected contract data")]
    Encoding(#[source] anyhow::Error),
    #[error("transaction was not accepted")]
    Submission(#[source] anyhow::Error),
    #[error("failed to update configuration")]
    Config(#[source] anyhow::Error),
    #[error("declined by user")]
    Declined,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(anyhow::anyhow!(message.into()))
    }

    /// Node-side rejections are submission failures, unless the node could
    /// not be reached in the first place.
    pub fn submission(error: anyhow::Error) -> Self {
        if error.downcast_ref::<ConnectionFailed>().is_some() {
            Error::Connection(error)
        } else {
            Error::Submission(error)
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Declined => 0,
            Error::Validation(_) => 2,
            Error::Connection(_) => 3,
            Error::Auth(_) => 4,
            Error::Encoding(_) => 5,
            Error::Submission(_) => 6,
            Error::Config(_) => 7,
        }
    }
}
