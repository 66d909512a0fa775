//! Errors raised while talking to the portal.
//!
//! None of these escape [`crate::PortalClient::authenticate`]; they are
//! rendered with `Display` into the `error` fields of the result.

/// All errors that can occur during one portal conversation.
#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("csrf token not found in page markup")]
    MissingToken,

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no profile blocks found in page markup")]
    MissingProfileMarkup,

    #[error("invalid portal url: {0}")]
    Url(#[from] url::ParseError),
}

pub type PortalResult<T> = Result<T, PortalError>;
