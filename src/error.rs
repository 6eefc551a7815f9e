use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The ways a call into this crate can fail.
///
/// Untrusted markup never produces one of these: broken tags and unsafe
/// links are dropped while cleaning. Only the caller's own inputs can.
#[derive(Debug, Error)]
pub enum Error {
    #[error("base domain must not be empty")]
    EmptyBaseDomain,
    #[error("invalid base domain {0:?}")]
    InvalidBaseDomain(String),
    #[error("unparseable URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}
