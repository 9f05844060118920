//! Declare an error type for torlib_socksproto
use thiserror::Error;

/// An error that occurs while encoding or decoding a SOCKS4a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A message ended before all of its fields were present.
    ///
    /// For a reply, this means the proxy sent (or we received) fewer
    /// than 8 bytes.
    #[error("SOCKS message truncated")]
    Truncated,

    /// A fixed-length message had bytes left over after decoding.
    #[error("Extra bytes at end of SOCKS message")]
    ExtraneousBytes,

    /// We were asked to send a hostname that can't be represented in
    /// a SOCKS4a request.
    #[error("Hostname can't be sent over SOCKS4a: {0}")]
    BadHostname(&'static str),
}
