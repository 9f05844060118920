//! Declare an error type for torlib_client
use thiserror::Error;
use torlib_socksproto::SocksStatus;

/// An error that occurs while using a SOCKS proxy.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// We couldn't reach the proxy, or the connection failed while we
    /// were talking to it.
    #[error("Couldn't talk to SOCKS proxy: {0}")]
    Transport(#[from] std::io::Error),

    /// The proxy sent something we couldn't parse, or we were asked
    /// to send something that SOCKS4a can't express.
    #[error("SOCKS protocol error: {0}")]
    Protocol(#[from] torlib_socksproto::Error),

    /// The proxy answered, and the answer was no.
    #[error("{description}")]
    Rejected {
        /// The status code that the proxy sent.
        status: SocksStatus,
        /// Human-readable explanation of `status`.
        description: String,
    },
}

impl Error {
    /// Construct a [`Error::Rejected`] for a given status.
    pub(crate) fn rejected(status: SocksStatus) -> Self {
        Error::Rejected {
            status,
            description: status.to_string(),
        }
    }
}
