//! Use a Tor SOCKS port to make anonymous connections and lookups.
//!
//! Tor exposes a SOCKS proxy (by default on `localhost:9050`).  This
//! crate speaks the client side of SOCKS4a to it, for the two things
//! that Tor's SOCKS port is good for:
//!
//!   * [`Socks4aClient::connect`] asks the proxy to open a TCP stream
//!     to a hostname and port, through the Tor network, and gives you
//!     that stream.
//!   * [`Socks4aClient::resolve`] asks the proxy to look up a hostname
//!     at an exit relay (Tor's `RESOLVE` extension), so that the lookup
//!     never touches your local DNS.
//!
//! The two report failure differently.  `connect` returns an [`Error`]
//! for every kind of failure.  `resolve` never does: it returns
//! [`Resolution::Unresolved`] instead, and anybody who wants the
//! reason can call [`Socks4aClient::try_resolve`].
//!
//! Each call makes exactly one connection to the proxy, sends one
//! request, and reads one reply.  There are no retries, no timeouts,
//! and no caching.
//!
//! # Example
//!
//! ```no_run
//! use torlib_client::{ProxyConfig, Resolution, Socks4aClient};
//! use torlib_rtcompat::SpawnBlocking;
//!
//! # fn main() -> std::io::Result<()> {
//! let runtime = torlib_rtcompat::tokio::create_runtime()?;
//! let client = Socks4aClient::new(runtime.clone(), ProxyConfig::default());
//! runtime.block_on(async {
//!     if let Resolution::Resolved(addr) = client.resolve("www.torproject.org").await {
//!         println!("{}", addr);
//!     }
//! });
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::await_holding_lock)]
#![warn(clippy::needless_pass_by_value)]

mod client;
mod config;
mod err;
mod handshake;

pub use client::{Resolution, Socks4aClient};
pub use config::ProxyConfig;
pub use err::Error;

/// A Result type for the torlib_client crate.
pub type Result<T> = std::result::Result<T, Error>;
