//! Implements the client side of SOCKS4a, in the flavor spoken by Tor.
//!
//! SOCKS4 is an old and somewhat janky protocol for telling a TCP
//! proxy where to connect.  SOCKS4a extends it so that the client can
//! send a hostname instead of an IPv4 address: the client sets the
//! address field to `0.0.0.1`, and appends the hostname after the
//! (empty) user id.  Tor further extends it with a `RESOLVE` command
//! that asks the exit relay to look up a hostname and send back the
//! IPv4 address in the reply.
//!
//! This crate does no IO.  It knows how to turn a [`SocksRequest`]
//! into bytes, and how to turn the fixed-length reply back into a
//! [`SocksReply`].  Sending and receiving those bytes is the job of
//! `torlib-client`.
//!
//! For more information about SOCKS4 and SOCKS4a:
//!
//!   * [The wikipedia article](https://en.wikipedia.org/wiki/SOCKS)
//!     is the best surviving documentation for SOCKS4 and SOCKS4a.
//!   * See
//!     [socks-extensions.txt](https://spec.torproject.org/socks-extensions)
//!     for a description of Tor's extensions to the SOCKS protocol.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::exhaustive_structs)]
#![warn(clippy::needless_pass_by_value)]

mod err;
mod frame;
mod msg;

pub use err::Error;
pub use frame::{Readable, Reader, Writeable, Writer};
pub use msg::{
    describe, SocksCmd, SocksHostname, SocksReply, SocksRequest, SocksStatus, REPLY_LEN,
    REPLY_VERSION, SOCKS4A_FAKE_IP, SOCKS_VERSION,
};

/// A Result type for the torlib_socksproto crate.
pub type Result<T> = std::result::Result<T, Error>;
