//! Support for mocking with runtimes.
//!
//! This crate should should only be used for writing tests.
//!
//! Currently, we support making fake stream pairs, and impersonating
//! the Internet well enough to stand up a fake SOCKS proxy.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod io;
pub mod net;
