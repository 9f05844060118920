//! Compatibility between different async runtimes for torlib.
//!
//! We try to isolate these dependencies in a single place so that
//! we depend only on a minimal set of required features that our
//! runtime needs to give us.
//!
//! The one thing torlib really needs is a way to open a TCP stream to
//! the SOCKS proxy, and read and write bytes on it.  That is the
//! [`TcpProvider`] trait.  Code that talks to a proxy is generic over
//! it, so that tests can substitute a simulated network (see the
//! `torlib-rtmock` crate) for the real one.
//!
//! Right now, the only real implementation is for tokio.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::await_holding_lock)]

pub(crate) mod impls;
mod traits;

pub use traits::{Runtime, SpawnBlocking, TcpListener, TcpProvider};

/// Entry points for use with Tokio runtimes.
#[cfg(feature = "tokio")]
pub mod tokio {
    pub use crate::impls::tokio::{create_runtime, TcpStream, TokioListener, TokioRuntime};
}

/// Create a new [`Runtime`] of the default type.
///
/// Generally you should call this function only once, and then use
/// [`Clone::clone()`] to create additional references to that
/// runtime.
#[cfg(feature = "tokio")]
pub fn create_runtime() -> std::io::Result<impl Runtime> {
    crate::tokio::create_runtime()
}

/// Run a test function using a freshly created tokio runtime.
///
/// # Panics
///
/// Panics if we can't create the runtime.
#[cfg(feature = "tokio")]
pub fn test_with_runtime<P, F, O>(func: P) -> O
where
    P: FnOnce(crate::tokio::TokioRuntime) -> F,
    F: futures::Future<Output = O>,
{
    let runtime = crate::tokio::create_runtime().expect("Couldn't create tokio runtime");
    runtime.block_on(func(runtime.clone()))
}
