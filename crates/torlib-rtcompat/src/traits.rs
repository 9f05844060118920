//! Declarations for traits that we need our runtimes to implement.
use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite, Future};
use std::io::Result as IoResult;
use std::net::SocketAddr;

/// A runtime that we can use to talk to a SOCKS proxy.
///
/// This trait comprises several other traits that we require all of
/// our runtimes to provide:
///
/// * [`TcpProvider`] to open connections to the proxy (and, in tests,
///   to pretend to be one).
/// * [`SpawnBlocking`] to drive a future to completion from
///   synchronous code.
pub trait Runtime: Send + Sync + Clone + SpawnBlocking + TcpProvider + 'static {}

impl<T> Runtime for T where T: Send + Sync + Clone + SpawnBlocking + TcpProvider + 'static {}

/// Trait for a runtime that can block on a future.
pub trait SpawnBlocking {
    /// Run `future` until it is ready, and return its output.
    fn block_on<F: Future>(&self, future: F) -> F::Output;
}

/// Trait for a runtime that can create and accept TCP connections.
///
/// (In Rust you can't define arbitrary traits on types from other
/// crates, so we need to wrap the streams we get back.)
#[async_trait]
pub trait TcpProvider {
    /// The type for the TCP connections returned by [`Self::connect()`].
    type TcpStream: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static;
    /// The type for the TCP listeners returned by [`Self::listen()`].
    type TcpListener: TcpListener<TcpStream = Self::TcpStream> + Send + Sync + Unpin + 'static;

    /// Launch a TCP connection to `host:port`.
    ///
    /// `host` may be a DNS name or an IP address in text form; name
    /// lookup, if any, is up to the runtime.
    ///
    /// Note that unlike [`std::net::TcpStream::connect`], we do not
    /// accept any types other than a single host and port.  If you
    /// need to try several addresses, do it yourself.
    async fn connect(&self, host: &str, port: u16) -> IoResult<Self::TcpStream>;

    /// Open a TCP listener on a given socket address.
    async fn listen(&self, addr: &SocketAddr) -> IoResult<Self::TcpListener>;
}

/// Trait for a local socket that accepts incoming TCP streams.
#[async_trait]
pub trait TcpListener {
    /// The type of TCP connections returned by [`Self::accept()`].
    type TcpStream: AsyncRead + AsyncWrite + Send + Sync + Unpin + 'static;

    /// Wait for an incoming stream; return it along with its address.
    async fn accept(&self) -> IoResult<(Self::TcpStream, SocketAddr)>;

    /// Return the local address that this listener is bound to.
    fn local_addr(&self) -> IoResult<SocketAddr>;
}
