//! Implementations of our runtime traits for tokio.
//!
//! Tokio has its own `AsyncRead`/`AsyncWrite` traits; we wrap its
//! streams with `tokio_util::compat` so that the rest of torlib only
//! ever sees the `futures` versions.

use crate::traits::{SpawnBlocking, TcpListener, TcpProvider};

use async_trait::async_trait;
use futures::Future;
use std::io::Result as IoResult;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_crate::net::{TcpListener as TokioTcpListener, TcpStream as TokioTcpStream};
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

/// A TCP stream from tokio, wrapped to use the `futures` IO traits.
pub type TcpStream = Compat<TokioTcpStream>;

/// Wrapper around a tokio TCP listener, returning wrapped streams.
#[derive(Debug)]
pub struct TokioListener {
    /// The listener that we're wrapping.
    lis: TokioTcpListener,
}

#[async_trait]
impl TcpListener for TokioListener {
    type TcpStream = TcpStream;

    async fn accept(&self) -> IoResult<(Self::TcpStream, SocketAddr)> {
        let (stream, addr) = self.lis.accept().await?;
        Ok((stream.compat(), addr))
    }

    fn local_addr(&self) -> IoResult<SocketAddr> {
        self.lis.local_addr()
    }
}

/// A handle to a multithreaded tokio runtime.
///
/// Cloning this handle gives another reference to the same runtime.
#[derive(Clone, Debug)]
pub struct TokioRuntime {
    /// The runtime itself.  It shuts down once the last handle is dropped.
    rt: Arc<tokio_crate::runtime::Runtime>,
}

/// Create and return a new tokio runtime.
pub fn create_runtime() -> IoResult<TokioRuntime> {
    let rt = tokio_crate::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(TokioRuntime { rt: Arc::new(rt) })
}

impl SpawnBlocking for TokioRuntime {
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }
}

#[async_trait]
impl TcpProvider for TokioRuntime {
    type TcpStream = TcpStream;
    type TcpListener = TokioListener;

    async fn connect(&self, host: &str, port: u16) -> IoResult<Self::TcpStream> {
        let stream = TokioTcpStream::connect((host, port)).await?;
        Ok(stream.compat())
    }

    async fn listen(&self, addr: &SocketAddr) -> IoResult<Self::TcpListener> {
        let lis = TokioTcpListener::bind(*addr).await?;
        Ok(TokioListener { lis })
    }
}
