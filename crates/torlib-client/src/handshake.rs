//! The IO half of a SOCKS4a handshake: send a request, read a reply.
//!
//! These functions stop at the edge of the protocol.  They don't look
//! at the reply status; that's for the caller, since `connect` and
//! `resolve` treat failures differently.

use crate::{Error, ProxyConfig, Result};

use futures::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use torlib_rtcompat::TcpProvider;
use torlib_socksproto::{SocksReply, SocksRequest, REPLY_LEN};
use tracing::{debug, trace};

/// Open a fresh connection to the proxy described by `proxy`, and send
/// `request` on it.
///
/// Return the connection, positioned just after the request, so that
/// the reply can be read from it.
pub(crate) async fn send_request<R: TcpProvider>(
    runtime: &R,
    proxy: &ProxyConfig,
    request: &SocksRequest,
) -> Result<R::TcpStream> {
    debug!(
        "Connecting to SOCKS proxy at {}:{}",
        proxy.host(),
        proxy.port()
    );
    let mut stream = runtime.connect(proxy.host(), proxy.port()).await?;

    let msg = request.encode();
    trace!("Sending {} request ({} bytes)", request.command(), msg.len());
    stream.write_all(&msg[..]).await?;
    stream.flush().await?;

    Ok(stream)
}

/// Read a complete SOCKS4 reply from `stream`.
///
/// Exactly [`REPLY_LEN`] bytes are consumed, and nothing after them:
/// once a CONNECT is granted, everything else on the stream belongs
/// to the application.
pub(crate) async fn read_reply<S>(stream: &mut S) -> Result<SocksReply>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0_u8; REPLY_LEN];
    let mut n_read = 0;
    while n_read < REPLY_LEN {
        let n = stream.read(&mut buf[n_read..]).await?;
        if n == 0 {
            debug!(
                "SOCKS proxy closed the connection after {} of {} reply bytes",
                n_read, REPLY_LEN
            );
            return Err(Error::Protocol(torlib_socksproto::Error::Truncated));
        }
        n_read += n;
    }

    Ok(SocksReply::decode(&buf[..])?)
}
