//! Relay bytes between a SOCKS tunnel and our own stdin/stdout.

use crate::exit::wait_for_ctrl_c;

use anyhow::{Context, Result};
use futures::channel::mpsc;
use futures::future::{Future, FutureExt};
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use futures::sink::SinkExt;
use futures::stream::TryStreamExt;
use futures::{pin_mut, select};
use std::io::{ErrorKind, Read, Result as IoResult};
use std::thread;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use torlib_client::Socks4aClient;
use torlib_rtcompat::Runtime;
use tracing::{debug, info};

/// Open a tunnel to `host:port` through the proxy, and connect it to
/// stdin and stdout until the tunnel closes or we get a ctrl-c.
pub(crate) async fn run_connect<R: Runtime>(
    client: &Socks4aClient<R>,
    host: &str,
    port: u16,
) -> Result<()> {
    let tunnel = client
        .connect(host, port)
        .await
        .with_context(|| format!("Couldn't open a tunnel to {}:{}", host, port))?;
    info!("Tunnel to {}:{} is open.", host, port);

    let stdin =
        blocking_reader(std::io::stdin(), "torlib-stdin").context("Couldn't read stdin")?;
    let stdout = tokio_crate::io::stdout().compat_write();
    relay(tunnel, stdin, stdout, wait_for_ctrl_c()).await
}

/// How many chunks a [`blocking_reader`] thread may read ahead.
const READ_AHEAD: usize = 4;

/// Read from `reader` on a detached thread, and return the bytes as an
/// [`AsyncRead`].
///
/// A read from stdin can't be cancelled.  If tokio did that read, the
/// runtime would wait for it on shutdown, and we'd never exit while
/// stdin stayed open.  A thread of our own just gets abandoned.
fn blocking_reader<R>(mut reader: R, name: &str) -> IoResult<impl AsyncRead + Unpin>
where
    R: Read + Send + 'static,
{
    let (mut tx, rx) = mpsc::channel::<IoResult<Vec<u8>>>(READ_AHEAD);
    thread::Builder::new().name(name.into()).spawn(move || {
        let mut buf = [0_u8; 1024];
        loop {
            let chunk = match reader.read(&mut buf[..]) {
                Ok(0) => break, // EOF
                Ok(n) => Ok(buf[..n].to_vec()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
            let last = chunk.is_err();
            // An error here means nobody is listening any more.
            if futures::executor::block_on(tx.send(chunk)).is_err() || last {
                break;
            }
        }
    })?;
    Ok(rx.into_async_read())
}

/// Copy `input` into `tunnel` and `tunnel` into `output`.
///
/// We're done once the tunnel has nothing more to say, or once `stop`
/// resolves.  Running out of input just closes our side of the tunnel.
async fn relay<S, I, O, F>(tunnel: S, input: I, output: O, stop: F) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    F: Future<Output = Result<()>>,
{
    let (tun_r, tun_w) = tunnel.split();

    let upstream = copy_interactive(input, tun_w).fuse();
    let downstream = copy_interactive(tun_r, output).fuse();
    let stop = stop.fuse();
    pin_mut!(upstream, downstream, stop);

    loop {
        select! {
            r = upstream => {
                r.context("Couldn't send data into tunnel")?;
                debug!("Input closed; waiting for the tunnel to finish.");
            }
            r = downstream => {
                r.context("Couldn't read data from tunnel")?;
                debug!("Tunnel closed.");
                return Ok(());
            }
            r = stop => {
                r?;
                info!("Received a ctrl-c; closing tunnel.");
                return Ok(());
            }
        }
    }
}

/// Copy all the data from `reader` into `writer` until we encounter an EOF or
/// an error.
///
/// Unlike futures::io::copy(), this function is meant for use with
/// interactive readers and writers, where the reader might pause for
/// a while, but where we want to send data on the writer as soon as
/// it is available.
///
/// We only flush the writer when the reader has no data ready.
async fn copy_interactive<R, W>(mut reader: R, mut writer: W) -> IoResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    use futures::{poll, task::Poll};

    let mut buf = [0_u8; 1024];

    let loop_result: IoResult<()> = loop {
        let mut read_future = reader.read(&mut buf[..]);
        match poll!(&mut read_future) {
            Poll::Ready(Err(e)) => break Err(e),
            Poll::Ready(Ok(0)) => break Ok(()), // EOF
            Poll::Ready(Ok(n)) => {
                writer.write_all(&buf[..n]).await?;
                continue;
            }
            Poll::Pending => writer.flush().await?,
        }

        match read_future.await {
            Err(e) => break Err(e),
            Ok(0) => break Ok(()),
            Ok(n) => writer.write_all(&buf[..n]).await?,
        }
    };

    // Only do a "proper" close if the reader closed cleanly.  A read
    // error takes precedence over anything that goes wrong here.
    let flush_result = if loop_result.is_ok() {
        writer.close().await
    } else {
        writer.flush().await
    };

    loop_result.and(flush_result)
}
