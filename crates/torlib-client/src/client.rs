//! A client that sends SOCKS4a requests to a Tor proxy.

use crate::handshake::{read_reply, send_request};
use crate::{Error, ProxyConfig, Result};

use std::fmt;
use std::net::Ipv4Addr;
use torlib_rtcompat::TcpProvider;
use torlib_socksproto::{SocksReply, SocksRequest, REPLY_VERSION};
use tracing::{debug, warn};

/// The outcome of [`Socks4aClient::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::exhaustive_enums)]
pub enum Resolution {
    /// The proxy looked up the name and gave us this address.
    Resolved(Ipv4Addr),
    /// We didn't get an address, for whatever reason.
    Unresolved,
}

impl Resolution {
    /// Return the resolved address, if there is one.
    pub fn addr(&self) -> Option<Ipv4Addr> {
        match self {
            Resolution::Resolved(a) => Some(*a),
            Resolution::Unresolved => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved(a) => write!(f, "{}", a),
            Resolution::Unresolved => write!(f, "(unresolved)"),
        }
    }
}

/// A client for making requests through a SOCKS4a proxy.
///
/// Every request opens its own brand-new connection to the proxy, so
/// a single client can be used for any number of concurrent requests.
///
/// None of the methods here apply a timeout.  If the proxy never
/// answers, they wait forever; wrap them in a timeout if you care.
/// Dropping one of the returned futures closes its connection to
/// the proxy.
#[derive(Clone)]
pub struct Socks4aClient<R: TcpProvider> {
    /// Runtime used to open connections to the proxy.
    runtime: R,
    /// Where the proxy is.
    proxy: ProxyConfig,
}

impl<R: TcpProvider> Socks4aClient<R> {
    /// Construct a new client that uses `runtime` to reach the proxy
    /// described in `proxy`.
    pub fn new(runtime: R, proxy: ProxyConfig) -> Self {
        Socks4aClient { runtime, proxy }
    }

    /// Return the proxy configuration for this client.
    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    /// Ask the proxy to open a TCP stream to `host:port`.
    ///
    /// On success, return the stream: from now on, the proxy relays
    /// bytes in both directions without any further framing.
    ///
    /// If the proxy refuses, the error is [`Error::Rejected`], and the
    /// connection to the proxy is closed.
    pub async fn connect(&self, host: &str, port: u16) -> Result<R::TcpStream> {
        let request = SocksRequest::connect(host, port)?;
        let mut stream = send_request(&self.runtime, &self.proxy, &request).await?;
        let reply = read_reply(&mut stream).await?;
        check_reply(&reply)?;

        // The bound address and port are unreliable for CONNECT; we've
        // read them, and that's all we're going to do with them.
        debug!("SOCKS proxy opened a stream to {}:{}", host, port);
        Ok(stream)
    }

    /// Ask the proxy to look up `host`, and return the IPv4 address it
    /// found.
    ///
    /// Unlike [`Socks4aClient::resolve`], this function tells you why
    /// it failed.
    pub async fn try_resolve(&self, host: &str) -> Result<Ipv4Addr> {
        let request = SocksRequest::resolve(host)?;
        let mut stream = send_request(&self.runtime, &self.proxy, &request).await?;
        let reply = read_reply(&mut stream).await?;
        drop(stream);
        check_reply(&reply)?;
        Ok(reply.addr())
    }

    /// Ask the proxy to look up `host`.
    ///
    /// This never fails: if the proxy refuses, can't be reached, or
    /// sends something we can't understand, the answer is just
    /// [`Resolution::Unresolved`].  (Callers that need to know which
    /// of those happened should use [`Socks4aClient::try_resolve`].)
    /// Compare [`Socks4aClient::connect`], which reports every failure.
    pub async fn resolve(&self, host: &str) -> Resolution {
        match self.try_resolve(host).await {
            Ok(addr) => Resolution::Resolved(addr),
            Err(e) => {
                debug!("Unable to resolve {:?} through SOCKS proxy: {}", host, e);
                Resolution::Unresolved
            }
        }
    }
}

/// Check whether `reply` says that our request was granted.
///
/// A bad version byte is only worth a warning.
fn check_reply(reply: &SocksReply) -> Result<()> {
    if !reply.version_ok() {
        warn!(
            "SOCKS proxy replied with version {} (expected {}); continuing anyway.",
            reply.version(),
            REPLY_VERSION
        );
    }
    let status = reply.status();
    if status.is_granted() {
        Ok(())
    } else {
        Err(Error::rejected(status))
    }
}
