//! Implements a simple mock network for testing purposes.

// This only needs to be realistic enough to stand up a fake SOCKS
// proxy and talk to it.

use super::io::{stream_pair, LocalStream};
use torlib_rtcompat::{TcpListener, TcpProvider};

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::lock::Mutex as AsyncMutex;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

/// A channel sender that we use to send incoming connections to
/// listeners.
type ConnSender = mpsc::Sender<(LocalStream, SocketAddr)>;
/// A channel receiver that listeners use to receive incoming connections.
type ConnReceiver = mpsc::Receiver<(LocalStream, SocketAddr)>;

/// The name under which a listener is reachable: a hostname (or IP
/// address in text form) and a port.
type ListenKey = (String, u16);

/// A pretend network that lives entirely in memory.
///
/// Every connection is a [`LocalStream`] pair.  One MockNetwork is
/// shared by any number of [`MockNetProvider`]s; each provider plays
/// the part of one host with its own address(es).
///
/// Listeners can be registered under a hostname as well as under an
/// address, since a SOCKS client is usually told to find its proxy
/// at something like `localhost:9050`.
pub struct MockNetwork {
    /// A map from name to the senders that need to be informed about
    /// connection attempts there.
    listening: Mutex<HashMap<ListenKey, ConnSender>>,
}

/// One simulated host on a [`MockNetwork`].
///
/// Hand this to anything that wants a [`TcpProvider`], and its
/// connections will go over the mock network instead.
///
/// # Limitations
///
/// Nothing here is random, and nothing ever gets lost or delayed.
///
/// There is no DNS: a connection to `host:port` succeeds only if
/// somebody is listening under exactly that name (compared without
/// regard to ASCII case).
///
/// Source ports for outgoing connections come from a `u16` counter
/// that is never reset; running it out trips an assertion.
#[derive(Clone)]
pub struct MockNetProvider {
    /// State shared between clones of this provider.
    inner: Arc<MockNetProviderInner>,
}

/// The part of a MockNetProvider that all of its clones share.
struct MockNetProviderInner {
    /// List of public addresses
    addrs: Vec<IpAddr>,
    /// Shared reference to the network.
    net: Arc<MockNetwork>,
    /// Next port number to hand out when we need an arbitrary one.
    next_port: AtomicU16,
}

/// A listener on a [`MockNetwork`], waiting for connections to one
/// name and port.
pub struct MockNetListener {
    /// The address that we're listening on.
    addr: SocketAddr,
    /// The incoming channel that tells us about new connections.
    receiver: AsyncMutex<ConnReceiver>,
}

/// A builder object used to configure a [`MockNetProvider`]
///
/// Returned by [`MockNetwork::builder()`].
pub struct ProviderBuilder {
    /// List of public addresses.
    addrs: Vec<IpAddr>,
    /// Shared reference to the network.
    net: Arc<MockNetwork>,
}

/// Return a new io::Error with the given kind.
fn err(kind: ErrorKind) -> IoError {
    IoError::new(kind, "Mock network error")
}

/// Normalize `host` and `port` into a key for the listener map.
fn listen_key(host: &str, port: u16) -> ListenKey {
    (host.to_ascii_lowercase(), port)
}

impl MockNetwork {
    /// Make a new MockNetwork with no active listeners.
    pub fn new() -> Arc<Self> {
        Arc::new(MockNetwork {
            listening: Mutex::new(HashMap::new()),
        })
    }

    /// Return a [`ProviderBuilder`] for creating a [`MockNetProvider`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use torlib_rtmock::net::*;
    /// # let mock_network = MockNetwork::new();
    /// let client_net = mock_network.builder()
    ///       .add_address("198.51.100.6".parse().unwrap())
    ///       .provider();
    /// ```
    pub fn builder(self: &Arc<Self>) -> ProviderBuilder {
        ProviderBuilder {
            addrs: vec![],
            net: Arc::clone(self),
        }
    }

    /// Tell the listener at `target` (if any) about an incoming
    /// connection from `source_addr` at `peer_stream`.
    ///
    /// Returns an error if there isn't any such listener.
    async fn send_connection(
        &self,
        source_addr: SocketAddr,
        target: ListenKey,
        peer_stream: LocalStream,
    ) -> IoResult<()> {
        let entry = {
            let listener_map = self
                .listening
                .lock()
                .expect("Failed to obtain lock for listener");
            listener_map.get(&target).map(Clone::clone)
        };
        if let Some(mut entry) = entry {
            if entry.send((peer_stream, source_addr)).await.is_ok() {
                return Ok(());
            }
        }
        Err(err(ErrorKind::ConnectionRefused))
    }

    /// Register a listener at `key` and return the ConnReceiver
    /// that it should use for connections.
    ///
    /// Returns an error if the name is already in use.
    fn add_listener(&self, key: ListenKey) -> IoResult<ConnReceiver> {
        let mut listener_map = self
            .listening
            .lock()
            .expect("Failed to obtain lock for listener");
        if listener_map.contains_key(&key) {
            return Err(err(ErrorKind::AddrInUse));
        }

        let (send, recv) = mpsc::channel(16);
        listener_map.insert(key, send);
        Ok(recv)
    }
}

impl ProviderBuilder {
    /// Add `addr` as a new address for the provider we're building.
    pub fn add_address(&mut self, addr: IpAddr) -> &mut Self {
        self.addrs.push(addr);
        self
    }
    /// Use this builder to return a new [`MockNetProvider`]
    pub fn provider(&self) -> MockNetProvider {
        let inner = MockNetProviderInner {
            addrs: self.addrs.clone(),
            net: Arc::clone(&self.net),
            next_port: AtomicU16::new(1),
        };
        MockNetProvider {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl TcpListener for MockNetListener {
    type TcpStream = LocalStream;

    async fn accept(&self) -> IoResult<(Self::TcpStream, SocketAddr)> {
        let mut receiver = self.receiver.lock().await;
        receiver
            .next()
            .await
            .ok_or_else(|| err(ErrorKind::BrokenPipe))
    }

    fn local_addr(&self) -> IoResult<SocketAddr> {
        Ok(self.addr)
    }
}

impl MockNetProvider {
    /// Return an arbitrary port number that we haven't returned from
    /// this function before.
    ///
    /// # Panics
    ///
    /// Panics if there are no remaining ports that this function hasn't
    /// returned before.
    fn arbitrary_port(&self) -> u16 {
        let next = self.inner.next_port.fetch_add(1, Ordering::Relaxed);
        assert!(next != 0);
        next
    }

    /// Helper for connecting: Picks the socketaddr that our connection
    /// appears to come from.
    fn get_origin_addr(&self) -> IoResult<SocketAddr> {
        let my_addr = self
            .inner
            .addrs
            .first()
            .copied()
            .ok_or_else(|| err(ErrorKind::AddrNotAvailable))?;
        Ok(SocketAddr::new(my_addr, self.arbitrary_port()))
    }

    /// Listen for connections to `host:port`.
    ///
    /// Unlike [`TcpProvider::listen`], this lets a simulated host be
    /// reached by name, the way a local SOCKS proxy usually is.  We
    /// don't check that `host` is one of our own addresses.
    pub fn listen_named(&self, host: &str, port: u16) -> IoResult<MockNetListener> {
        let my_addr = self
            .inner
            .addrs
            .first()
            .copied()
            .ok_or_else(|| err(ErrorKind::AddrNotAvailable))?;
        let receiver = AsyncMutex::new(self.inner.net.add_listener(listen_key(host, port))?);
        Ok(MockNetListener {
            addr: SocketAddr::new(my_addr, port),
            receiver,
        })
    }
}

#[async_trait]
impl TcpProvider for MockNetProvider {
    type TcpStream = LocalStream;
    type TcpListener = MockNetListener;

    async fn connect(&self, host: &str, port: u16) -> IoResult<LocalStream> {
        let my_addr = self.get_origin_addr()?;
        let (mine, theirs) = stream_pair();

        self.inner
            .net
            .send_connection(my_addr, listen_key(host, port), theirs)
            .await?;

        Ok(mine)
    }

    async fn listen(&self, addr: &SocketAddr) -> IoResult<Self::TcpListener> {
        if !self.inner.addrs.contains(&addr.ip()) {
            return Err(err(ErrorKind::AddrNotAvailable));
        }
        let port = if addr.port() == 0 {
            self.arbitrary_port()
        } else {
            addr.port()
        };
        let addr = SocketAddr::new(addr.ip(), port);
        let key = listen_key(&addr.ip().to_string(), port);
        let receiver = AsyncMutex::new(self.inner.net.add_listener(key)?);

        Ok(MockNetListener { addr, receiver })
    }
}
