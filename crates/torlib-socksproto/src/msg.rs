//! Structures that represent SOCKS4a messages

use crate::frame::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::net::Ipv4Addr;

/// The version byte at the start of every SOCKS4 and SOCKS4a request.
pub const SOCKS_VERSION: u8 = 4;

/// The version byte that a SOCKS4 reply is supposed to start with.
///
/// Note that this is _not_ the same as the request version.
pub const REPLY_VERSION: u8 = 0;

/// Address to put in a request when the hostname follows the user id.
///
/// Any address of the form `0.0.0.x` with `x != 0` turns on SOCKS4a;
/// we always use `0.0.0.1`.
pub const SOCKS4A_FAKE_IP: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

/// Length of a SOCKS4 reply, in bytes.
pub const REPLY_LEN: usize = 8;

/// Command telling the SOCKS proxy what to do with our request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SocksCmd {
    /// Connect to a remote TCP address:port.
    Connect,
    /// Lookup a hostname, return an IPv4 address. (Tor only.)
    Resolve,
}

impl From<SocksCmd> for u8 {
    fn from(cmd: SocksCmd) -> u8 {
        match cmd {
            SocksCmd::Connect => 0x01,
            SocksCmd::Resolve => 0xF0,
        }
    }
}

impl fmt::Display for SocksCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCmd::Connect => write!(f, "CONNECT"),
            SocksCmd::Resolve => write!(f, "RESOLVE"),
        }
    }
}

/// Status byte from a SOCKS4 reply.
///
/// SOCKS4 only defines four codes.  Anything else a proxy sends us is
/// kept as [`SocksStatus::Unknown`] so that we can still report it.
///
/// Build these with `From<u8>`.  A hand-made `Unknown` holding one of
/// the defined codes still behaves as that code: it is granted,
/// described, and compared by its numeric value.
#[derive(Clone, Copy, Debug)]
#[allow(clippy::exhaustive_enums)]
pub enum SocksStatus {
    /// 90: request granted.
    Granted,
    /// 91: request rejected or failed.
    RejectedGeneric,
    /// 92: rejected because the proxy couldn't reach identd on the client.
    RejectedIdentdUnreachable,
    /// 93: rejected because identd reported a different user id.
    RejectedIdentdMismatch,
    /// Some status code that SOCKS4 doesn't define.
    Unknown(u8),
}

impl From<u8> for SocksStatus {
    fn from(code: u8) -> SocksStatus {
        match code {
            90 => SocksStatus::Granted,
            91 => SocksStatus::RejectedGeneric,
            92 => SocksStatus::RejectedIdentdUnreachable,
            93 => SocksStatus::RejectedIdentdMismatch,
            other => SocksStatus::Unknown(other),
        }
    }
}

impl From<SocksStatus> for u8 {
    fn from(status: SocksStatus) -> u8 {
        match status {
            SocksStatus::Granted => 90,
            SocksStatus::RejectedGeneric => 91,
            SocksStatus::RejectedIdentdUnreachable => 92,
            SocksStatus::RejectedIdentdMismatch => 93,
            SocksStatus::Unknown(other) => other,
        }
    }
}

impl SocksStatus {
    /// Return this status with `Unknown` used only for undefined codes.
    fn normalize(self) -> SocksStatus {
        u8::from(self).into()
    }

    /// Return true if the proxy accepted our request.
    pub fn is_granted(self) -> bool {
        matches!(self.normalize(), SocksStatus::Granted)
    }

    /// Return the human-readable part of this status' description.
    fn reason(self) -> &'static str {
        match self.normalize() {
            SocksStatus::Granted => "Request granted.",
            SocksStatus::RejectedGeneric => "Request rejected/failed - unknown reason.",
            SocksStatus::RejectedIdentdUnreachable => {
                "Request rejected: SOCKS server cannot connect to identd on the client."
            }
            SocksStatus::RejectedIdentdMismatch => {
                "Request rejected: the client program and identd report different user-ids."
            }
            SocksStatus::Unknown(_) => "Unknown SOCKS status code.",
        }
    }
}

impl PartialEq for SocksStatus {
    fn eq(&self, other: &SocksStatus) -> bool {
        u8::from(*self) == u8::from(*other)
    }
}

impl Eq for SocksStatus {}

impl std::hash::Hash for SocksStatus {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        u8::from(*self).hash(state);
    }
}

impl fmt::Display for SocksStatus {
    /// Format the status code followed by its meaning, as in
    /// `91 Request rejected/failed - unknown reason.`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", u8::from(*self), self.reason())
    }
}

/// Return a human-readable description of a SOCKS4 status byte.
pub fn describe(status: u8) -> String {
    SocksStatus::from(status).to_string()
}

/// A hostname that can be sent in a SOCKS4a request.
///
/// The hostname is a NUL-terminated field on the wire, so it can't
/// contain a NUL itself.  We also insist on ASCII: anything else
/// should be converted to punycode first.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SocksHostname(String);

impl TryFrom<String> for SocksHostname {
    type Error = Error;
    fn try_from(s: String) -> Result<SocksHostname> {
        if s.contains('\0') {
            Err(Error::BadHostname("contains a NUL byte"))
        } else if !s.is_ascii() {
            Err(Error::BadHostname("not ASCII"))
        } else {
            Ok(SocksHostname(s))
        }
    }
}

impl TryFrom<&str> for SocksHostname {
    type Error = Error;
    fn try_from(s: &str) -> Result<SocksHostname> {
        s.to_string().try_into()
    }
}

impl AsRef<str> for SocksHostname {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl From<SocksHostname> for String {
    fn from(s: SocksHostname) -> String {
        s.0
    }
}

impl fmt::Display for SocksHostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A SOCKS4a request, ready to be sent to a proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocksRequest {
    /// The command we want the proxy to perform.
    cmd: SocksCmd,
    /// The host to connect to or look up.
    hostname: SocksHostname,
    /// The target port.  Zero when the command doesn't need one.
    port: u16,
}

impl SocksRequest {
    /// Create a new SocksRequest for `host` and `port`.
    ///
    /// Return an error if `host` can't be sent as a SOCKS4a hostname.
    pub fn new(cmd: SocksCmd, host: &str, port: u16) -> Result<Self> {
        Ok(SocksRequest {
            cmd,
            hostname: SocksHostname::try_from(host)?,
            port,
        })
    }

    /// Create a request asking the proxy to open a stream to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::new(SocksCmd::Connect, host, port)
    }

    /// Create a request asking the proxy to look up `host`.
    ///
    /// Resolving doesn't need a port, so we send zero.
    pub fn resolve(host: &str) -> Result<Self> {
        Self::new(SocksCmd::Resolve, host, 0)
    }

    /// Return the command for this request.
    pub fn command(&self) -> SocksCmd {
        self.cmd
    }

    /// Return the hostname for this request.
    pub fn hostname(&self) -> &SocksHostname {
        &self.hostname
    }

    /// Return the port for this request.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Encode this request into the bytes that go on the wire.
    ///
    /// The result is always `10 + hostname.len()` bytes long: an
    /// 8-byte header, an empty NUL-terminated user id, and the
    /// NUL-terminated hostname.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Vec::with_capacity(10 + self.hostname.0.len());
        w.write(self);
        w
    }
}

impl Writeable for SocksRequest {
    fn write_onto<W: Writer + ?Sized>(&self, w: &mut W) {
        w.write_u8(SOCKS_VERSION);
        w.write_u8(self.cmd.into());
        w.write_u16(self.port);
        w.write(&SOCKS4A_FAKE_IP);
        // We never send a user id.
        w.write_nul_terminated(b"");
        w.write_nul_terminated(self.hostname.0.as_bytes());
    }
}

/// A reply from a SOCKS4 proxy.
///
/// Only the status is meaningful for every command.  For a granted
/// `RESOLVE`, the address is the answer; for `CONNECT`, the port and
/// address are whatever the proxy felt like sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocksReply {
    /// Version byte sent by the proxy; should be [`REPLY_VERSION`].
    version: u8,
    /// Whether the request was granted.
    status: SocksStatus,
    /// Port field from the reply.
    port: u16,
    /// Address field from the reply.
    addr: Ipv4Addr,
}

impl SocksReply {
    /// Decode a reply from exactly [`REPLY_LEN`] bytes.
    pub fn decode(input: &[u8]) -> Result<Self> {
        let mut r = Reader::from_slice(input);
        let reply = r.extract()?;
        r.should_be_exhausted()?;
        Ok(reply)
    }

    /// Return the version byte that the proxy sent.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Return true if the version byte is the one SOCKS4 says to send.
    ///
    /// Plenty of proxies get this wrong, so a bad version shouldn't
    /// be treated as fatal.
    pub fn version_ok(&self) -> bool {
        self.version == REPLY_VERSION
    }

    /// Return the status of this reply.
    pub fn status(&self) -> SocksStatus {
        self.status
    }

    /// Return the port field of this reply.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Return the address field of this reply.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
}

impl Readable for SocksReply {
    fn take_from(r: &mut Reader<'_>) -> Result<Self> {
        let version = r.take_u8()?;
        let status = r.take_u8()?.into();
        let port = r.take_u16()?;
        let addr = r.extract()?;
        Ok(SocksReply {
            version,
            status,
            port,
            addr,
        })
    }
}

#[cfg(test)]
impl SocksReply {
    /// Construct a reply by hand, for testing.
    pub(crate) fn new(version: u8, status: SocksStatus, port: u16, addr: Ipv4Addr) -> Self {
        SocksReply {
            version,
            status,
            port,
            addr,
        }
    }
}
