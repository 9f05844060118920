//! Configuration for finding the SOCKS proxy.

use serde::Deserialize;

/// Host that Tor listens on for SOCKS connections by default.
const DEFAULT_HOST: &str = "localhost";

/// Port that Tor listens on for SOCKS connections by default.
const DEFAULT_PORT: u16 = 9050;

/// Where to find the SOCKS proxy that we send our requests to.
///
/// This is fixed once a client is built.  To use a different proxy,
/// make a different client.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Hostname or address of the proxy.
    #[serde(default = "default_host")]
    host: String,
    /// TCP port of the proxy.
    #[serde(default = "default_port")]
    port: u16,
}

/// Return the default value for [`ProxyConfig::host`].
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Return the default value for [`ProxyConfig::port`].
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ProxyConfig {
    /// Make a configuration for the proxy at `host:port`.
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        ProxyConfig {
            host: host.into(),
            port,
        }
    }

    /// Return the hostname or address of the proxy.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Return the port of the proxy.
    pub fn port(&self) -> u16 {
        self.port
    }
}
