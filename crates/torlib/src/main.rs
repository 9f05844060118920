//! A command-line tool for anonymous lookups and connections through Tor.
//!
//! `torlib` talks SOCKS4a to a running Tor client (by default at
//! `localhost:9050`).  It can do two things:
//!
//!   * `torlib resolve HOST` asks Tor to look up `HOST`, and prints the
//!     address it gets back.
//!   * `torlib connect HOST PORT` asks Tor to open a stream to
//!     `HOST:PORT`, and then relays stdin and stdout over it, like a
//!     very small netcat.
//!
//! Options come from a built-in set of defaults, then from a
//! configuration file (`-f`, or `torlib.toml` in the usual per-user
//! place), then from `-c key=value` arguments.

#![warn(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod conf;
mod exit;
mod relay;

use conf::TorlibConfig;
use torlib_client::{Resolution, Socks4aClient};
use torlib_rtcompat::SpawnBlocking;

use anyhow::{anyhow, Context, Result};
use argh::FromArgs;
use tracing::{info, Level};

#[derive(FromArgs, Debug, Clone)]
/// Resolve hostnames and open TCP streams through a Tor SOCKS port.
struct Args {
    /// override the default location(s) for the configuration file
    #[argh(option, short = 'f')]
    rc: Vec<String>,
    /// override a configuration option (as key=value)
    #[argh(option, short = 'c')]
    cfg: Vec<String>,
    /// what to do
    #[argh(subcommand)]
    cmd: Command,
}

#[derive(FromArgs, Debug, Clone)]
#[argh(subcommand)]
/// A thing that we can ask the proxy to do.
enum Command {
    /// Look up a hostname.
    Resolve(ResolveCmd),
    /// Open a stream.
    Connect(ConnectCmd),
}

#[derive(FromArgs, Debug, Clone)]
#[argh(subcommand, name = "resolve")]
/// Look up the IPv4 address of a hostname, without using local DNS.
struct ResolveCmd {
    /// the hostname to look up
    #[argh(positional)]
    host: String,
}

#[derive(FromArgs, Debug, Clone)]
#[argh(subcommand, name = "connect")]
/// Open a TCP stream to a host and port, and relay it to stdin/stdout.
struct ConnectCmd {
    /// the host to connect to
    #[argh(positional)]
    host: String,
    /// the port to connect to
    #[argh(positional)]
    port: u16,
}

/// Install a tracing subscriber that writes to stderr.
fn setup_logging(config: &TorlibConfig) {
    let level = if config.trace() {
        Level::TRACE
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let dflt_config = conf::default_config_file();

    let mut cfg = conf::defaults()?;
    conf::load(&mut cfg, dflt_config, &args.rc, &args.cfg)?;

    let config: TorlibConfig = cfg.try_into()?;

    setup_logging(&config);
    info!(
        "Using SOCKS proxy at {}:{}",
        config.proxy().host(),
        config.proxy().port()
    );

    let runtime = torlib_rtcompat::create_runtime().context("Couldn't start runtime")?;
    let client = Socks4aClient::new(runtime.clone(), config.proxy().clone());

    runtime.block_on(async {
        match args.cmd {
            Command::Resolve(ResolveCmd { host }) => match client.resolve(&host).await {
                Resolution::Resolved(addr) => {
                    println!("{}", addr);
                    Ok(())
                }
                Resolution::Unresolved => Err(anyhow!("Unable to resolve {:?}", host)),
            },
            Command::Connect(ConnectCmd { host, port }) => {
                relay::run_connect(&client, &host, port).await
            }
        }
    })
}
