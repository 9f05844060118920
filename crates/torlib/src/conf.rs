//! Find, merge, and parse our configuration.
//!
//! Configuration comes from three layers, each overriding the last: the
//! built-in defaults, one or more TOML files, and `-c key=value`
//! options from the command line.

use config::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use torlib_client::ProxyConfig;

/// Default options to use for our configuration.
pub(crate) const TORLIB_DEFAULTS: &str = include_str!("./torlib_defaults.toml");

/// Structure to hold our configuration options, whether from a
/// configuration file or the command line.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct TorlibConfig {
    /// Whether to log at trace level.
    trace: bool,
    /// Where to find the SOCKS proxy.
    proxy: ProxyConfig,
}

impl TorlibConfig {
    /// Return true if we should log at trace level.
    pub(crate) fn trace(&self) -> bool {
        self.trace
    }

    /// Return the configured proxy location.
    pub(crate) fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }
}

/// Build a fresh `config::Config` containing only our defaults.
pub(crate) fn defaults() -> Result<config::Config, ConfigError> {
    let mut cfg = config::Config::new();
    cfg.merge(config::File::from_str(
        TORLIB_DEFAULTS,
        config::FileFormat::Toml,
    ))?;
    Ok(cfg)
}

/// Merge files and command-line options into `cfg`.
///
/// The files should be toml.  Each option has the form `key=value`,
/// where `key` may be dotted (`proxy.port=9150`).
///
/// If `default_path` is present, and there is no list of files, then use a
/// default file if it exists.
pub(crate) fn load<'a, P1, C1, P2, C2>(
    cfg: &mut config::Config,
    default_path: Option<P1>,
    files: C1,
    opts: C2,
) -> Result<(), ConfigError>
where
    P1: AsRef<Path> + 'a,
    C1: IntoIterator<Item = &'a P2>,
    P2: AsRef<Path> + 'a,
    C2: IntoIterator,
    C2::Item: AsRef<str>,
{
    let mut search_path = Vec::new();
    for f in files {
        search_path.push(f.as_ref());
    }
    let mut missing_ok = false;
    if search_path.is_empty() {
        if let Some(f) = &default_path {
            search_path.push(f.as_ref());
            missing_ok = true;
        }
    }

    for p in search_path {
        let f: config::File<_> = p.into();
        cfg.merge(f.format(config::FileFormat::Toml).required(!missing_ok))?;
    }

    for opt in opts {
        let (key, value) = split_option(opt.as_ref())?;
        cfg.set(key, value)?;
    }

    Ok(())
}

/// Split a command-line option of the form `key=value`.
///
/// Whitespace around the key and the value is ignored, and so are
/// quotes around the value, so that `proxy.host="example.com"` works
/// too.
fn split_option(opt: &str) -> Result<(&str, &str), ConfigError> {
    let (key, value) = match opt.find('=') {
        Some(pos) => (opt[..pos].trim(), opt[pos + 1..].trim()),
        None => {
            return Err(ConfigError::Message(format!(
                "Option {:?} is not of the form key=value",
                opt
            )))
        }
    };
    if key.is_empty() {
        return Err(ConfigError::Message(format!(
            "Option {:?} has no key",
            opt
        )));
    }
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Ok((key, value))
}

/// Return a filename for the default user configuration file.
pub(crate) fn default_config_file() -> Option<PathBuf> {
    let pd = directories::ProjectDirs::from("org", "torlib", "torlib")?;

    Some(pd.config_dir().join("torlib.toml"))
}
