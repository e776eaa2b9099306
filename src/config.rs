//! Configuration for co-simulation channels.

use std::fmt;
#[cfg(unix)]
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::connection::Role;
use crate::error::{Error, Result};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:60000";

/// Environment variable naming the endpoint (`host:port` or `unix:<path>`).
pub const ENV_ENDPOINT: &str = "COSIM_ENDPOINT";
/// Environment variable naming the role (`client` or `server`).
pub const ENV_ROLE: &str = "COSIM_ROLE";
/// Environment variable with the connect timeout in milliseconds.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "COSIM_CONNECT_TIMEOUT_MS";
/// Environment variable with the read timeout in milliseconds.
pub const ENV_READ_TIMEOUT_MS: &str = "COSIM_READ_TIMEOUT_MS";
/// Environment variable with the write timeout in milliseconds.
pub const ENV_WRITE_TIMEOUT_MS: &str = "COSIM_WRITE_TIMEOUT_MS";
/// Environment variable with the number of connect attempts.
pub const ENV_CONNECT_ATTEMPTS: &str = "COSIM_CONNECT_ATTEMPTS";

const UNIX_PREFIX: &str = "unix:";

/// Where the channel connects to (client) or listens on (server).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Endpoint {
    /// TCP socket address in `host:port` form.
    Tcp(String),
    /// Unix domain stream socket at a filesystem path.
    #[cfg(unix)]
    Unix(PathBuf),
}

impl Endpoint {
    /// TCP endpoint.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Endpoint::Tcp(addr.into())
    }

    /// Unix domain socket endpoint.
    #[cfg(unix)]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix(path.into())
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::tcp(DEFAULT_ENDPOINT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{addr}"),
            #[cfg(unix)]
            Endpoint::Unix(path) => write!(f, "{UNIX_PREFIX}{}", path.display()),
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidArgument("empty endpoint".into()));
        }
        if let Some(path) = s.strip_prefix(UNIX_PREFIX) {
            #[cfg(unix)]
            {
                if path.is_empty() {
                    return Err(Error::InvalidArgument("empty unix socket path".into()));
                }
                return Ok(Endpoint::unix(path));
            }
            #[cfg(not(unix))]
            {
                let _ = path;
                return Err(Error::InvalidArgument(
                    "unix sockets are not supported on this platform".into(),
                ));
            }
        }
        if !s.contains(':') {
            return Err(Error::InvalidArgument(format!(
                "endpoint {s:?} is not host:port"
            )));
        }
        Ok(Endpoint::tcp(s))
    }
}

/// Socket deadlines applied when the channel is opened.
///
/// A `None` deadline blocks indefinitely, which is the default for reads and
/// writes: backpressure from a slow peer stalls the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Per-attempt connect timeout (client role only).
    ///
    /// Default: 5 seconds
    pub connect: Option<Duration>,

    /// Read timeout.
    ///
    /// Default: None
    pub read: Option<Duration>,

    /// Write timeout.
    ///
    /// Default: None
    pub write: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Some(Duration::from_secs(5)),
            read: None,
            write: None,
        }
    }
}

impl Timeouts {
    /// Create new timeouts with custom values.
    #[must_use]
    pub const fn new(
        connect: Option<Duration>,
        read: Option<Duration>,
        write: Option<Duration>,
    ) -> Self {
        Self {
            connect,
            read,
            write,
        }
    }
}

/// Connect retry policy for the client role.
///
/// The controller is often launched alongside the simulator, so the first
/// connect may race the controller's bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    /// Total connect attempts, at least 1.
    ///
    /// Default: 1
    pub attempts: u32,

    /// Pause between attempts.
    ///
    /// Default: 100 ms
    pub interval: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            attempts: 1,
            interval: Duration::from_millis(100),
        }
    }
}

impl ConnectRetry {
    /// Create a retry policy. `attempts` is clamped to at least 1.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            interval,
        }
    }
}

/// Limits for the framed message layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a single framed message in bytes.
    ///
    /// Default: 16 MB (16 * 1024 * 1024)
    pub max_message_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    /// Validate that message size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] if `size` exceeds the configured maximum.
    pub const fn check_message_size(&self, size: usize) -> Result<()> {
        if size > self.max_message_size {
            Err(Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoint to connect to or listen on.
    pub endpoint: Endpoint,

    /// Whether `open` connects or accepts.
    ///
    /// Default: Client
    pub role: Role,

    /// Socket deadlines.
    pub timeouts: Timeouts,

    /// Connect retry policy (client role only).
    pub retry: ConnectRetry,

    /// Disable Nagle's algorithm on TCP streams.
    ///
    /// Simulator exchanges are small request/reply pairs, so this defaults
    /// to `true`.
    pub nodelay: bool,

    /// Framing limits.
    pub limits: Limits,

    /// Read buffer capacity for the framed layer (in bytes).
    ///
    /// Default: 8 KB (8192)
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            role: Role::Client,
            timeouts: Timeouts::default(),
            retry: ConnectRetry::default(),
            nodelay: true,
            limits: Limits::default(),
            read_buffer_size: 8192,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a client that connects to `endpoint`.
    #[must_use]
    pub fn client(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            role: Role::Client,
            ..Default::default()
        }
    }

    /// Configure a server that accepts one peer on `endpoint`.
    #[must_use]
    pub fn server(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            role: Role::Server,
            ..Default::default()
        }
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set timeout configuration.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the connect retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: ConnectRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable `TCP_NODELAY`.
    #[must_use]
    pub const fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set read buffer size.
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Build a configuration from `COSIM_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint.parse()?;
        }
        if let Some(role) = lookup(ENV_ROLE) {
            config.role = role.parse()?;
        }
        if let Some(ms) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            config.timeouts.connect = parse_millis(ENV_CONNECT_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_READ_TIMEOUT_MS) {
            config.timeouts.read = parse_millis(ENV_READ_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_WRITE_TIMEOUT_MS) {
            config.timeouts.write = parse_millis(ENV_WRITE_TIMEOUT_MS, &ms)?;
        }
        if let Some(attempts) = lookup(ENV_CONNECT_ATTEMPTS) {
            let attempts: u32 = attempts.trim().parse().map_err(|_| {
                Error::InvalidArgument(format!("{ENV_CONNECT_ATTEMPTS}={attempts:?}"))
            })?;
            config.retry = ConnectRetry::new(attempts, config.retry.interval);
        }

        Ok(config)
    }
}

// `0` disables the deadline.
fn parse_millis(key: &str, value: &str) -> Result<Option<Duration>> {
    let ms: u64 = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("{key}={value:?}")))?;
    Ok((ms > 0).then(|| Duration::from_millis(ms)))
}
