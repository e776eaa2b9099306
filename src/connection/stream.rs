//! Stream sockets behind a channel.
//!
//! [`Stream`] unifies TCP and Unix domain stream sockets so the channel does
//! not care which transport the endpoint names. [`Listener`] is the server
//! side: bind once, accept exactly one peer.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Endpoint;
use crate::error::{Error, Result};

/// A connected, blocking stream socket.
#[derive(Debug)]
pub enum Stream {
    /// TCP stream.
    Tcp(TcpStream),
    /// Unix domain stream socket.
    #[cfg(unix)]
    Unix(UnixStream),
}

// std rejects zero-length deadlines; treat them as "no deadline".
fn deadline(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|d| !d.is_zero())
}

impl Stream {
    /// Connect to `endpoint`, bounding each TCP attempt by `timeout`.
    ///
    /// Unix domain sockets connect immediately or fail, so `timeout` does not
    /// apply to them.
    pub fn connect(endpoint: &Endpoint, timeout: Option<Duration>) -> io::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let Some(timeout) = deadline(timeout) else {
                    return TcpStream::connect(addr.as_str()).map(Stream::Tcp);
                };
                let mut last_err = None;
                for socket_addr in addr.as_str().to_socket_addrs()? {
                    match TcpStream::connect_timeout(&socket_addr, timeout) {
                        Ok(stream) => return Ok(Stream::Tcp(stream)),
                        Err(e) => last_err = Some(e),
                    }
                }
                Err(last_err.unwrap_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{addr} did not resolve to any address"),
                    )
                }))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixStream::connect(path).map(Stream::Unix),
        }
    }

    /// Set the read deadline.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = deadline(timeout);
        match self {
            Stream::Tcp(stream) => stream.set_read_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.set_read_timeout(timeout),
        }
    }

    /// Set the write deadline.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        let timeout = deadline(timeout);
        match self {
            Stream::Tcp(stream) => stream.set_write_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.set_write_timeout(timeout),
        }
    }

    /// Set `TCP_NODELAY`. A no-op for Unix sockets.
    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.set_nodelay(nodelay),
            #[cfg(unix)]
            Stream::Unix(_) => Ok(()),
        }
    }

    /// Shut down one or both directions.
    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.shutdown(how),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.shutdown(how),
        }
    }

    /// Human-readable peer identity for logs.
    #[must_use]
    pub fn peer(&self) -> String {
        match self {
            Stream::Tcp(stream) => stream
                .peer_addr()
                .map_or_else(|_| "tcp:?".to_string(), |addr| addr.to_string()),
            #[cfg(unix)]
            Stream::Unix(_) => "unix-peer".to_string(),
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.flush(),
        }
    }
}

#[derive(Debug)]
enum ListenerInner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix {
        listener: UnixListener,
        path: PathBuf,
    },
}

/// A bound listening socket that hands out exactly one connection.
///
/// Binding separately from accepting lets a supervisor learn the real
/// address (for example after binding port 0) before it launches the peer.
/// A Unix socket file created by [`Listener::bind`] is removed on drop.
#[derive(Debug)]
pub struct Listener {
    inner: ListenerInner,
}

impl Listener {
    /// Bind `endpoint`.
    ///
    /// A leftover Unix socket at the path is removed first. Any other kind
    /// of file there is left alone and the bind fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the address is in use or not permitted,
    /// or if a Unix endpoint path names something other than a socket. Any
    /// other failure is a transport error.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        let inner = match endpoint {
            Endpoint::Tcp(addr) => {
                ListenerInner::Tcp(TcpListener::bind(addr.as_str()).map_err(Error::from_open)?)
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                remove_stale_socket(path)?;
                let listener = UnixListener::bind(path).map_err(Error::from_open)?;
                ListenerInner::Unix {
                    listener,
                    path: path.clone(),
                }
            }
        };
        tracing::debug!(%endpoint, "listener bound");
        Ok(Self { inner })
    }

    /// The endpoint actually bound, with the kernel-assigned port for TCP.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the socket address cannot be queried.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match &self.inner {
            ListenerInner::Tcp(listener) => Ok(Endpoint::tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            ListenerInner::Unix { path, .. } => Ok(Endpoint::unix(path.clone())),
        }
    }

    /// Block until one peer connects, then release the listening socket.
    pub(crate) fn accept(self) -> io::Result<Stream> {
        match &self.inner {
            ListenerInner::Tcp(listener) => {
                let (stream, addr) = listener.accept()?;
                tracing::trace!(%addr, "accepted tcp peer");
                Ok(Stream::Tcp(stream))
            }
            #[cfg(unix)]
            ListenerInner::Unix { listener, path } => {
                let (stream, _) = listener.accept()?;
                tracing::trace!(path = %path.display(), "accepted unix peer");
                Ok(Stream::Unix(stream))
            }
        }
    }
}

// Only a socket may be replaced; the path is user-supplied.
#[cfg(unix)]
fn remove_stale_socket(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::FileTypeExt;

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::debug!(path = %path.display(), "removing stale socket");
            std::fs::remove_file(path).map_err(Error::from_open)
        }
        Ok(_) => Err(Error::Resource(format!(
            "{} exists and is not a socket",
            path.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::from_open(e)),
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let ListenerInner::Unix { path, .. } = &self.inner {
            let _ = std::fs::remove_file(path);
        }
    }
}
