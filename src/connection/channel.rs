use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::thread;

use crate::config::Config;
use crate::connection::stream::{Listener, Stream};
use crate::connection::ConnectionState;
use crate::error::{Error, Result};

/// A blocking, unframed stream channel to a co-simulation peer.
///
/// `Channel` owns at most one socket. It starts [`ConnectionState::Closed`],
/// becomes `Open` after [`open`](Channel::open), and returns to `Closed` on
/// [`close`](Channel::close) or drop. All operations block the calling thread.
///
/// The channel carries raw bytes with no message boundaries: a single `recv`
/// may return part of what the peer sent in one `send`, or several sends
/// concatenated. Wrap the channel in a
/// [`FramedChannel`](crate::codec::FramedChannel) when discrete messages are
/// needed.
///
/// ## Example
///
/// ```rust,no_run
/// use cosimlink::{Channel, Config, Endpoint};
///
/// let mut channel = Channel::new(Config::client(Endpoint::tcp("127.0.0.1:60000")));
/// channel.open()?;
/// channel.send(b"$GET,state")?;
///
/// let mut buf = [0u8; 256];
/// let n = channel.recv(&mut buf)?;
/// if n == 0 {
///     // peer shut down
/// }
/// channel.close()?;
/// # Ok::<(), cosimlink::Error>(())
/// ```
#[derive(Debug)]
pub struct Channel {
    config: Config,
    stream: Option<Stream>,
    state: ConnectionState,
    peer_closed: bool,
}

impl Channel {
    /// Create a closed channel. No socket is acquired until `open`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stream: None,
            state: ConnectionState::Closed,
            peer_closed: false,
        }
    }

    /// Create a closed channel configured from `COSIM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a variable is malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Get the channel configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the channel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Check if a previous `recv` observed orderly shutdown by the peer.
    #[must_use]
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Establish the connection according to the configured role.
    ///
    /// A client connects to the endpoint, retrying as configured. A server
    /// binds the endpoint, accepts one peer and releases the listener.
    ///
    /// If anything fails partway the acquired socket is dropped and the
    /// channel stays `Closed`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyOpen`] if the channel is open; the live connection is untouched
    /// - [`Error::Resource`] if the socket cannot be created or bound
    /// - [`Error::Transport`] if the endpoint is unreachable or refuses
    pub fn open(&mut self) -> Result<()> {
        if !self.state.can_open() {
            return Err(Error::AlreadyOpen);
        }

        let stream = if self.config.role.connects() {
            self.connect()?
        } else {
            Listener::bind(&self.config.endpoint)?
                .accept()
                .map_err(Error::from_open)?
        };
        self.install(stream)
    }

    /// Server-role open on a listener the caller already bound.
    ///
    /// The listener is consumed whether or not a peer is accepted.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Channel::open).
    pub fn open_from(&mut self, listener: Listener) -> Result<()> {
        if !self.state.can_open() {
            return Err(Error::AlreadyOpen);
        }
        let stream = listener.accept().map_err(Error::from_open)?;
        self.install(stream)
    }

    fn connect(&self) -> Result<Stream> {
        let retry = self.config.retry;
        let mut attempt = 1;
        loop {
            match Stream::connect(&self.config.endpoint, self.config.timeouts.connect) {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < retry.attempts => {
                    tracing::debug!(
                        endpoint = %self.config.endpoint,
                        attempt,
                        error = %e,
                        "connect failed, retrying"
                    );
                    attempt += 1;
                    thread::sleep(retry.interval);
                }
                Err(e) => return Err(Error::from_open(e)),
            }
        }
    }

    fn install(&mut self, stream: Stream) -> Result<()> {
        stream
            .set_read_timeout(self.config.timeouts.read)
            .and_then(|()| stream.set_write_timeout(self.config.timeouts.write))
            .and_then(|()| stream.set_nodelay(self.config.nodelay))
            .map_err(Error::from_open)?;

        tracing::debug!(
            role = %self.config.role,
            endpoint = %self.config.endpoint,
            peer = %stream.peer(),
            "channel open"
        );
        self.stream = Some(stream);
        self.state = ConnectionState::Open;
        self.peer_closed = false;
        Ok(())
    }

    fn stream_mut(&mut self) -> Result<&mut Stream> {
        match self.stream.as_mut() {
            Some(stream) if self.state.is_open() => Ok(stream),
            _ => Err(Error::NotConnected),
        }
    }

    /// Write the whole payload, however many short writes that takes.
    ///
    /// Blocks while the peer applies backpressure. An empty payload succeeds
    /// without touching the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the channel is closed
    /// - [`Error::Transport`] with `Disconnected` if the peer is gone,
    ///   including after a `recv` has already reported shutdown
    /// - [`Error::Transport`] with `TimedOut` if the write deadline expires
    pub fn send(&mut self, payload: impl AsRef<[u8]>) -> Result<()> {
        let payload = payload.as_ref();
        let peer_closed = self.peer_closed;
        let stream = self.stream_mut()?;
        if peer_closed {
            return Err(Error::disconnected("peer has shut down the connection"));
        }
        if payload.is_empty() {
            return Ok(());
        }

        write_fully(stream, payload)?;
        tracing::trace!(len = payload.len(), "sent");
        Ok(())
    }

    /// Read up to `buf.len()` bytes, blocking until at least one arrives.
    ///
    /// Returns the number of bytes read. `Ok(0)` means the peer shut down in
    /// order; it is terminal, every later call returns `Ok(0)` at once and
    /// the caller should `close` the channel.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `buf` is empty (checked first, nothing blocks)
    /// - [`Error::NotConnected`] if the channel is closed
    /// - [`Error::Transport`] on reset or read deadline expiry
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::InvalidArgument("max_len must be positive".into()));
        }
        let peer_closed = self.peer_closed;
        let stream = self.stream_mut()?;
        if peer_closed {
            return Ok(0);
        }

        let n = read_some(stream, buf)?;
        if n == 0 {
            tracing::debug!("peer shut down");
            self.peer_closed = true;
        } else {
            tracing::trace!(len = n, "received");
        }
        Ok(n)
    }

    /// Like [`recv`](Channel::recv) but returns an owned buffer of the bytes read.
    ///
    /// An empty vector means orderly shutdown.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Channel::recv); `max_len == 0` is [`Error::InvalidArgument`].
    pub fn recv_vec(&mut self, max_len: usize) -> Result<Vec<u8>> {
        if max_len == 0 {
            return Err(Error::InvalidArgument("max_len must be positive".into()));
        }
        let mut buf = vec![0u8; max_len];
        let n = self.recv(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Release the socket and move to `Closed`.
    ///
    /// Closing a closed channel succeeds without doing anything. When the
    /// socket shutdown itself fails the error is logged and returned, but the
    /// socket is dropped and the channel is `Closed` regardless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if shutting down the socket failed.
    pub fn close(&mut self) -> Result<()> {
        self.state = ConnectionState::Closed;
        self.peer_closed = false;
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        let result = match stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already reset the connection; nothing left to release.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "socket shutdown failed");
                Err(e.into())
            }
        };
        drop(stream);
        tracing::debug!(endpoint = %self.config.endpoint, "channel closed");
        result
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Write all of `payload`, looping over short and interrupted writes.
fn write_fully<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < payload.len() {
        match writer.write(&payload[written..]) {
            Ok(0) => {
                return Err(Error::disconnected(format!(
                    "peer stopped accepting data after {written} of {} bytes",
                    payload.len()
                )));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    writer.flush()?;
    Ok(())
}

/// Single read that retries on `Interrupted`.
fn read_some<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}
