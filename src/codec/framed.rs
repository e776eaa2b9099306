use bytes::BytesMut;

use crate::codec::{Framing, MessagePort};
use crate::connection::Channel;
use crate::error::{Error, Result};

/// A [`Channel`] that exchanges whole messages instead of raw bytes.
///
/// Bytes read past the end of one message are kept for the next call, so a
/// peer may batch several messages into one write or split one message over
/// many.
#[derive(Debug)]
pub struct FramedChannel {
    channel: Channel,
    framing: Framing,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl FramedChannel {
    /// Wrap a channel, open or not.
    #[must_use]
    pub fn new(channel: Channel, framing: Framing) -> Self {
        let capacity = channel.config().read_buffer_size;
        Self {
            channel,
            framing,
            read_buf: BytesMut::with_capacity(capacity),
            write_buf: BytesMut::new(),
        }
    }

    /// Get the framing convention.
    #[must_use]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Get the underlying channel.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Number of received bytes not yet returned as a message.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.read_buf.len()
    }

    /// Open the underlying channel.
    ///
    /// # Errors
    ///
    /// Same as [`Channel::open`].
    pub fn open(&mut self) -> Result<()> {
        self.read_buf.clear();
        self.channel.open()
    }

    /// Frame and send one message.
    ///
    /// # Errors
    ///
    /// - Framing errors from [`Framing::encode`]; nothing is written
    /// - Any error from [`Channel::send`]
    pub fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        self.write_buf.clear();
        self.framing
            .encode(payload, &self.channel.config().limits, &mut self.write_buf)?;
        self.channel.send(&self.write_buf[..])
    }

    /// Receive the next whole message.
    ///
    /// Returns `Ok(None)` when the peer shut down cleanly between messages.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] with `Disconnected` if the peer shut down in
    ///   the middle of a message
    /// - [`Error::MessageTooLarge`] if the incoming message exceeds the limit
    /// - Any error from [`Channel::recv`]
    pub fn recv_message(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self.channel.config().read_buffer_size.max(1);
        loop {
            if let Some(message) = self
                .framing
                .decode(&mut self.read_buf, &self.channel.config().limits)?
            {
                return Ok(Some(message));
            }

            let start = self.read_buf.len();
            self.read_buf.resize(start + chunk, 0);
            let read = self.channel.recv(&mut self.read_buf[start..]);
            let n = *read.as_ref().unwrap_or(&0);
            self.read_buf.truncate(start + n);
            read?;

            if n == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None);
                }
                return Err(Error::disconnected(format!(
                    "peer shut down with {} bytes of an unfinished message buffered",
                    self.read_buf.len()
                )));
            }
        }
    }

    /// Drop any buffered input and close the channel.
    ///
    /// # Errors
    ///
    /// Same as [`Channel::close`]; the channel is closed either way.
    pub fn close(&mut self) -> Result<()> {
        self.read_buf.clear();
        self.channel.close()
    }

    /// Unwrap the channel. Buffered but unreturned input is discarded.
    #[must_use]
    pub fn into_inner(self) -> Channel {
        self.channel
    }
}

impl MessagePort for FramedChannel {
    fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        FramedChannel::send_message(self, payload)
    }

    fn recv_message(&mut self) -> Result<Option<Vec<u8>>> {
        FramedChannel::recv_message(self)
    }
}
