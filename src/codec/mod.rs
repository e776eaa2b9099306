//! Message framing over a raw channel.
//!
//! The [`Channel`](crate::Channel) is a plain byte stream. This module adds an
//! opt-in framing layer for callers that want one `recv` to yield exactly one
//! message.

mod framed;
mod framing;

pub use framed::FramedChannel;
pub use framing::{Framing, LENGTH_PREFIX_SIZE};

use crate::error::Result;

/// A bidirectional message transport.
///
/// [`FramedChannel`] is the production implementation; the protocol session
/// only depends on this trait.
pub trait MessagePort {
    /// Send one whole message.
    ///
    /// # Errors
    ///
    /// Returns the transport's error.
    fn send_message(&mut self, payload: &[u8]) -> Result<()>;

    /// Receive one whole message, `None` on orderly shutdown.
    ///
    /// # Errors
    ///
    /// Returns the transport's error.
    fn recv_message(&mut self) -> Result<Option<Vec<u8>>>;
}

impl<P: MessagePort + ?Sized> MessagePort for &mut P {
    fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send_message(payload)
    }

    fn recv_message(&mut self) -> Result<Option<Vec<u8>>> {
        (**self).recv_message()
    }
}
