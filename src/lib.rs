//! # cosimlink - Simulator to controller socket bridge
//!
//! `cosimlink` connects a hardware/logic simulator to an out-of-process
//! co-simulation controller (testbench driver, reference model) over a
//! single blocking stream socket.
//!
//! ## Features
//!
//! - **Strict lifecycle**: `open → (send | recv)* → close`, with `close`
//!   idempotent and misuse reported as errors
//! - **Full writes**: `send` loops until the whole payload is on the wire
//! - **TCP or Unix sockets**, client or server role, fixed by configuration
//! - **Opt-in framing** (length prefix or delimiter) for message-per-call use
//! - **Simulator command protocol** (`$GET,state`, `$CONTINUE`, ...) and a
//!   controller [`Session`](protocol::Session)
//! - **C ABI** (`socket_open`/`send`/`recv`/`close`) behind the `ffi` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cosimlink::{Channel, Config, Endpoint};
//!
//! let mut channel = Channel::new(Config::client(Endpoint::tcp("127.0.0.1:60000")));
//! channel.open()?;
//! channel.send("PING")?;
//! let reply = channel.recv_vec(64)?;
//! channel.close()?;
//! # Ok::<(), cosimlink::Error>(())
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use codec::{FramedChannel, Framing, MessagePort};
pub use config::{Config, ConnectRetry, Endpoint, Limits, Timeouts};
pub use connection::{Channel, ConnectionState, Listener, Role, Stream};
pub use error::{Error, Result, TransportFailure};
