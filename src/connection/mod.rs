//! Co-simulation channel management and state machine.
//!
//! This module provides the core [`Channel`] type: one blocking stream socket
//! between the simulator and its controller, with a strict lifecycle.
//!
//! ## Channel Lifecycle
//!
//! 1. **Closed** - Initial state, no socket held
//! 2. **Open** - After `open`; `send`/`recv` allowed
//! 3. **Closed** - After `close` (idempotent) or drop
//!
//! ## Example
//!
//! ```rust,no_run
//! use cosimlink::{Channel, Config, Endpoint};
//!
//! let mut channel = Channel::new(Config::server(Endpoint::tcp("127.0.0.1:60000")));
//! channel.open()?; // blocks until the simulator connects
//!
//! let mut buf = [0u8; 1024];
//! let n = channel.recv(&mut buf)?;
//! channel.send(&buf[..n])?;
//! channel.close()?;
//! # Ok::<(), cosimlink::Error>(())
//! ```

mod channel;
mod role;
mod state;
mod stream;

pub use channel::Channel;
pub use role::Role;
pub use state::ConnectionState;
pub use stream::{Listener, Stream};
