//! Simulator command protocol.
//!
//! The controller drives the simulator with text records such as
//! `$GET,state` or `$IMPORT,1,ff`; the simulator answers each one (except
//! `$CLOSE`) with a single record, normally `$RESP[,value]*`. Records travel
//! as framed messages, see [`codec`](crate::codec).

mod command;
mod message;
mod session;
mod state;

pub use command::Command;
pub use message::{MARKER, Message, RESP, SEPARATOR};
pub use session::Session;
pub use state::SimState;
