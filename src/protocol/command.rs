//! Typed commands the controller sends to the simulator.

use crate::error::{Error, Result};
use crate::protocol::Message;

/// A controller-to-simulator command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// `$GET,<name>` - query a simulator variable, usually `state`.
    Get(String),
    /// `$SET,<name>,<value>` - assign a simulator variable, usually `delay`.
    Set {
        /// Variable name.
        name: String,
        /// New value.
        value: String,
    },
    /// `$CONTINUE` - let the simulator run to its next stop.
    Continue,
    /// `$IMPORT,<v1>,...` - drive the simulator inputs, in port order.
    Import(Vec<String>),
    /// `$EXPORT` - collect the simulator outputs.
    Export,
    /// `$CLOSE` - end the session. The simulator does not answer.
    Close,
}

impl Command {
    /// Query the simulator state.
    #[must_use]
    pub fn get_state() -> Self {
        Command::Get("state".into())
    }

    /// Set the time step delay.
    #[must_use]
    pub fn set_delay(delay: u64) -> Self {
        Command::Set {
            name: "delay".into(),
            value: delay.to_string(),
        }
    }

    /// Wire type of this command.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::Continue => "CONTINUE",
            Command::Import(_) => "IMPORT",
            Command::Export => "EXPORT",
            Command::Close => "CLOSE",
        }
    }

    /// Whether the simulator answers this command.
    #[must_use]
    pub const fn expects_reply(&self) -> bool {
        !matches!(self, Command::Close)
    }

    /// Convert to a wire record.
    #[must_use]
    pub fn to_message(&self) -> Message {
        match self {
            Command::Get(name) => Message::new(self.kind(), [name.as_str()]),
            Command::Set { name, value } => {
                Message::new(self.kind(), [name.as_str(), value.as_str()])
            }
            Command::Import(values) => Message::new(self.kind(), values.iter().map(String::as_str)),
            Command::Continue | Command::Export | Command::Close => Message::bare(self.kind()),
        }
    }
}

impl TryFrom<Message> for Command {
    type Error = Error;

    fn try_from(message: Message) -> Result<Self> {
        let arity = |n: usize| -> Result<()> {
            if message.params.len() == n {
                Ok(())
            } else {
                Err(Error::Protocol(format!(
                    "{} takes {n} parameter(s), got {}",
                    message.kind,
                    message.params.len()
                )))
            }
        };

        match message.kind.as_str() {
            "GET" => {
                arity(1)?;
                Ok(Command::Get(message.params[0].clone()))
            }
            "SET" => {
                arity(2)?;
                Ok(Command::Set {
                    name: message.params[0].clone(),
                    value: message.params[1].clone(),
                })
            }
            "CONTINUE" => arity(0).map(|()| Command::Continue),
            "EXPORT" => arity(0).map(|()| Command::Export),
            "CLOSE" => arity(0).map(|()| Command::Close),
            "IMPORT" => Ok(Command::Import(message.params)),
            other => Err(Error::Protocol(format!("unknown command {other:?}"))),
        }
    }
}
