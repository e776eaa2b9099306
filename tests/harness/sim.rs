//! A toy simulator that answers controller commands.

use cosimlink::protocol::{Command, Message, RESP, SimState};
use cosimlink::{FramedChannel, Result};

/// Simulator interface state that cycles `Import -> Export -> Delay`.
#[derive(Debug)]
pub struct ToySim {
    pub state: SimState,
    pub delay: u64,
    pub inputs: Vec<String>,
    /// Every command received, in order.
    pub log: Vec<Command>,
}

impl Default for ToySim {
    fn default() -> Self {
        Self {
            state: SimState::Import,
            delay: 0,
            inputs: Vec::new(),
            log: Vec::new(),
        }
    }
}

impl ToySim {
    /// Reply to one command, `None` for `$CLOSE`.
    pub fn answer(&mut self, command: &Command) -> Option<Message> {
        self.log.push(command.clone());
        let reply = match command {
            Command::Get(name) if name == "state" => {
                Message::resp([self.state.index().to_string()])
            }
            Command::Get(name) => Message::new("ERR", [format!("unknown variable {name}")]),
            Command::Set { name, value } if name == "delay" => match value.parse() {
                Ok(delay) => {
                    self.delay = delay;
                    Message::bare(RESP)
                }
                Err(_) => Message::new("ERR", ["bad delay"]),
            },
            Command::Set { .. } => Message::new("ERR", ["read-only"]),
            Command::Import(values) => {
                self.inputs = values.clone();
                Message::bare(RESP)
            }
            // Outputs mirror the inputs in reverse port order.
            Command::Export => Message::resp(self.inputs.iter().rev().cloned()),
            Command::Continue => {
                self.state = match self.state {
                    SimState::Import => SimState::Export,
                    SimState::Export => SimState::Delay,
                    _ => SimState::Import,
                };
                Message::bare(RESP)
            }
            Command::Close => return None,
        };
        Some(reply)
    }

    /// Serve commands until `$CLOSE` or peer shutdown.
    pub fn serve(&mut self, port: &mut FramedChannel) -> Result<()> {
        while let Some(bytes) = port.recv_message()? {
            let command = Command::try_from(Message::from_bytes(&bytes)?)?;
            match self.answer(&command) {
                Some(reply) => port.send_message(reply.encode()?.as_bytes())?,
                None => break,
            }
        }
        Ok(())
    }
}
