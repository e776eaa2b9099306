//! Stand-in simulator: connects to the controller and answers its commands
//! until told to close.
//!
//! Run with: cargo run --example simulator
//!
//! Uses the same `COSIM_*` variables as the controller, forced to the
//! client role, and retries the connect for a few seconds so either side
//! can start first.

use std::error::Error;
use std::time::Duration;

use cosimlink::protocol::{Command, Message, RESP, SimState};
use cosimlink::{Channel, Config, ConnectRetry, FramedChannel, Framing, Role};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?
        .with_role(Role::Client)
        .with_retry(ConnectRetry::new(50, Duration::from_millis(100)));
    let mut port = FramedChannel::new(Channel::new(config), Framing::lines());
    port.open()?;
    println!("Connected to controller");

    let mut state = SimState::Connected;
    let mut inputs: Vec<String> = Vec::new();

    while let Some(bytes) = port.recv_message()? {
        let message = Message::from_bytes(&bytes)?;
        let reply = match Command::try_from(message) {
            Ok(Command::Close) => {
                println!("Controller closed the session");
                break;
            }
            Ok(Command::Get(name)) if name == "state" => Message::resp([state.index().to_string()]),
            Ok(Command::Set { name, value }) if name == "delay" => {
                println!("delay set to {value}");
                Message::bare(RESP)
            }
            Ok(Command::Import(values)) => {
                inputs = values;
                Message::bare(RESP)
            }
            // Outputs are the inputs incremented, as hex.
            Ok(Command::Export) => Message::resp(inputs.iter().map(|v| {
                u64::from_str_radix(v, 16)
                    .map(|n| format!("{:x}", n.wrapping_add(1)))
                    .unwrap_or_else(|_| "x".into())
            })),
            Ok(Command::Continue) => {
                state = match state {
                    SimState::Import => SimState::Export,
                    SimState::Export => SimState::Delay,
                    _ => SimState::Import,
                };
                Message::bare(RESP)
            }
            Ok(other) => Message::new("ERR", [format!("unsupported {}", other.kind())]),
            Err(e) => Message::new("ERR", [e.to_string().replace(',', ";")]),
        };
        port.send_message(reply.encode()?.as_bytes())?;
    }

    port.close()?;
    Ok(())
}
