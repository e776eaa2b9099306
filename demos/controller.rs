//! Co-simulation controller: waits for a simulator, drives a few time
//! steps and shuts it down.
//!
//! Run with: cargo run --example controller
//!
//! Then start the simulator in another terminal:
//! `cargo run --example simulator`
//!
//! The endpoint comes from `COSIM_ENDPOINT` (default `127.0.0.1:60000`);
//! set `RUST_LOG=cosimlink=debug` to see every record.

use std::error::Error;

use cosimlink::protocol::{Session, SimState};
use cosimlink::{Channel, Config, FramedChannel, Framing, Role};
use tracing_subscriber::EnvFilter;

const STEPS: u32 = 4;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?.with_role(Role::Server);
    println!("Controller waiting for a simulator on {}", config.endpoint);

    let mut channel = Channel::new(config);
    channel.open()?;
    let mut session = Session::new(FramedChannel::new(channel, Framing::lines()));
    println!("Simulator connected, state {}", session.sim_state()?);

    session.set_delay(10)?;
    for step in 0..STEPS {
        match session.sim_state()? {
            SimState::Import => {
                let inputs = [step.to_string(), format!("{:x}", step * 16)];
                println!("step {step}: import {inputs:?}");
                session.import(&inputs)?;
            }
            SimState::Export => println!("step {step}: export {:?}", session.export()?),
            state => println!("step {step}: simulator in {state}"),
        }
        session.resume()?;
    }

    session.finish()?;
    println!("Simulator released");
    Ok(())
}
