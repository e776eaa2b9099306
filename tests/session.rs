//! Controller sessions against a live toy simulator.

mod harness;

use std::thread;

use cosimlink::protocol::{Command, Session, SimState};
use cosimlink::{Channel, Config, Endpoint, Error, FramedChannel, Framing};
use harness::sim::ToySim;
use harness::{loopback_listener, patient_client};

/// Run `ToySim` as the client side, returning it once it stops.
fn spawn_simulator(endpoint: Endpoint, framing: Framing) -> thread::JoinHandle<ToySim> {
    thread::spawn(move || {
        let mut port = FramedChannel::new(Channel::new(patient_client(endpoint)), framing);
        port.open().unwrap();
        let mut sim = ToySim::default();
        sim.serve(&mut port).unwrap();
        port.close().unwrap();
        sim
    })
}

fn controller(framing: Framing) -> (Session<FramedChannel>, thread::JoinHandle<ToySim>) {
    let (listener, endpoint) = loopback_listener();
    let simulator = spawn_simulator(endpoint, framing);
    let mut channel = Channel::new(Config::default());
    channel.open_from(listener).unwrap();
    (Session::new(FramedChannel::new(channel, framing)), simulator)
}

#[test]
fn test_full_run_over_lines() {
    let (mut session, simulator) = controller(Framing::lines());

    assert_eq!(session.sim_state().unwrap(), SimState::Import);
    session.set_delay(10).unwrap();
    session.import(&["1", "ff"]).unwrap();
    session.resume().unwrap();
    assert_eq!(session.sim_state().unwrap(), SimState::Export);
    assert_eq!(session.export().unwrap(), vec!["ff", "1"]);
    session.finish().unwrap();
    assert!(session.is_closed());

    let sim = simulator.join().unwrap();
    assert_eq!(sim.delay, 10);
    assert_eq!(sim.state, SimState::Delay);
    assert_eq!(sim.log.last(), Some(&Command::Close));
}

#[test]
fn test_finish_drains_to_delay() {
    let (mut session, simulator) = controller(Framing::LengthPrefixed);
    session.finish().unwrap();

    let sim = simulator.join().unwrap();
    assert_eq!(
        sim.log,
        vec![
            Command::get_state(),
            Command::Continue,
            Command::get_state(),
            Command::Continue,
            Command::get_state(),
            Command::Close,
        ]
    );
}

#[test]
fn test_error_reply_is_protocol_error() {
    let (mut session, simulator) = controller(Framing::lines());

    let reply = session
        .command(&Command::Get("voltage".into()))
        .unwrap()
        .unwrap();
    assert_eq!(reply.kind, "ERR");
    assert!(matches!(
        session.import(&["a,b"]),
        Err(Error::InvalidArgument(_))
    ));

    session.close().unwrap();
    simulator.join().unwrap();
}

#[test]
fn test_drop_sends_close() {
    let (session, simulator) = controller(Framing::c_strings());
    drop(session);

    let sim = simulator.join().unwrap();
    assert_eq!(sim.log, vec![Command::Close]);
}

#[test]
fn test_simulator_hangup_is_disconnect() {
    let (listener, endpoint) = loopback_listener();
    let simulator = thread::spawn(move || {
        let mut channel = Channel::new(patient_client(endpoint));
        channel.open().unwrap();
        channel.close().unwrap();
    });
    let mut channel = Channel::new(Config::default());
    channel.open_from(listener).unwrap();
    simulator.join().unwrap();

    let mut session = Session::new(FramedChannel::new(channel, Framing::lines()));
    let err = session.sim_state().unwrap_err();
    assert!(err.is_disconnect());
}
