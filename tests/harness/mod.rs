//! Shared helpers for channel integration tests.
//!
//! Peers run over loopback TCP on kernel-assigned ports, or over Unix
//! sockets in a temporary directory.

#![allow(dead_code)]

use std::time::Duration;

use cosimlink::{Channel, Config, ConnectRetry, Endpoint, Listener};

/// Bind a loopback listener on a free port.
pub fn loopback_listener() -> (Listener, Endpoint) {
    let listener = Listener::bind(&Endpoint::tcp("127.0.0.1:0")).unwrap();
    let endpoint = listener.local_endpoint().unwrap();
    (listener, endpoint)
}

/// Client config that keeps retrying while the server starts up.
pub fn patient_client(endpoint: Endpoint) -> Config {
    Config::client(endpoint).with_retry(ConnectRetry::new(100, Duration::from_millis(20)))
}

/// Two open channels connected to each other: `(server, client)`.
///
/// The client connects before the server accepts; the kernel backlog holds
/// the connection in between, so no thread is needed.
pub fn connected_pair() -> (Channel, Channel) {
    let (listener, endpoint) = loopback_listener();
    let mut client = Channel::new(Config::client(endpoint));
    client.open().unwrap();
    let mut server = Channel::new(Config::default());
    server.open_from(listener).unwrap();
    (server, client)
}

/// Read exactly `len` bytes, failing the test on early shutdown.
pub fn recv_exact(channel: &mut Channel, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let mut got = 0;
    while got < len {
        let n = channel.recv(&mut out[got..]).unwrap();
        assert_ne!(n, 0, "peer shut down after {got} of {len} bytes");
        got += n;
    }
    out
}

/// Read until the peer shuts down.
pub fn recv_to_end(channel: &mut Channel, chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let bytes = channel.recv_vec(chunk).unwrap();
        if bytes.is_empty() {
            return out;
        }
        out.extend_from_slice(&bytes);
    }
}

pub mod sim;
