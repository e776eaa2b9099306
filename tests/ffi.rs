//! The C surface against a live peer.
//!
//! Needs the `ffi` feature: `cargo test --features ffi`. The four functions
//! share one process-wide channel and read the environment, so everything
//! runs inside a single test.

mod harness;

use std::ffi::c_char;

use cosimlink::config::{ENV_ENDPOINT, ENV_ROLE};
use cosimlink::ffi::{socket_close, socket_open, socket_recv, socket_send};
use cosimlink::{Channel, Config};
use harness::{loopback_listener, recv_exact};

fn set_env(key: &str, value: &str) {
    // SAFETY: this test binary runs a single test, no other thread reads the
    // environment.
    unsafe { std::env::set_var(key, value) };
}

/// Receive into `buf` until it holds `buf.len() - 1` bytes plus the NUL.
fn socket_recv_full(buf: &mut [c_char]) -> usize {
    let mut got = 0;
    while got + 1 < buf.len() {
        let max_len = (buf.len() - got) as i32;
        let n = unsafe { socket_recv(buf[got..].as_mut_ptr(), max_len) };
        assert!(n > 0, "socket_recv returned {n} after {got} bytes");
        got += n as usize;
    }
    got
}

#[test]
fn test_c_surface_round_trip() {
    // Malformed configuration is rejected before any socket is created.
    set_env(ENV_ROLE, "observer");
    assert_eq!(socket_open(), -4);
    set_env(ENV_ROLE, "client");

    // Nobody listening.
    let (listener, endpoint) = loopback_listener();
    drop(listener);
    set_env(ENV_ENDPOINT, &endpoint.to_string());
    assert_eq!(socket_open(), -3);

    let (listener, endpoint) = loopback_listener();
    set_env(ENV_ENDPOINT, &endpoint.to_string());
    assert_eq!(socket_open(), 0);
    assert_eq!(socket_open(), -2);

    let mut peer = Channel::new(Config::default());
    peer.open_from(listener).unwrap();

    assert_eq!(unsafe { socket_send(c"$RESP,4".as_ptr()) }, 0);
    let echoed = recv_exact(&mut peer, 7);
    assert_eq!(echoed, b"$RESP,4");
    peer.send(&echoed).unwrap();

    let mut buf = [0x55 as c_char; 8];
    assert_eq!(socket_recv_full(&mut buf), 7);
    assert_eq!(buf.map(|b| b as u8), *b"$RESP,4\0");

    // Orderly shutdown by the peer is sticky, and sending afterwards fails.
    peer.close().unwrap();
    assert_eq!(unsafe { socket_recv(buf.as_mut_ptr(), 8) }, 0);
    assert_eq!(buf[0], 0);
    assert_eq!(unsafe { socket_recv(buf.as_mut_ptr(), 8) }, 0);
    assert_eq!(unsafe { socket_send(c"$CLOSE".as_ptr()) }, -3);

    assert_eq!(socket_close(), 0);
    assert_eq!(socket_close(), 0);
    assert_eq!(unsafe { socket_send(c"$CLOSE".as_ptr()) }, -1);
    assert_eq!(unsafe { socket_recv(buf.as_mut_ptr(), 8) }, -1);
}
