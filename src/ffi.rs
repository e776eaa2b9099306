//! C ABI for simulators that load the bridge as a shared library.
//!
//! ```c
//! int socket_open(void);
//! int socket_send(const char* msg);
//! int socket_recv(char* msg, int max_len);
//! int socket_close(void);
//! ```
//!
//! The four functions share one process-wide [`Channel`] configured from the
//! `COSIM_*` environment variables when `socket_open` runs. They return `0`
//! (or, for `socket_recv`, a byte count) on success and the negative
//! [`Error::code`] on failure.
//!
//! The module is compiled only with the `ffi` feature. A shared library for
//! C consumers is built with
//! `cargo rustc --release --features ffi --crate-type cdylib`.

use std::ffi::{CStr, c_char, c_int};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::connection::Channel;
use crate::error::{Error, STATUS_OK, count_status, status};

static CHANNEL: Mutex<Option<Channel>> = Mutex::new(None);

// A panic while holding the lock cannot leave the Option half-written.
fn channel() -> MutexGuard<'static, Option<Channel>> {
    CHANNEL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open the process-wide channel.
#[unsafe(no_mangle)]
pub extern "C" fn socket_open() -> c_int {
    let mut slot = channel();
    if slot.as_ref().is_some_and(Channel::is_open) {
        return Error::AlreadyOpen.code();
    }

    let opened = Channel::from_env().and_then(|mut channel| {
        channel.open()?;
        Ok(channel)
    });
    match opened {
        Ok(channel) => {
            *slot = Some(channel);
            STATUS_OK
        }
        Err(e) => {
            tracing::warn!(error = %e, "socket_open failed");
            e.code()
        }
    }
}

/// Send a NUL-terminated string, without the terminator.
///
/// # Safety
///
/// `msg` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn socket_send(msg: *const c_char) -> c_int {
    if msg.is_null() {
        return Error::InvalidArgument("null message".into()).code();
    }
    // SAFETY: non-null and NUL-terminated per the function contract.
    let bytes = unsafe { CStr::from_ptr(msg) }.to_bytes();

    let result = match channel().as_mut() {
        Some(channel) => channel.send(bytes),
        None => Err(Error::NotConnected),
    };
    status(&result)
}

/// Read at most `max_len - 1` bytes into `msg` and NUL-terminate them.
///
/// Returns the number of bytes read, `0` on orderly peer shutdown. A
/// `max_len` below 2 leaves no room for data and is rejected without
/// touching `msg`.
///
/// # Safety
///
/// `msg` must be null or point to at least `max_len` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn socket_recv(msg: *mut c_char, max_len: c_int) -> c_int {
    if msg.is_null() || max_len < 2 {
        return Error::InvalidArgument(format!("max_len {max_len}")).code();
    }
    let len = max_len as usize;
    // SAFETY: non-null and valid for `max_len` bytes per the function contract;
    // `max_len >= 2` so the length is positive.
    let buf = unsafe { std::slice::from_raw_parts_mut(msg.cast::<u8>(), len) };

    let result = match channel().as_mut() {
        Some(channel) => channel.recv(&mut buf[..len - 1]),
        None => Err(Error::NotConnected),
    };
    if let Ok(n) = result {
        buf[n] = 0;
    }
    count_status(&result)
}

/// Close the process-wide channel. Always leaves it closed.
#[unsafe(no_mangle)]
pub extern "C" fn socket_close() -> c_int {
    let Some(mut channel) = channel().take() else {
        return STATUS_OK;
    };
    status(&channel.close())
}
