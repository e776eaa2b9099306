//! Simulator interface states as reported by `$GET,state`.

use std::fmt;

use crate::error::{Error, Result};

/// Where the simulator side of the bridge is parked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SimState {
    /// Interface loaded, no controller yet.
    Started = 0,
    /// Controller connected.
    Connected = 1,
    /// Initial values applied.
    Initialized = 2,
    /// Waiting for input values.
    Import = 3,
    /// Outputs changed, waiting for the controller to collect them.
    Export = 4,
    /// Waiting for the next time step delay.
    Delay = 5,
}

impl SimState {
    /// All states in index order.
    pub const ALL: [SimState; 6] = [
        SimState::Started,
        SimState::Connected,
        SimState::Initialized,
        SimState::Import,
        SimState::Export,
        SimState::Delay,
    ];

    /// State for a wire index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(SimState::Started),
            1 => Some(SimState::Connected),
            2 => Some(SimState::Initialized),
            3 => Some(SimState::Import),
            4 => Some(SimState::Export),
            5 => Some(SimState::Delay),
            _ => None,
        }
    }

    /// Wire index of this state.
    #[must_use]
    pub const fn index(&self) -> u8 {
        *self as u8
    }

    /// Symbolic name, e.g. `S_DELAY`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SimState::Started => "S_STARTED",
            SimState::Connected => "S_CONNECTED",
            SimState::Initialized => "S_INITIALIZED",
            SimState::Import => "S_IMPORT",
            SimState::Export => "S_EXPORT",
            SimState::Delay => "S_DELAY",
        }
    }

    /// Parse the decimal index carried in a `$RESP` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for anything but a known index.
    pub fn parse_index(param: &str) -> Result<Self> {
        param
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_index)
            .ok_or_else(|| Error::Protocol(format!("unknown simulator state {param:?}")))
    }
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
