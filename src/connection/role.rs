//! Channel role (client or server).

use std::str::FromStr;

use crate::error::Error;

/// Which side establishes the connection.
///
/// The role is a fixed configuration choice, not a per-call decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Client role - connects to a listening controller.
    #[default]
    Client,
    /// Server role - binds the endpoint and accepts exactly one peer.
    Server,
}

impl Role {
    /// Check if this role initiates the connection.
    #[inline]
    #[must_use]
    pub const fn connects(&self) -> bool {
        matches!(self, Role::Client)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "Client"),
            Role::Server => write!(f, "Server"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "connect" => Ok(Role::Client),
            "server" | "listen" => Ok(Role::Server),
            other => Err(Error::InvalidArgument(format!("unknown role {other:?}"))),
        }
    }
}
