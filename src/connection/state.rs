//! Channel lifecycle state.

/// Channel state.
///
/// A channel starts `Closed`, becomes `Open` after a successful `open`, and
/// returns to `Closed` on `close`. Successful sends and receives never change
/// the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No socket is held. Initial and terminal state.
    #[default]
    Closed,
    /// A socket is held and usable for send/recv.
    Open,
}

impl ConnectionState {
    /// Check if sending or receiving is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Check if `open` may be called in this state.
    #[must_use]
    #[inline]
    pub const fn can_open(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Closed => write!(f, "Closed"),
            ConnectionState::Open => write!(f, "Open"),
        }
    }
}
