//! Socket lifecycle

use std::fmt;

/// Lifecycle of one [`TlsSocket`](super::TlsSocket).
///
/// `Created → Connecting → Handshaking → Established → Closed`, with any
/// pre-established state dropping to `Failed` on error or to `Closed` on an
/// explicit close. `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SocketState {
    Created = 0,
    Connecting = 1,
    Handshaking = 2,
    Established = 3,
    Closed = 4,
    Failed = 5,
}

impl SocketState {
    /// Decode a byte written as `state as u8`.
    ///
    /// # Panics
    ///
    /// On a byte no `SocketState` encodes to.
    pub(crate) fn from_u8(raw: u8) -> SocketState {
        match raw {
            0 => SocketState::Created,
            1 => SocketState::Connecting,
            2 => SocketState::Handshaking,
            3 => SocketState::Established,
            4 => SocketState::Closed,
            5 => SocketState::Failed,
            other => unreachable!("socket state byte {other} was never stored"),
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SocketState::Closed | SocketState::Failed)
    }

    #[must_use]
    pub fn can_transition_to(self, next: SocketState) -> bool {
        use SocketState::{Closed, Connecting, Created, Established, Failed, Handshaking};

        matches!(
            (self, next),
            (Created, Connecting)
                | (Connecting, Handshaking)
                | (Handshaking, Established)
                | (Created | Connecting | Handshaking, Failed)
                | (Created | Connecting | Handshaking | Established, Closed)
        )
    }
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocketState::Created => "created",
            SocketState::Connecting => "connecting",
            SocketState::Handshaking => "handshaking",
            SocketState::Established => "established",
            SocketState::Closed => "closed",
            SocketState::Failed => "failed",
        };
        f.write_str(name)
    }
}
