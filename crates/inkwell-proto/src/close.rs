//! WebSocket close status codes.
//!
//! Only [`CloseCode::NORMAL`] counts as a deliberate closure. Every other code,
//! including `GOING_AWAY`, is treated as an unexpected drop by the reconnect
//! policy.

use std::fmt;

/// WebSocket close status (RFC 6455 §7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure, requested by the client.
    pub const NORMAL: Self = Self(1000);
    /// Endpoint going away (server shutdown, page navigation).
    pub const GOING_AWAY: Self = Self(1001);
    /// Close frame carried no status code.
    pub const NO_STATUS: Self = Self(1005);
    /// No close frame was received (connection dropped).
    pub const ABNORMAL: Self = Self(1006);
    /// Server hit an unexpected condition.
    pub const INTERNAL_ERROR: Self = Self(1011);

    /// Whether this is the normal-closure code.
    #[must_use]
    pub fn is_normal(self) -> bool {
        self == Self::NORMAL
    }

    /// Raw numeric code.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
