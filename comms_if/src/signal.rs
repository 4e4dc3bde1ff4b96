//! # Wristband signalling
//!
//! The wristband has one haptic channel per side. The navigation core asks the
//! signalling collaborator to pulse a side with a short token, the transport
//! (and its connection manager) belong entirely to the collaborator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One side of the wristband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Tokens understood by the wristband firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalToken {
    /// Turn left, sent as `L`
    Left,

    /// Turn right, sent as `R`
    Right,

    /// Route finished, sent as `F`
    Finish,
}

/// Reasons a signal could not be delivered.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SignalError {
    #[error("The {0} side of the wristband is not connected")]
    Disconnected(Side),

    #[error("Sending to the {0} side failed: {1}")]
    SendFailed(Side, String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

impl SignalToken {
    /// The wire representation of the token.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalToken::Left => "L",
            SignalToken::Right => "R",
            SignalToken::Finish => "F",
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

impl Display for SignalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
