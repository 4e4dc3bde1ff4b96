//! # Signal Client
//!
//! This module provides the abstraction over the wristband link. The navigation manager is handed
//! a boxed [`SignalLink`] and never owns the transport or its connection management.
//!
//! Signals are fire and forget. A failure is returned to the caller to report, it never changes
//! the navigation state.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::signal::{Side, SignalError, SignalToken};
use log::info;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A link to the two haptic channels of the wristband.
pub trait SignalLink: Send {
    /// Send a token to one side of the wristband.
    fn send(&mut self, side: Side, token: SignalToken) -> Result<(), SignalError>;

    /// Whether the given side is currently connected.
    fn is_connected(&self, side: Side) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Link which writes each signal to the log, used when replaying without a wristband.
#[derive(Debug, Default)]
pub struct LogSignalLink {
    num_sent: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogSignalLink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalLink for LogSignalLink {
    fn send(&mut self, side: Side, token: SignalToken) -> Result<(), SignalError> {
        self.num_sent += 1;
        info!("Wristband signal #{} {}: {}", self.num_sent, side, token);
        Ok(())
    }

    fn is_connected(&self, _side: Side) -> bool {
        true
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Send a token to one side, refusing to send to a side that isn't connected.
pub fn dispatch(
    link: &mut dyn SignalLink,
    side: Side,
    token: SignalToken,
) -> Result<(), SignalError> {
    if !link.is_connected(side) {
        return Err(SignalError::Disconnected(side));
    }

    link.send(side, token)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Link which records everything sent through it.
    ///
    /// The record is shared so it can be inspected after the link has been boxed and handed over.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingLink {
        pub sent: Arc<Mutex<Vec<(Side, SignalToken)>>>,
        pub disconnected: Vec<Side>,
        pub fail_sends: bool,
    }

    impl RecordingLink {
        pub(crate) fn sent(&self) -> Vec<(Side, SignalToken)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SignalLink for RecordingLink {
        fn send(&mut self, side: Side, token: SignalToken) -> Result<(), SignalError> {
            if self.fail_sends {
                return Err(SignalError::SendFailed(side, "link dropped".into()));
            }

            self.sent.lock().unwrap().push((side, token));
            Ok(())
        }

        fn is_connected(&self, side: Side) -> bool {
            !self.disconnected.contains(&side)
        }
    }

    #[test]
    fn test_dispatch() {
        let mut link = RecordingLink {
            disconnected: vec![Side::Right],
            ..Default::default()
        };

        assert!(dispatch(&mut link, Side::Left, SignalToken::Left).is_ok());
        assert_eq!(
            dispatch(&mut link, Side::Right, SignalToken::Right),
            Err(SignalError::Disconnected(Side::Right))
        );
        assert_eq!(link.sent(), vec![(Side::Left, SignalToken::Left)]);

        link.fail_sends = true;
        assert!(matches!(
            dispatch(&mut link, Side::Left, SignalToken::Finish),
            Err(SignalError::SendFailed(Side::Left, _))
        ));
    }

    #[test]
    fn test_log_link() {
        let mut link = LogSignalLink::new();

        assert!(link.is_connected(Side::Left));
        assert!(dispatch(&mut link, Side::Right, SignalToken::Finish).is_ok());
    }
}
