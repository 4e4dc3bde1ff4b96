//! Worker thread which owns the [`NavMgr`] so that fixes, heading samples and commands from
//! independent producers are applied one at a time.

// -----------------------------------------------------------------------------------------------
// INCLUDES
// -----------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError, SendError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::{
    cmd::NavCmd,
    sensor::{Fix, HeadingSample},
};
use log::{debug, warn};

use super::{NavEvent, NavMgr, NavMgrError, NavTm};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Runs a [`NavMgr`] on its own thread.
pub struct SampleWorker {
    worker_jh: JoinHandle<NavMgr>,

    worker_sender: Sender<NavInput>,
    worker_reciever: Receiver<NavOutput>,

    stop_handle: StopHandle,
}

/// Result of processing one input.
#[derive(Debug)]
pub struct NavOutput {
    /// Events caused by the input
    pub events: Vec<NavEvent>,

    /// Set if the input was a command which was rejected
    pub rejected: Option<NavMgrError>,

    /// Telemetry after the input was processed
    pub tm: NavTm,
}

/// Requests that navigation stops, from any thread.
///
/// Each request bumps a generation counter. The manager applies a stop whenever it sees a
/// generation it hasn't applied yet, including part way through processing a fix.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicU64>);

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum NavInput {
    Fix(Fix),
    Heading(HeadingSample),
    Cmd(NavCmd),

    /// The worker should stop and hand back the manager
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Could not start the worker thread: {0}")]
    SpawnError(std::io::Error),

    #[error("Failed to send input {0:?} to the worker")]
    SendError(NavInput),

    #[error("The worker thread panicked")]
    WorkerPanicked,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl SampleWorker {
    /// Move the manager onto a new worker thread.
    pub fn spawn(nav_mgr: NavMgr) -> Result<Self, WorkerError> {
        let stop_handle = nav_mgr.stop_handle();

        // Create channels
        let (worker_sender, rx) = channel();
        let (tx, worker_reciever) = channel();

        // Start worker thread
        let worker_jh = thread::Builder::new()
            .name("nav_mgr::worker".into())
            .spawn(move || worker_thread(nav_mgr, tx, rx))
            .map_err(WorkerError::SpawnError)?;

        Ok(Self {
            worker_jh,
            worker_sender,
            worker_reciever,
            stop_handle,
        })
    }

    /// A sender for a producer stream. Each stream should hold its own clone.
    pub fn input_sender(&self) -> Sender<NavInput> {
        self.worker_sender.clone()
    }

    pub fn send(&self, input: NavInput) -> Result<(), WorkerError> {
        self.worker_sender.send(input)?;
        Ok(())
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    /// Get the next output if one is ready.
    pub fn try_recv(&self) -> Option<NavOutput> {
        self.worker_reciever.try_recv().ok()
    }

    /// Wait up to `timeout` for the next output.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<NavOutput> {
        match self.worker_reciever.recv_timeout(timeout) {
            Ok(o) => Some(o),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop the worker once all inputs already sent are processed.
    ///
    /// Returns the manager along with any outputs not yet received.
    pub fn shutdown(self) -> Result<(NavMgr, Vec<NavOutput>), WorkerError> {
        self.worker_sender.send(NavInput::Shutdown)?;

        let nav_mgr = self
            .worker_jh
            .join()
            .map_err(|_| WorkerError::WorkerPanicked)?;

        let remaining = self.worker_reciever.try_iter().collect();

        Ok((nav_mgr, remaining))
    }
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl From<SendError<NavInput>> for WorkerError {
    fn from(e: SendError<NavInput>) -> Self {
        Self::SendError(e.0)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn worker_thread(
    mut nav_mgr: NavMgr,
    main_sender: Sender<NavOutput>,
    main_reciever: Receiver<NavInput>,
) -> NavMgr {
    // Wait for inputs from the producers
    while let Ok(input) = main_reciever.recv() {
        let (events, rejected) = match input {
            NavInput::Shutdown => break,
            NavInput::Fix(fix) => (nav_mgr.on_fix(fix), None),
            NavInput::Heading(sample) => (nav_mgr.on_heading(sample), None),
            NavInput::Cmd(cmd) => match nav_mgr.handle_cmd(cmd) {
                Ok(events) => (events, None),
                Err(e) => {
                    warn!("Navigation command rejected: {}", e);
                    (Vec::new(), Some(e))
                }
            },
        };

        let output = NavOutput {
            events,
            rejected,
            tm: nav_mgr.get_tm(),
        };

        // Nobody listening is not a reason to stop navigating
        if main_sender.send(output).is_err() {
            debug!("Output receiver dropped, discarding output");
        }
    }

    nav_mgr
}
