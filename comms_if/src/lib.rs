//! # Communications interface crate.
//!
//! Provides the data contracts shared between the navigation core and its
//! collaborators: the sensor streams, the route data source and the wristband
//! signalling channel.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Navigation commands and scripted inputs
pub mod cmd;

/// Route data as supplied by the route data collaborator
pub mod route;

/// Position fixes and heading samples
pub mod sensor;

/// Wristband signalling contract
pub mod signal;
