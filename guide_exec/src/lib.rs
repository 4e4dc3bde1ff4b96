//! # Guidance library.
//!
//! This library allows other crates in the workspace (and the benches) to access items defined
//! inside the guidance crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geodesy kernel - distances, bearings and angle arithmetic on the sphere
pub mod geodesy;

/// Heading filter - smooths the raw compass heading
pub mod heading_filter;

/// Route graph - the waypoints of a route and how they connect
pub mod route_graph;

/// Waypoint advancer - decides when the current target has been reached
pub mod waypoint;

/// Course guard - detects when the walker has strayed onto another part of the route
pub mod course_guard;

/// Turn advisor - turns heading and bearing into a left/right/ahead cue
pub mod turn_advisor;

/// Signal client - delivers cues to the wristband
pub mod signal_client;

/// Navigation manager - the session tying all of the above together
pub mod nav_mgr;
