//! # Course guard
//!
//! Detects when the walker has joined the route somewhere other than the expected node, for
//! example by cutting a corner, and names the node the target should snap to.
//!
//! When a heading is known, nodes more than 90 degrees either side of it are behind the walker and
//! are never snapped to. Without a heading the check falls back to the plain nearest node, which
//! can snap backwards along the route.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::route::NodeId;
use log::debug;
use serde::Serialize;

use crate::{
    geodesy::{distance_m, initial_bearing_deg, signed_angle_diff, GeoPoint},
    route_graph::RouteGraph,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Nodes further than this from the heading are considered behind the walker.
pub const MAX_FORWARD_ANGLE_DEG: f64 = 90.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CourseGuard {
    /// A node must be closer than this to be snapped to
    threshold_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CourseStatus {
    OnCourse,

    /// A node ahead of the walker is closer than the expected one
    OffCourse {
        snap_to: NodeId,
        distance_m: f64,
        expected_distance_m: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CourseGuard {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    /// Check the walker's position against the expected node of the route.
    ///
    /// `came_from` is the node the walker last left and is never snapped to. The walker is usually
    /// still standing on it, where its bearing is undefined and would pass the forward filter. An
    /// expected node which isn't in the route is never off course.
    pub fn check(
        &self,
        graph: &RouteGraph,
        expected: NodeId,
        came_from: Option<NodeId>,
        position: &GeoPoint,
        heading_deg: Option<f64>,
    ) -> CourseStatus {
        let expected_node = match graph.node(expected) {
            Some(n) => n,
            None => return CourseStatus::OnCourse,
        };

        let expected_distance_m = distance_m(position, &expected_node.point);

        let mut best: Option<(NodeId, f64)> = None;

        for node in graph.nodes() {
            if Some(node.id) == came_from {
                continue;
            }

            if let Some(heading) = heading_deg {
                let bearing = initial_bearing_deg(position, &node.point);

                if signed_angle_diff(bearing, heading).abs() > MAX_FORWARD_ANGLE_DEG {
                    continue;
                }
            }

            let d = distance_m(position, &node.point);

            if d.is_nan() {
                continue;
            }

            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((node.id, d));
            }
        }

        match best {
            Some((id, d)) if id != expected && d < expected_distance_m && d < self.threshold_m => {
                debug!(
                    "Off course: node {} is {:.1} m away, expected node {} is {:.1} m away",
                    id, d, expected, expected_distance_m
                );

                CourseStatus::OffCourse {
                    snap_to: id,
                    distance_m: d,
                    expected_distance_m,
                }
            }
            _ => CourseStatus::OnCourse,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_graph::test::spec;

    fn decoy_graph() -> RouteGraph {
        RouteGraph::from_spec(
            "decoy",
            &[spec(1, 0.0, 0.0, &[2]), spec(2, 0.0, 0.0005, &[1])],
        )
    }

    #[test]
    fn test_snap_to_decoy() {
        let graph = decoy_graph();
        let guard = CourseGuard::new(100.0);
        let position = GeoPoint::new(0.0, 0.0004);

        // Facing east, towards the decoy and away from the expected node
        match guard.check(&graph, 1, None, &position, Some(90.0)) {
            CourseStatus::OffCourse {
                snap_to,
                distance_m,
                expected_distance_m,
            } => {
                assert_eq!(snap_to, 2);
                assert!(distance_m < expected_distance_m);
                assert!(expected_distance_m < 100.0);
            }
            s => panic!("Expected off course, got {:?}", s),
        }

        // Facing 30 degrees off the decoy's bearing still counts
        assert!(matches!(
            guard.check(&graph, 1, None, &position, Some(60.0)),
            CourseStatus::OffCourse { snap_to: 2, .. }
        ));
    }

    #[test]
    fn test_never_snaps_backwards() {
        let graph = decoy_graph();
        let guard = CourseGuard::new(100.0);
        let position = GeoPoint::new(0.0, 0.0004);

        // Facing west, the decoy is behind, the expected node ahead is the best
        assert_eq!(
            guard.check(&graph, 1, None, &position, Some(270.0)),
            CourseStatus::OnCourse
        );

        // North of the route and facing north, both nodes are behind
        assert_eq!(
            guard.check(&graph, 1, None, &GeoPoint::new(0.001, 0.0004), Some(0.0)),
            CourseStatus::OnCourse
        );
    }

    #[test]
    fn test_without_heading() {
        let graph = decoy_graph();
        let guard = CourseGuard::new(100.0);

        // Pure nearest node, even though the walker could be facing anywhere
        assert!(matches!(
            guard.check(&graph, 1, None, &GeoPoint::new(0.0, 0.0004), None),
            CourseStatus::OffCourse { snap_to: 2, .. }
        ));

        // Expected node is the nearest
        assert_eq!(
            guard.check(&graph, 1, None, &GeoPoint::new(0.0, 0.0001), None),
            CourseStatus::OnCourse
        );
    }

    #[test]
    fn test_threshold() {
        let graph = decoy_graph();
        let position = GeoPoint::new(0.0, 0.0004);

        // Decoy is about 11 m away
        assert_eq!(
            CourseGuard::new(5.0).check(&graph, 1, None, &position, Some(90.0)),
            CourseStatus::OnCourse
        );
        assert!(matches!(
            CourseGuard::new(20.0).check(&graph, 1, None, &position, Some(90.0)),
            CourseStatus::OffCourse { .. }
        ));
    }

    #[test]
    fn test_ignores_node_left_behind() {
        let graph = decoy_graph();
        let guard = CourseGuard::new(100.0);

        // Target already moved on to 2 but the walker is still standing on 1
        assert_eq!(
            guard.check(&graph, 2, Some(1), &GeoPoint::new(0.0, 0.0), Some(90.0)),
            CourseStatus::OnCourse
        );
        assert!(matches!(
            guard.check(&graph, 2, None, &GeoPoint::new(0.0, 0.0), Some(90.0)),
            CourseStatus::OffCourse { snap_to: 1, .. }
        ));
    }

    #[test]
    fn test_unknown_expected() {
        let graph = decoy_graph();
        let guard = CourseGuard::new(100.0);

        assert_eq!(
            guard.check(&graph, 7, None, &GeoPoint::new(0.0, 0.0004), None),
            CourseStatus::OnCourse
        );
    }
}
