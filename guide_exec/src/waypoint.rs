//! # Waypoint advancer
//!
//! The advancer holds the navigation target and moves it along the route as the walker reaches
//! each waypoint. It has three states:
//!
//! - `Idle` - no route is being followed.
//! - `Navigating` - a target node is set and each fix is checked against it.
//! - `Completed` - the last node was reached. The target is kept for display but never changes
//!   again until a new route is selected or navigation is stopped.
//!
//! Processing a fix is split into [`WaypointAdvancer::evaluate`], which only reads the state, and
//! [`WaypointAdvancer::commit`], which applies the outcome. The owner can check that nothing has
//! cancelled navigation in between.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::{route::NodeId, sensor::Fix};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    geodesy::{distance_m, GeoPoint},
    route_graph::{RouteGraph, RouteNode},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The node currently being walked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    pub route_name: String,

    pub current: NodeId,

    /// The node the walker came from, always adjacent to `current` when set
    pub previous: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct WaypointAdvancer {
    /// Minimum arrival radius, widened by the accuracy of each fix
    arrival_threshold_m: f64,

    state: AdvancerState,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AdvancerState {
    Idle,
    Navigating(TargetState),
    Completed(TargetState),
}

/// State summary without the target, used in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    Idle,
    Navigating,
    Completed,
}

/// What a fix means for the current target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceDecision {
    /// Not arrived, or not navigating
    Hold,

    /// Arrived at `from`, step on to `to`
    Advance { from: NodeId, to: NodeId },

    /// Arrived at `from` and there is nowhere further to go
    Complete { from: NodeId },
}

/// A change of target produced by committing a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdvanceEvent {
    Advanced(NodeId),
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum WaypointError {
    #[error("Route \"{0}\" has no nodes")]
    EmptyRoute(String),

    #[error("Route \"{route}\" has no node {node}")]
    UnknownNode { route: String, node: NodeId },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaypointAdvancer {
    pub fn new(arrival_threshold_m: f64) -> Self {
        Self {
            arrival_threshold_m,
            state: AdvancerState::Idle,
        }
    }

    pub fn state(&self) -> &AdvancerState {
        &self.state
    }

    pub fn nav_state(&self) -> NavState {
        match self.state {
            AdvancerState::Idle => NavState::Idle,
            AdvancerState::Navigating(_) => NavState::Navigating,
            AdvancerState::Completed(_) => NavState::Completed,
        }
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self.state, AdvancerState::Navigating(_))
    }

    /// The target, whether still navigating or completed.
    pub fn target(&self) -> Option<&TargetState> {
        match &self.state {
            AdvancerState::Idle => None,
            AdvancerState::Navigating(t) | AdvancerState::Completed(t) => Some(t),
        }
    }

    /// The target, only while navigating.
    pub fn active_target(&self) -> Option<&TargetState> {
        match &self.state {
            AdvancerState::Navigating(t) => Some(t),
            _ => None,
        }
    }

    /// Start navigating the given route from its first node.
    ///
    /// An empty route is rejected and the state is left unchanged.
    pub fn select_route(&mut self, graph: &RouteGraph) -> Result<NodeId, WaypointError> {
        let first = graph
            .first()
            .ok_or_else(|| WaypointError::EmptyRoute(graph.name().into()))?;

        self.state = AdvancerState::Navigating(TargetState {
            route_name: graph.name().into(),
            current: first.id,
            previous: None,
        });

        info!("Navigating route \"{}\" from node {}", graph.name(), first.id);

        Ok(first.id)
    }

    /// Target a specific node of the route, forgetting where the walker came from.
    pub fn jump_to(&mut self, graph: &RouteGraph, node: NodeId) -> Result<(), WaypointError> {
        if !graph.contains(node) {
            return Err(WaypointError::UnknownNode {
                route: graph.name().into(),
                node,
            });
        }

        self.state = AdvancerState::Navigating(TargetState {
            route_name: graph.name().into(),
            current: node,
            previous: None,
        });

        Ok(())
    }

    /// Move the target onto `node`, remembering the old target as the previous node if the two
    /// are adjacent.
    ///
    /// Has no effect unless navigating.
    pub fn move_to(&mut self, graph: &RouteGraph, node: NodeId) -> bool {
        let target = match &mut self.state {
            AdvancerState::Navigating(t) => t,
            _ => return false,
        };

        let old = target.current;
        let adjacent = graph.neighbours(old).iter().any(|n| n.id == node)
            || graph.neighbours(node).iter().any(|n| n.id == old);

        target.previous = if adjacent { Some(old) } else { None };
        target.current = node;

        true
    }

    /// Radius within which the target counts as reached for this fix.
    pub fn arrival_radius_m(&self, fix: &Fix) -> f64 {
        self.arrival_threshold_m.max(fix.accuracy_or_zero())
    }

    pub fn has_arrived(&self, fix: &Fix, node: &RouteNode) -> bool {
        distance_m(&GeoPoint::from(fix), &node.point) <= self.arrival_radius_m(fix)
    }

    /// Decide what the fix means for the current target without changing anything.
    pub fn evaluate(&self, graph: &RouteGraph, fix: &Fix) -> AdvanceDecision {
        let target = match self.active_target() {
            Some(t) => t,
            None => return AdvanceDecision::Hold,
        };

        let node = match graph.node(target.current) {
            Some(n) => n,
            None => return AdvanceDecision::Hold,
        };

        if !self.has_arrived(fix, node) {
            return AdvanceDecision::Hold;
        }

        match graph.next_candidate(target.current, target.previous) {
            Some(to) => AdvanceDecision::Advance {
                from: target.current,
                to,
            },
            None => AdvanceDecision::Complete {
                from: target.current,
            },
        }
    }

    /// Apply a decision from [`WaypointAdvancer::evaluate`].
    ///
    /// A decision made against a target which has since changed is dropped.
    pub fn commit(&mut self, decision: AdvanceDecision) -> Option<AdvanceEvent> {
        let target = match &mut self.state {
            AdvancerState::Navigating(t) => t,
            _ => return None,
        };

        match decision {
            AdvanceDecision::Hold => None,
            AdvanceDecision::Advance { from, to } if from == target.current => {
                target.previous = Some(from);
                target.current = to;

                info!("Reached node {}, advancing to node {}", from, to);

                Some(AdvanceEvent::Advanced(to))
            }
            AdvanceDecision::Complete { from } if from == target.current => {
                let done = target.clone();

                info!("Reached node {}, route \"{}\" complete", from, done.route_name);

                self.state = AdvancerState::Completed(done);

                Some(AdvanceEvent::Completed)
            }
            _ => None,
        }
    }

    /// Evaluate and commit a fix in one go.
    pub fn on_fix(&mut self, graph: &RouteGraph, fix: &Fix) -> Option<AdvanceEvent> {
        let decision = self.evaluate(graph, fix);
        self.commit(decision)
    }

    /// Return to idle, returns true if there was a target to clear.
    pub fn stop(&mut self) -> bool {
        let was_active = !matches!(self.state, AdvancerState::Idle);
        self.state = AdvancerState::Idle;
        was_active
    }
}

impl Display for NavState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavState::Idle => write!(f, "NavState::Idle"),
            NavState::Navigating => write!(f, "NavState::Navigating"),
            NavState::Completed => write!(f, "NavState::Completed"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_graph::test::{abc, spec};

    fn fix_at(lat: f64, lon: f64, accuracy_m: Option<f64>) -> Fix {
        Fix::new(lat, lon, accuracy_m)
    }

    #[test]
    fn test_select_route() {
        let mut adv = WaypointAdvancer::new(10.0);
        assert_eq!(adv.nav_state(), NavState::Idle);

        let empty = RouteGraph::from_spec("empty", &[]);
        assert!(matches!(
            adv.select_route(&empty),
            Err(WaypointError::EmptyRoute(_))
        ));
        assert_eq!(adv.state(), &AdvancerState::Idle);

        assert_eq!(adv.select_route(&abc()).unwrap(), 1);
        assert_eq!(
            adv.target(),
            Some(&TargetState {
                route_name: "abc".into(),
                current: 1,
                previous: None
            })
        );

        // A failed selection leaves the running navigation alone
        assert!(adv.select_route(&empty).is_err());
        assert!(adv.is_navigating());
    }

    #[test]
    fn test_advance_once() {
        let graph = abc();
        let mut adv = WaypointAdvancer::new(10.0);
        adv.select_route(&graph).unwrap();

        // Far from A, nothing happens
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.0005, Some(5.0))), None);

        // Fix sits on B, so A is 111 m away and not reached
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.001, Some(5.0))), None);

        // Walk to A then B
        assert_eq!(
            adv.on_fix(&graph, &fix_at(0.0, 0.00001, Some(5.0))),
            Some(AdvanceEvent::Advanced(2))
        );
        assert_eq!(
            adv.on_fix(&graph, &fix_at(0.0, 0.001, Some(5.0))),
            Some(AdvanceEvent::Advanced(3))
        );

        // Repeating the same fix does not advance again
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.001, Some(5.0))), None);
        let t = adv.target().unwrap();
        assert_eq!((t.current, t.previous), (3, Some(2)));
    }

    #[test]
    fn test_advance_from_b() {
        let graph = abc();
        let mut adv = WaypointAdvancer::new(10.0);
        adv.jump_to(&graph, 2).unwrap();

        // No previous node, so B's closest neighbour to the end wins
        assert_eq!(
            adv.on_fix(&graph, &fix_at(0.0, 0.001, Some(5.0))),
            Some(AdvanceEvent::Advanced(3))
        );
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.001, Some(5.0))), None);
        assert_eq!(graph.next_candidate(2, Some(1)), Some(3));
    }

    #[test]
    fn test_complete() {
        let graph = abc();
        let mut adv = WaypointAdvancer::new(10.0);
        adv.select_route(&graph).unwrap();
        adv.move_to(&graph, 2);
        adv.move_to(&graph, 3);

        assert_eq!(
            adv.on_fix(&graph, &fix_at(0.0, 0.002, None)),
            Some(AdvanceEvent::Completed)
        );
        assert_eq!(adv.nav_state(), NavState::Completed);
        assert_eq!(adv.target().unwrap().current, 3);

        // Completed is terminal
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.002, None)), None);
        assert_eq!(adv.on_fix(&graph, &fix_at(0.0, 0.0, None)), None);
        assert!(!adv.move_to(&graph, 1));
        assert_eq!(adv.nav_state(), NavState::Completed);

        assert!(adv.stop());
        assert!(adv.target().is_none());
        assert!(!adv.stop());
    }

    #[test]
    fn test_dynamic_radius() {
        let graph = abc();
        let mut adv = WaypointAdvancer::new(10.0);
        adv.select_route(&graph).unwrap();

        // About 22 m from A
        let far = fix_at(0.0, 0.0002, Some(5.0));
        assert_eq!(adv.arrival_radius_m(&far), 10.0);
        assert_eq!(adv.on_fix(&graph, &far), None);

        let poor = fix_at(0.0, 0.0002, Some(30.0));
        assert_eq!(adv.arrival_radius_m(&poor), 30.0);
        assert_eq!(adv.on_fix(&graph, &poor), Some(AdvanceEvent::Advanced(2)));

        let nan = fix_at(0.0, 0.0, Some(std::f64::NAN));
        assert_eq!(adv.arrival_radius_m(&nan), 10.0);
    }

    #[test]
    fn test_stale_decision_dropped() {
        let graph = abc();
        let mut adv = WaypointAdvancer::new(10.0);
        adv.select_route(&graph).unwrap();

        let decision = adv.evaluate(&graph, &fix_at(0.0, 0.0, None));
        assert_eq!(decision, AdvanceDecision::Advance { from: 1, to: 2 });

        adv.jump_to(&graph, 3).unwrap();
        assert_eq!(adv.commit(decision), None);
        assert_eq!(adv.target().unwrap().current, 3);

        adv.stop();
        assert_eq!(adv.commit(decision), None);
        assert_eq!(adv.nav_state(), NavState::Idle);
    }

    #[test]
    fn test_jump_and_move() {
        let graph = RouteGraph::from_spec(
            "loop",
            &[
                spec(1, 0.0, 0.0, &[2]),
                spec(2, 0.0, 0.001, &[3]),
                spec(3, 0.0, 0.002, &[]),
            ],
        );
        let mut adv = WaypointAdvancer::new(10.0);

        assert!(!adv.move_to(&graph, 2));
        assert!(matches!(
            adv.jump_to(&graph, 9),
            Err(WaypointError::UnknownNode { node: 9, .. })
        ));

        adv.jump_to(&graph, 1).unwrap();

        // Adjacent through 1's list only
        assert!(adv.move_to(&graph, 2));
        assert_eq!(adv.target().unwrap().previous, Some(1));

        // 2 -> 3 adjacent, 3 -> 1 not
        adv.move_to(&graph, 3);
        assert_eq!(adv.target().unwrap().previous, Some(2));
        adv.move_to(&graph, 1);
        assert_eq!(adv.target().unwrap().previous, None);
    }
}
