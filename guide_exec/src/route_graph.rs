//! # Route graph
//!
//! An immutable view of one route: its nodes in definition order plus their adjacency. Adjacency
//! entries that name a node missing from the route are kept as given and ignored by every query.
//!
//! Stepping along the graph is greedy and local. From the current node the neighbour closest to
//! the route's last node is chosen for a forward step, and the neighbour closest to the first node
//! for a backward step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::{BTreeSet, HashMap};

use comms_if::route::{NodeId, RouteNodeSpec};
use log::warn;
use serde::Serialize;

use crate::geodesy::{distance_m, GeoPoint};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single waypoint of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteNode {
    pub id: NodeId,

    pub point: GeoPoint,

    /// Ids this node connects to, possibly including ids not in the route
    pub connected_to: BTreeSet<NodeId>,
}

/// A named route.
#[derive(Debug, Clone)]
pub struct RouteGraph {
    name: String,

    /// Nodes in the order they were defined
    nodes: Vec<RouteNode>,

    /// Map from node id to index in `nodes`
    index: HashMap<NodeId, usize>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RouteGraph {
    /// Build the graph for a route from its node definitions.
    ///
    /// If an id is defined more than once the first definition is used.
    pub fn from_spec(name: &str, specs: &[RouteNodeSpec]) -> Self {
        let mut nodes = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());

        for spec in specs {
            if index.contains_key(&spec.id) {
                warn!(
                    "Route \"{}\" defines node {} more than once, later definitions ignored",
                    name, spec.id
                );
                continue;
            }

            index.insert(spec.id, nodes.len());
            nodes.push(RouteNode {
                id: spec.id,
                point: GeoPoint::new(spec.lat, spec.lon),
                connected_to: spec.connected_to.iter().copied().collect(),
            });
        }

        Self {
            name: name.into(),
            nodes,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes in definition order.
    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&RouteNode> {
        self.index.get(&id).and_then(|&i| self.nodes.get(i))
    }

    /// The first node of the route, where navigation starts.
    pub fn first(&self) -> Option<&RouteNode> {
        self.nodes.first()
    }

    /// The last node of the route, where navigation ends.
    pub fn last(&self) -> Option<&RouteNode> {
        self.nodes.last()
    }

    /// Neighbours of the given node which exist in the route, in ascending id order.
    ///
    /// An unknown node has no neighbours.
    pub fn neighbours(&self, id: NodeId) -> Vec<&RouteNode> {
        match self.node(id) {
            Some(n) => n
                .connected_to
                .iter()
                .filter_map(|&c| self.node(c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The node to step forward to from `current`, having arrived from `previous`.
    ///
    /// The previous node is excluded unless it is the only way on, so a dead end which isn't the
    /// end of the route turns the walker around instead of stranding them. Returns `None` at the
    /// last node or when `current` has no neighbours.
    pub fn next_candidate(&self, current: NodeId, previous: Option<NodeId>) -> Option<NodeId> {
        let last = self.last()?;

        if current == last.id {
            return None;
        }

        let neighbours = self.neighbours(current);
        let onward: Vec<&RouteNode> = neighbours
            .iter()
            .copied()
            .filter(|n| Some(n.id) != previous)
            .collect();

        let candidates = if onward.is_empty() {
            neighbours
        } else {
            onward
        };

        closest_to(&candidates, &last.point)
    }

    /// The node to step back to from `current`.
    ///
    /// Returns `None` at the first node or when `current` has no neighbours.
    pub fn prev_candidate(&self, current: NodeId) -> Option<NodeId> {
        let first = self.first()?;

        if current == first.id {
            return None;
        }

        closest_to(&self.neighbours(current), &first.point)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Id of the candidate closest to the goal. Ties go to the earliest candidate, candidates whose
/// distance is NaN are never chosen.
fn closest_to(candidates: &[&RouteNode], goal: &GeoPoint) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;

    for c in candidates {
        let d = distance_m(&c.point, goal);

        if d.is_nan() {
            continue;
        }

        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((c.id, d));
        }
    }

    best.map(|(id, _)| id)
}
