//! # Route data
//!
//! Routes are supplied as a JSON map from route name to a list of nodes:
//!
//! ```json
//! { "shop": [ { "id": 1, "lat": 52.50479, "lon": 6.11230, "connected_to": [2] }, ... ] }
//! ```
//!
//! Adjacency lists may reference ids that are not present in the route, those
//! references are filtered out by the consumer rather than rejected here.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs::read_to_string, path::Path};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Identifier of a node within a route.
pub type NodeId = u32;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single waypoint of a route as it appears in the route file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNodeSpec {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,

    /// Ids of the nodes this one connects to
    #[serde(default)]
    pub connected_to: Vec<NodeId>,
}

/// All routes known to the route data collaborator, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteData {
    pub routes: BTreeMap<String, Vec<RouteNodeSpec>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteDataError {
    #[error("Cannot read the route file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Route data contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RouteData {
    /// Parse route data from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, RouteDataError> {
        serde_json::from_str(json_str).map_err(RouteDataError::InvalidJson)
    }

    /// Load route data from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RouteDataError> {
        let json_str = read_to_string(&path).map_err(RouteDataError::FileLoadError)?;
        let data = Self::from_json(&json_str)?;

        debug!("Loaded {} route(s) from {:?}", data.routes.len(), path.as_ref());

        Ok(data)
    }

    /// Names of all routes, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|k| k.as_str())
    }

    /// Get the nodes of the named route.
    pub fn get(&self, name: &str) -> Option<&[RouteNodeSpec]> {
        self.routes.get(name).map(|v| v.as_slice())
    }
}
