//! # NavMgr module
//!
//! This module implements the [`NavMgr`], which owns the navigation state of a session and is the
//! single writer of it. Every sample is processed to completion before the next one is accepted:
//!
//! - A heading sample updates the [`HeadingFilter`] and the display snapshot.
//! - A fix updates the snapshot, then runs the [`WaypointAdvancer`], then (if still navigating)
//!   the [`CourseGuard`].
//!
//! Changes of target are reported as [`NavEvent`]s. Turns and route completion are also signalled
//! to the wristband through the injected [`SignalLink`], a failure to signal is reported as an
//! event and never affects navigation.
//!
//! A stop requested through the [`StopHandle`] while a fix is being processed cancels any advance
//! or snap that fix would have caused.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod tm;
pub mod worker;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use comms_if::{
    cmd::NavCmd,
    route::{NodeId, RouteData},
    sensor::{Fix, HeadingSample},
    signal::{Side, SignalError, SignalToken},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use util::{params::LoadError, session::get_elapsed_seconds};

pub use self::{
    params::NavMgrParams,
    tm::{NavSnapshot, NavTm},
    worker::{NavInput, NavOutput, SampleWorker, StopHandle, WorkerError},
};

use crate::{
    course_guard::{CourseGuard, CourseStatus},
    geodesy::{initial_bearing_deg, GeoPoint},
    heading_filter::HeadingFilter,
    route_graph::RouteGraph,
    signal_client::{dispatch, SignalLink},
    turn_advisor::{TurnAdvisor, TurnDecision},
    waypoint::{
        AdvanceDecision, AdvanceEvent, AdvancerState, NavState, TargetState, WaypointAdvancer,
        WaypointError,
    },
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation Manager
pub struct NavMgr {
    pub params: NavMgrParams,

    /// All known routes by name
    routes: BTreeMap<String, RouteGraph>,

    heading_filter: HeadingFilter,
    advancer: WaypointAdvancer,
    guard: CourseGuard,
    turn_advisor: TurnAdvisor,

    signal_link: Box<dyn SignalLink>,

    stop_handle: StopHandle,

    /// The stop generation that has already been applied
    applied_stop_gen: u64,

    /// The last valid fix
    last_fix: Option<Fix>,

    snapshot: NavSnapshot,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Something that happened to the navigation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavEvent {
    /// A route was selected and its first node targeted
    RouteSelected { route: String, node: NodeId },

    /// The target moved on to `node`, which lies in the direction `turn`
    Advanced { node: NodeId, turn: TurnDecision },

    /// The last node of the route was reached
    Completed,

    /// The walker joined the route ahead of the target, which has snapped to `node`
    OffCourseSnap { node: NodeId },

    /// The target was changed by a command
    Retargeted { node: NodeId },

    /// Navigation was stopped
    Stopped,

    /// A wristband signal could not be delivered
    SignalFailure { side: Side, error: SignalError },
}

/// Errors that can occur in the navigation manager.
#[derive(Debug, thiserror::Error)]
pub enum NavMgrError {
    #[error("Failed to load NavMgrParams: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid NavMgrParams: {0}")]
    InvalidParams(String),

    #[error("No route named \"{0}\"")]
    UnknownRoute(String),

    #[error("Route \"{route}\" has no node {node}")]
    UnknownNode { route: String, node: NodeId },

    #[error("Route \"{0}\" has no nodes")]
    EmptyRoute(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavMgr {
    /// Create the manager with parameters loaded from the given file in the params directory.
    pub fn init(
        params_path: &str,
        route_data: &RouteData,
        signal_link: Box<dyn SignalLink>,
    ) -> Result<Self, NavMgrError> {
        let params: NavMgrParams = util::params::load(params_path)?;

        Self::new(params, route_data, signal_link)
    }

    pub fn new(
        params: NavMgrParams,
        route_data: &RouteData,
        signal_link: Box<dyn SignalLink>,
    ) -> Result<Self, NavMgrError> {
        params.validate()?;

        let routes = route_data
            .names()
            .filter_map(|name| {
                let specs = route_data.get(name)?;
                Some((name.to_string(), RouteGraph::from_spec(name, specs)))
            })
            .collect();

        Ok(Self {
            params,
            routes,
            heading_filter: HeadingFilter::new(params.smoothing_alpha),
            advancer: WaypointAdvancer::new(params.arrival_threshold_m),
            guard: CourseGuard::new(params.off_course_threshold_m),
            turn_advisor: TurnAdvisor::new(params.turn_dead_zone_deg),
            signal_link,
            stop_handle: StopHandle::default(),
            applied_stop_gen: 0,
            last_fix: None,
            snapshot: NavSnapshot::default(),
        })
    }

    /// Handle for requesting a stop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|k| k.as_str())
    }

    pub fn route(&self, name: &str) -> Option<&RouteGraph> {
        self.routes.get(name)
    }

    pub fn state(&self) -> &AdvancerState {
        self.advancer.state()
    }

    pub fn nav_state(&self) -> NavState {
        self.advancer.nav_state()
    }

    pub fn target(&self) -> Option<&TargetState> {
        self.advancer.target()
    }

    pub fn snapshot(&self) -> NavSnapshot {
        self.snapshot
    }

    pub fn get_tm(&self) -> NavTm {
        let target = self.advancer.target();

        NavTm {
            time_s: get_elapsed_seconds(),
            state: Some(self.advancer.nav_state()),
            route_name: target.map(|t| t.route_name.clone()),
            current_node: target.map(|t| t.current),
            previous_node: target.and_then(|t| t.previous),
            fix_lat: self.last_fix.map(|f| f.lat),
            fix_lon: self.last_fix.map(|f| f.lon),
            fix_accuracy_m: self.last_fix.and_then(|f| f.accuracy_m),
            heading_deg: self.snapshot.heading_deg,
            heading_label: self.snapshot.heading_label,
            bearing_to_target_deg: self.snapshot.bearing_to_target_deg,
            relative_angle_deg: self.snapshot.relative_angle_deg,
            distance_m: self.snapshot.distance_m,
        }
    }

    /// Execute a navigation command.
    pub fn handle_cmd(&mut self, cmd: NavCmd) -> Result<Vec<NavEvent>, NavMgrError> {
        match cmd {
            NavCmd::Select { route } => self.select_route(&route),
            NavCmd::Goto { route, node } => self.goto(&route, node),
            NavCmd::Next => Ok(self.step_next()),
            NavCmd::Prev => Ok(self.step_prev()),
            NavCmd::Stop => Ok(self.stop()),
        }
    }

    /// Start navigating the named route from its first node.
    pub fn select_route(&mut self, name: &str) -> Result<Vec<NavEvent>, NavMgrError> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        let graph = self
            .routes
            .get(name)
            .ok_or_else(|| NavMgrError::UnknownRoute(name.into()))?;

        let node = self.advancer.select_route(graph)?;

        events.push(NavEvent::RouteSelected {
            route: name.into(),
            node,
        });
        self.refresh_snapshot();

        Ok(events)
    }

    /// Target a node of the named route directly.
    pub fn goto(&mut self, route: &str, node: NodeId) -> Result<Vec<NavEvent>, NavMgrError> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        let graph = self
            .routes
            .get(route)
            .ok_or_else(|| NavMgrError::UnknownRoute(route.into()))?;

        self.advancer.jump_to(graph, node)?;

        info!("Target set to node {} of route \"{}\"", node, route);
        events.push(NavEvent::Retargeted { node });
        self.refresh_snapshot();

        Ok(events)
    }

    /// Whether a manual forward step would move the target.
    pub fn can_step_next(&self) -> bool {
        match (self.advancer.active_target(), self.active_graph()) {
            (Some(t), Some(g)) => g.next_candidate(t.current, t.previous).is_some(),
            _ => false,
        }
    }

    /// Whether a manual backward step would move the target.
    pub fn can_step_prev(&self) -> bool {
        match (self.advancer.active_target(), self.active_graph()) {
            (Some(t), Some(g)) => g.prev_candidate(t.current).is_some(),
            _ => false,
        }
    }

    /// Manually step the target forward. Stepping never completes the route.
    pub fn step_next(&mut self) -> Vec<NavEvent> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        let (route_name, current, previous) = match self.advancer.active_target() {
            Some(t) => (t.route_name.clone(), t.current, t.previous),
            None => {
                debug!("Ignoring manual step, not navigating");
                return events;
            }
        };

        let graph = match self.routes.get(&route_name) {
            Some(g) => g,
            None => return events,
        };

        match graph.next_candidate(current, previous) {
            Some(node) => {
                self.advancer.move_to(graph, node);
                info!("Target stepped forward to node {}", node);
                events.push(NavEvent::Retargeted { node });
            }
            None => debug!("No node after {}, target unchanged", current),
        }

        self.refresh_snapshot();
        events
    }

    /// Manually step the target back, forgetting where the walker came from.
    pub fn step_prev(&mut self) -> Vec<NavEvent> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        let (route_name, current) = match self.advancer.active_target() {
            Some(t) => (t.route_name.clone(), t.current),
            None => {
                debug!("Ignoring manual step, not navigating");
                return events;
            }
        };

        let graph = match self.routes.get(&route_name) {
            Some(g) => g,
            None => return events,
        };

        match graph.prev_candidate(current) {
            Some(node) => {
                if let Err(e) = self.advancer.jump_to(graph, node) {
                    warn!("Could not step back: {}", e);
                    return events;
                }
                info!("Target stepped back to node {}", node);
                events.push(NavEvent::Retargeted { node });
            }
            None => debug!("No node before {}, target unchanged", current),
        }

        self.refresh_snapshot();
        events
    }

    /// Stop navigating.
    pub fn stop(&mut self) -> Vec<NavEvent> {
        let mut events = Vec::new();

        // Any pending request is satisfied by this stop
        self.applied_stop_gen = self.stop_handle.generation();
        self.apply_stop(&mut events);

        events
    }

    /// Process a raw heading sample.
    pub fn on_heading(&mut self, sample: HeadingSample) -> Vec<NavEvent> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        if !sample.is_valid() {
            debug!("Rejected heading sample {}", sample.heading_deg);
            return events;
        }

        if self.heading_filter.update(sample.heading_deg).is_some() {
            self.refresh_snapshot();
        }

        events
    }

    /// Process a position fix.
    pub fn on_fix(&mut self, fix: Fix) -> Vec<NavEvent> {
        let mut events = Vec::new();
        self.sync_stop(&mut events);

        if !fix.is_valid() {
            debug!("Rejected fix with invalid coordinates ({}, {})", fix.lat, fix.lon);
            return events;
        }

        let accepted_gen = self.stop_handle.generation();
        self.process_fix(fix, accepted_gen, &mut events);

        events
    }

    fn process_fix(&mut self, fix: Fix, accepted_gen: u64, events: &mut Vec<NavEvent>) {
        self.last_fix = Some(fix);
        self.refresh_snapshot();

        // Arrival
        let decision = match self.active_graph() {
            Some(graph) => self.advancer.evaluate(graph, &fix),
            None => AdvanceDecision::Hold,
        };

        if decision != AdvanceDecision::Hold {
            if !self.may_commit(accepted_gen, events) {
                return;
            }

            match self.advancer.commit(decision) {
                Some(AdvanceEvent::Advanced(node)) => self.announce_advance(node, events),
                Some(AdvanceEvent::Completed) => self.announce_completed(events),
                None => (),
            }
        }

        // Course
        let position = GeoPoint::from(&fix);
        let status = match (self.active_graph(), self.advancer.active_target()) {
            (Some(graph), Some(target)) => self.guard.check(
                graph,
                target.current,
                target.previous,
                &position,
                self.heading_filter.heading_deg(),
            ),
            _ => CourseStatus::OnCourse,
        };

        if let CourseStatus::OffCourse { snap_to, .. } = status {
            if !self.may_commit(accepted_gen, events) {
                return;
            }

            let route_name = match self.advancer.active_target() {
                Some(t) => t.route_name.clone(),
                None => return,
            };

            if let Some(graph) = self.routes.get(&route_name) {
                self.advancer.move_to(graph, snap_to);
                info!("Off course, target snapped to node {}", snap_to);
                events.push(NavEvent::OffCourseSnap { node: snap_to });
                self.announce_advance(snap_to, events);
            }
        }

        self.refresh_snapshot();
    }

    /// The graph of the route being navigated.
    fn active_graph(&self) -> Option<&RouteGraph> {
        let target = self.advancer.active_target()?;
        self.routes.get(&target.route_name)
    }

    /// The position of the current target node, navigating or completed.
    fn target_point(&self) -> Option<GeoPoint> {
        let target = self.advancer.target()?;
        let graph = self.routes.get(&target.route_name)?;
        graph.node(target.current).map(|n| n.point)
    }

    /// Returns false, and applies the stop, if a stop was requested after the sample being
    /// processed was accepted.
    fn may_commit(&mut self, accepted_gen: u64, events: &mut Vec<NavEvent>) -> bool {
        if self.stop_handle.generation() == accepted_gen {
            return true;
        }

        info!("Stop requested during processing, discarding target change");
        self.sync_stop(events);

        false
    }

    /// Apply a stop requested through the handle, if one is pending.
    fn sync_stop(&mut self, events: &mut Vec<NavEvent>) {
        let gen = self.stop_handle.generation();

        if gen != self.applied_stop_gen {
            self.applied_stop_gen = gen;
            self.apply_stop(events);
        }
    }

    fn apply_stop(&mut self, events: &mut Vec<NavEvent>) {
        if self.advancer.stop() {
            info!("Navigation stopped");
            events.push(NavEvent::Stopped);
        }

        self.refresh_snapshot();
    }

    /// Report an advance and cue the turn towards the new target from the latest fix.
    fn announce_advance(&mut self, node: NodeId, events: &mut Vec<NavEvent>) {
        let bearing = match (self.last_fix, self.target_point()) {
            (Some(fix), Some(target)) => Some(initial_bearing_deg(&GeoPoint::from(&fix), &target)),
            _ => None,
        };

        let turn = self
            .turn_advisor
            .decide(self.heading_filter.heading_deg(), bearing);

        info!("Advanced to node {}, turn {}", node, turn);
        events.push(NavEvent::Advanced { node, turn });

        if let Some((side, token)) = turn.signal() {
            self.signal(side, token, events);
        }
    }

    fn announce_completed(&mut self, events: &mut Vec<NavEvent>) {
        events.push(NavEvent::Completed);

        for &side in Side::BOTH.iter() {
            self.signal(side, SignalToken::Finish, events);
        }
    }

    fn signal(&mut self, side: Side, token: SignalToken, events: &mut Vec<NavEvent>) {
        if let Err(error) = dispatch(self.signal_link.as_mut(), side, token) {
            warn!("Could not signal {} to the wristband: {}", token, error);
            events.push(NavEvent::SignalFailure { side, error });
        }
    }

    fn refresh_snapshot(&mut self) {
        let position = self.last_fix.map(|f| GeoPoint::from(&f));

        self.snapshot = NavSnapshot::compute(
            position.as_ref(),
            self.heading_filter.heading_deg(),
            self.target_point().as_ref(),
        );
    }
}

impl From<LoadError> for NavMgrError {
    fn from(e: LoadError) -> Self {
        Self::ParamLoadError(e)
    }
}

impl From<WaypointError> for NavMgrError {
    fn from(e: WaypointError) -> Self {
        match e {
            WaypointError::EmptyRoute(r) => Self::EmptyRoute(r),
            WaypointError::UnknownNode { route, node } => Self::UnknownNode { route, node },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal_client::test::RecordingLink;
    use comms_if::route::RouteNodeSpec;

    fn node(id: NodeId, lat: f64, lon: f64, connected_to: &[NodeId]) -> RouteNodeSpec {
        RouteNodeSpec {
            id,
            lat,
            lon,
            connected_to: connected_to.to_vec(),
        }
    }

    fn route_data() -> RouteData {
        let mut data = RouteData::default();

        data.routes.insert(
            "abc".into(),
            vec![
                node(1, 0.0, 0.0, &[2]),
                node(2, 0.0, 0.001, &[1, 3]),
                node(3, 0.0, 0.002, &[2]),
            ],
        );
        data.routes.insert(
            "decoy".into(),
            vec![node(1, 0.0, 0.0, &[2]), node(2, 0.0, 0.0005, &[1])],
        );
        data.routes.insert("empty".into(), vec![]);

        data
    }

    fn nav_mgr(link: &RecordingLink) -> NavMgr {
        NavMgr::new(
            NavMgrParams::canonical(),
            &route_data(),
            Box::new(link.clone()),
        )
        .unwrap()
    }

    fn fix(lat: f64, lon: f64) -> Fix {
        Fix::new(lat, lon, Some(5.0))
    }

    #[test]
    fn test_walk_route() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        assert!(nav.on_heading(HeadingSample::new(90.0)).is_empty());
        assert_eq!(
            nav.select_route("abc").unwrap(),
            vec![NavEvent::RouteSelected {
                route: "abc".into(),
                node: 1
            }]
        );

        // Just past A, facing B
        assert_eq!(
            nav.on_fix(fix(0.0, 0.00002)),
            vec![NavEvent::Advanced {
                node: 2,
                turn: TurnDecision::Ahead
            }]
        );

        // On B, advances once only
        assert_eq!(
            nav.on_fix(fix(0.0, 0.001)),
            vec![NavEvent::Advanced {
                node: 3,
                turn: TurnDecision::Ahead
            }]
        );
        assert!(nav.on_fix(fix(0.0, 0.001)).is_empty());
        assert_eq!(nav.target().unwrap().current, 3);
        assert_eq!(nav.target().unwrap().previous, Some(2));

        assert!(link.sent().is_empty());

        // On C
        assert_eq!(nav.on_fix(fix(0.0, 0.002)), vec![NavEvent::Completed]);
        assert_eq!(nav.nav_state(), NavState::Completed);
        assert_eq!(
            link.sent(),
            vec![
                (Side::Left, SignalToken::Finish),
                (Side::Right, SignalToken::Finish)
            ]
        );

        assert!(nav.on_fix(fix(0.0, 0.002)).is_empty());
        assert!(nav.on_fix(fix(0.0, 0.0)).is_empty());
        assert_eq!(link.sent().len(), 2);

        // Target is kept for display
        let tm = nav.get_tm();
        assert_eq!(tm.state, Some(NavState::Completed));
        assert_eq!(tm.current_node, Some(3));
        assert_eq!(tm.route_name.as_deref(), Some("abc"));
    }

    #[test]
    fn test_turn_signal() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        nav.on_heading(HeadingSample::new(0.0));
        nav.select_route("abc").unwrap();

        // Facing north, B is due east
        assert_eq!(
            nav.on_fix(fix(0.0, 0.00002)),
            vec![NavEvent::Advanced {
                node: 2,
                turn: TurnDecision::Right
            }]
        );
        assert_eq!(link.sent(), vec![(Side::Right, SignalToken::Right)]);
    }

    #[test]
    fn test_signal_failure_does_not_block() {
        let link = RecordingLink {
            disconnected: vec![Side::Right],
            ..Default::default()
        };
        let mut nav = nav_mgr(&link);

        nav.on_heading(HeadingSample::new(0.0));
        nav.select_route("abc").unwrap();

        assert_eq!(
            nav.on_fix(fix(0.0, 0.00002)),
            vec![
                NavEvent::Advanced {
                    node: 2,
                    turn: TurnDecision::Right
                },
                NavEvent::SignalFailure {
                    side: Side::Right,
                    error: SignalError::Disconnected(Side::Right)
                }
            ]
        );
        assert!(link.sent().is_empty());
        assert_eq!(nav.target().unwrap().current, 2);
        assert_eq!(nav.nav_state(), NavState::Navigating);
    }

    #[test]
    fn test_off_course_snap() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        nav.on_heading(HeadingSample::new(90.0));
        nav.select_route("decoy").unwrap();

        // 44 m from the target, 11 m from the node ahead
        assert_eq!(
            nav.on_fix(fix(0.0, 0.0004)),
            vec![
                NavEvent::OffCourseSnap { node: 2 },
                NavEvent::Advanced {
                    node: 2,
                    turn: TurnDecision::Ahead
                }
            ]
        );

        let target = nav.target().unwrap();
        assert_eq!((target.current, target.previous), (2, Some(1)));

        let d = nav.snapshot().distance_m.unwrap();
        assert!((d - 11.12).abs() < 0.01, "{}", d);
    }

    #[test]
    fn test_snapshot_follows_samples() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        assert_eq!(nav.snapshot(), NavSnapshot::default());

        nav.select_route("abc").unwrap();
        nav.on_fix(fix(0.0, -0.001));

        let s = nav.snapshot();
        assert!((s.bearing_to_target_deg.unwrap() - 90.0).abs() < 1e-6);
        assert_eq!(s.relative_angle_deg, None);

        nav.on_heading(HeadingSample::new(100.0));
        let s = nav.snapshot();
        assert!((s.relative_angle_deg.unwrap() - 350.0).abs() < 1e-6);
        assert_eq!(s.heading_deg, Some(100.0));

        // Invalid samples change nothing
        assert!(nav.on_heading(HeadingSample::new(std::f64::NAN)).is_empty());
        assert!(nav.on_fix(Fix::new(std::f64::NAN, 0.0, None)).is_empty());
        assert_eq!(nav.snapshot(), s);
        assert_eq!(nav.get_tm().fix_lon, Some(-0.001));

        nav.stop();
        assert_eq!(nav.snapshot().distance_m, None);
        assert_eq!(nav.snapshot().heading_deg, Some(100.0));
    }

    #[test]
    fn test_manual_control() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        // Nothing to step while idle
        assert!(!nav.can_step_next());
        assert!(nav.step_next().is_empty());

        nav.select_route("abc").unwrap();
        assert!(nav.can_step_next());
        assert!(!nav.can_step_prev());
        assert!(nav.step_prev().is_empty());

        assert_eq!(nav.step_next(), vec![NavEvent::Retargeted { node: 2 }]);
        assert_eq!(nav.target().unwrap().previous, Some(1));
        assert_eq!(nav.step_next(), vec![NavEvent::Retargeted { node: 3 }]);
        assert!(!nav.can_step_next());

        // Manual stepping never completes the route
        assert!(nav.step_next().is_empty());
        assert_eq!(nav.nav_state(), NavState::Navigating);

        assert_eq!(nav.step_prev(), vec![NavEvent::Retargeted { node: 2 }]);
        assert_eq!(nav.target().unwrap().previous, None);

        assert_eq!(
            nav.handle_cmd(NavCmd::Goto {
                route: "abc".into(),
                node: 3
            })
            .unwrap(),
            vec![NavEvent::Retargeted { node: 3 }]
        );
        assert!(matches!(
            nav.handle_cmd(NavCmd::Goto {
                route: "abc".into(),
                node: 9
            }),
            Err(NavMgrError::UnknownNode { node: 9, .. })
        ));
        assert!(matches!(
            nav.handle_cmd(NavCmd::Goto {
                route: "nowhere".into(),
                node: 1
            }),
            Err(NavMgrError::UnknownRoute(_))
        ));
        assert_eq!(nav.target().unwrap().current, 3);

        assert!(link.sent().is_empty());

        assert_eq!(nav.handle_cmd(NavCmd::Stop).unwrap(), vec![NavEvent::Stopped]);
        assert!(nav.handle_cmd(NavCmd::Stop).unwrap().is_empty());
        assert!(nav.handle_cmd(NavCmd::Next).unwrap().is_empty());
        assert_eq!(nav.nav_state(), NavState::Idle);
    }

    #[test]
    fn test_select_errors() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);

        assert!(matches!(
            nav.select_route("empty"),
            Err(NavMgrError::EmptyRoute(_))
        ));
        assert!(matches!(
            nav.select_route("nowhere"),
            Err(NavMgrError::UnknownRoute(_))
        ));
        assert_eq!(nav.nav_state(), NavState::Idle);

        assert_eq!(nav.route_names().collect::<Vec<_>>(), vec!["abc", "decoy", "empty"]);

        let bad = NavMgrParams {
            smoothing_alpha: 2.0,
            ..NavMgrParams::canonical()
        };
        assert!(matches!(
            NavMgr::new(bad, &route_data(), Box::new(link)),
            Err(NavMgrError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_stop_handle() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);
        let handle = nav.stop_handle();

        nav.select_route("abc").unwrap();
        handle.request_stop();

        // Applied before the sample is looked at
        assert_eq!(nav.on_fix(fix(0.0, 0.0)), vec![NavEvent::Stopped]);
        assert_eq!(nav.nav_state(), NavState::Idle);

        // A later selection is not undone by the old request
        nav.select_route("abc").unwrap();
        assert_eq!(
            nav.on_fix(fix(0.0, 0.0)),
            vec![NavEvent::Advanced {
                node: 2,
                turn: TurnDecision::Ahead
            }]
        );
    }

    #[test]
    fn test_stop_during_fix_discards_advance() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);
        let handle = nav.stop_handle();

        nav.on_heading(HeadingSample::new(0.0));
        nav.select_route("abc").unwrap();

        // The fix is accepted, then the stop arrives before the advance is committed
        let accepted_gen = handle.generation();
        handle.request_stop();

        let mut events = Vec::new();
        nav.process_fix(fix(0.0, 0.00002), accepted_gen, &mut events);

        assert_eq!(events, vec![NavEvent::Stopped]);
        assert_eq!(nav.nav_state(), NavState::Idle);
        assert!(link.sent().is_empty());
    }

    #[test]
    fn test_stop_during_fix_discards_snap() {
        let link = RecordingLink::default();
        let mut nav = nav_mgr(&link);
        let handle = nav.stop_handle();

        nav.on_heading(HeadingSample::new(90.0));
        nav.select_route("decoy").unwrap();

        // Too far from the target to arrive, so only the snap is at stake
        let accepted_gen = handle.generation();
        handle.request_stop();

        let mut events = Vec::new();
        nav.process_fix(fix(0.0, 0.0004), accepted_gen, &mut events);

        assert_eq!(events, vec![NavEvent::Stopped]);
        assert_eq!(nav.nav_state(), NavState::Idle);
        assert!(nav.target().is_none());
        assert!(link.sent().is_empty());
    }
}
