//! # Navigation Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use crate::{
    route::NodeId,
    sensor::{Fix, HeadingSample},
};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that changes the navigation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum NavCmd {
    /// Start navigating the named route from its first node.
    #[structopt(name = "select")]
    Select {
        /// Name of the route to follow
        route: String,
    },

    /// Jump straight to a node of the named route.
    #[structopt(name = "goto")]
    Goto {
        /// Name of the route the node belongs to
        route: String,

        /// Id of the node to target
        node: NodeId,
    },

    /// Manually step the target forward along the route.
    #[structopt(name = "next")]
    Next,

    /// Manually step the target back along the route.
    #[structopt(name = "prev")]
    Prev,

    /// Stop navigating.
    #[structopt(name = "stop")]
    Stop,
}

/// One timed input of a replay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptItem {
    Fix(Fix),
    Heading(HeadingSample),
    Cmd(NavCmd),
}

/// Possible parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ScriptItemParseError {
    #[error("Item contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Item is not a valid command: {0}")]
    InvalidCmd(structopt::clap::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavCmd {
    /// Parse a command from a whitespace separated line, e.g. `goto campus 3`.
    pub fn parse_line(line: &str) -> Result<Self, structopt::clap::Error> {
        NavCmd::from_iter_safe(std::iter::once("nav").chain(line.split_whitespace()))
    }
}

impl ScriptItem {
    /// Parse a script payload.
    ///
    /// Payloads starting with `{` are JSON encoded items, anything else is treated as a command
    /// line.
    pub fn parse(payload: &str) -> Result<Self, ScriptItemParseError> {
        let payload = payload.trim();

        if payload.starts_with('{') {
            serde_json::from_str(payload).map_err(ScriptItemParseError::InvalidJson)
        } else {
            NavCmd::parse_line(payload)
                .map(ScriptItem::Cmd)
                .map_err(ScriptItemParseError::InvalidCmd)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_cmd_lines() {
        assert_eq!(
            NavCmd::parse_line("select shop").unwrap(),
            NavCmd::Select {
                route: "shop".into()
            }
        );
        assert_eq!(
            NavCmd::parse_line("goto shop 3").unwrap(),
            NavCmd::Goto {
                route: "shop".into(),
                node: 3
            }
        );
        assert_eq!(NavCmd::parse_line("stop").unwrap(), NavCmd::Stop);
        assert!(NavCmd::parse_line("goto shop three").is_err());
        assert!(NavCmd::parse_line("fly").is_err());
    }

    #[test]
    fn test_parse_items() {
        match ScriptItem::parse(r#"{"Fix": {"lat": 1.0, "lon": 2.0, "accuracy_m": 4.0}}"#).unwrap()
        {
            ScriptItem::Fix(f) => {
                assert_eq!(f.lat, 1.0);
                assert_eq!(f.accuracy_m, Some(4.0));
            }
            i => panic!("Expected a fix, got {:?}", i),
        }

        assert_eq!(
            ScriptItem::parse(r#"{"Heading": {"heading_deg": 350.0}}"#).unwrap(),
            ScriptItem::Heading(HeadingSample::new(350.0))
        );
        assert_eq!(
            ScriptItem::parse("  next ").unwrap(),
            ScriptItem::Cmd(NavCmd::Next)
        );
        assert!(matches!(
            ScriptItem::parse("{not json"),
            Err(ScriptItemParseError::InvalidJson(_))
        ));
    }
}
