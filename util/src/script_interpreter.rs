//! # Replay script interpreter module
//!
//! This module provides an interpreter for replay scripts, allowing recorded
//! position fixes, heading samples and navigation commands to be fed to the
//! navigation core at the times they were captured.
//!
//! Each script entry has the form `<time_s>: <payload>;`, where the payload is
//! either a JSON encoded [`ScriptItem`] or a command line such as
//! `select shop`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::cmd::{ScriptItem, ScriptItemParseError};
use crate::session::get_elapsed_seconds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An item which is scripted to occur at a specific time.
#[derive(Debug)]
pub struct Entry {
    /// The time the item is supposed to be released at
    exec_time_s: f64,

    /// The item to release
    item: ScriptItem
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending`
/// to acquire a list of items that need processing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: Option<PathBuf>,
    entries: VecDeque<Entry>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),

    #[error("Script contains an invalid item at {0} s: {1}")]
    InvalidItem(f64, ScriptItemParseError)
}

#[derive(Debug)]
pub enum PendingItems {
    None,
    Some(Vec<ScriptItem>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si._script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the script's contents.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {

        // Empty list of entries
        let mut entries: Vec<Entry> = Vec::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        for cap in re.captures_iter(script) {
            // Both groups always participate in a match of this pattern
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Parse the item from the payload
            let item = ScriptItem::parse(payload)
                .map_err(|e| ScriptError::InvalidItem(exec_time_s, e))?;

            // Build entry from the match
            entries.push(Entry {
                exec_time_s,
                item
            });
        }

        if entries.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Entries are released in time order regardless of how the script
        // was written. The sort is stable so equal times keep script order.
        entries.sort_by(|a, b| a.exec_time_s
            .partial_cmp(&b.exec_time_s)
            .unwrap_or(std::cmp::Ordering::Equal));

        Ok(ScriptInterpreter {
            _script_path: None,
            entries: entries.into()
        })
    }

    /// Return the items that are due at the current session time.
    pub fn get_pending(&mut self) -> PendingItems {
        self.get_pending_at(get_elapsed_seconds())
    }

    /// Return the items that are due at the given time.
    pub fn get_pending_at(&mut self, current_time_s: f64) -> PendingItems {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.entries.is_empty() {
            return PendingItems::EndOfScript
        }

        let mut items: Vec<ScriptItem> = vec![];

        // Pop items from the queue while the head's exec time is lower than
        // the current time.
        while let Some(entry) = self.entries.front() {
            if entry.exec_time_s >= current_time_s {
                break;
            }

            if let Some(entry) = self.entries.pop_front() {
                items.push(entry.item);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !items.is_empty() {
            PendingItems::Some(items)
        }
        else {
            PendingItems::None
        }
    }

    /// Get the number of items remaining in the script
    pub fn get_num_items(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }
}
