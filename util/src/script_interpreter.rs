//! # Teleoperation input script interpreter module
//!
//! This module provides an interpreter for input scripts, allowing an
//! operator's slider and tilt inputs to be replayed against the core.
//!
//! Scripts contain one event per statement, in the form
//! `<time_s>: <json InputEvent>;`, for example
//! `1.5: {"Slider": {"axis": "Drive", "value": 0.8}};`.

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
use teleop_if::input::{InputEvent, InputParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An input which is scripted to occur at a specific time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedInput {
    /// The time the input is supposed to occur at
    exec_time_s: f64,

    /// The input event
    event: InputEvent
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_inputs` to acquire a list of inputs that have occured.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: Option<PathBuf>,
    inputs: VecDeque<ScriptedInput>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid input at {0} s: {1}")]
    InvalidInput(f64, InputParseError)
}

#[derive(Debug, PartialEq)]
pub enum PendingInputs {
    None,
    Some(Vec<InputEvent>),
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
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let mut si = Self::from_str(&script)?;
        si._script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the script's contents.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of inputs
        let mut input_queue: Vec<ScriptedInput> = vec![];

        // Go through the script executing __the magic regex__.
        let re = match RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(_) => crate::raise_error!("The script regex is invalid")
        };

        for cap in re.captures_iter(script) {
            // Parse the exec time, the regex guarantees groups 1 and 3
            // exist if the whole pattern matched.
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Parse the event from the payload. The scripts contain JSON only.
            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let event = match InputEvent::from_json(payload) {
                Ok(e) => e,
                Err(e) => return Err(ScriptError::InvalidInput(
                    exec_time_s, e
                ))
            };

            // Build input from the match
            input_queue.push(ScriptedInput {
                exec_time_s,
                event
            });
        }

        if input_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Statements may be written out of order, replay them in time order.
        // The sort is stable so simultaneous inputs keep their script order.
        input_queue.sort_by(|a, b| a.exec_time_s
            .partial_cmp(&b.exec_time_s)
            .unwrap_or(std::cmp::Ordering::Equal));

        Ok(ScriptInterpreter {
            _script_path: None,
            inputs: input_queue.into()
        })
    }

    /// Return the inputs which have occured at or before `current_time_s`.
    pub fn get_pending_inputs(&mut self, current_time_s: f64) -> PendingInputs {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.inputs.is_empty() {
            return PendingInputs::EndOfScript
        }

        let mut input_vec: Vec<InputEvent> = vec![];

        // Pop items from the queue while the head's exec time is not after
        // the current time.
        while let Some(front) = self.inputs.front() {
            if front.exec_time_s > current_time_s {
                break;
            }

            if let Some(input) = self.inputs.pop_front() {
                input_vec.push(input.event);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if input_vec.len() > 0 {
            PendingInputs::Some(input_vec)
        }
        else {
            PendingInputs::None
        }
    }

    /// Get the number of inputs remaining in the script
    pub fn get_num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.inputs.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }
}
