use std::time::Duration;

use thiserror::Error;

use crate::circuit::InstanceId;

/// Failure to read an engineering-prefixed magnitude.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("empty value")]
    Empty,

    #[error("invalid magnitude '{0}'")]
    Invalid(String),
}

/// Per-instance failure of an electrical query.
///
/// These never abort a session: the orchestrator skips the instance's
/// verdict and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceQueryError {
    #[error("part '{title}' has no '{{instanceTitle}}' placeholder in its spice line '{template}'")]
    MissingTypeCode { title: String, template: String },

    #[error("part '{title}' has unrecognized device type '{code}'")]
    UnknownTypeCode { title: String, code: char },

    #[error("'{0}' is not a transistor, its first letter is not a 'q'")]
    NotATransistor(String),

    #[error("unsupported transistor leg '{0}'")]
    UnsupportedLeg(String),

    #[error("part '{title}' has an unreadable '{property}' value: {source}")]
    BadProperty {
        title: String,
        property: String,
        #[source]
        source: UnitError,
    },
}

/// Failure reported by an [`Engine`](crate::engine::Engine) implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("engine could not be initialized: {0}")]
    Init(String),

    #[error("engine command '{command}' failed: {reason}")]
    Command { command: String, reason: String },

    #[error("engine rejected the circuit: {0}")]
    Load(String),
}

/// Failure of the editor-side netlist builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetlistError {
    #[error("no netlist available for view {0}")]
    UnknownView(String),

    #[error("netlist could not be built: {0}")]
    Build(String),
}

/// Session-level failures. Each one ends the current session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("an error occurred when starting the simulation: {0}")]
    EngineInit(#[source] EngineError),

    #[error("{0}")]
    Netlist(#[from] NetlistError),

    #[error("the simulator engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error("the simulator gave an error when loading the netlist")]
    NetlistLoad { log: String, circuit: String },

    #[error("the spice simulator did not finish after {} ms, aborting simulation", .timeout.as_millis())]
    EngineTimeout { timeout: Duration },

    #[error("the simulator gave an error when trying to simulate this circuit")]
    FatalSolve { log: String, circuit: String },

    #[error("the simulation was cancelled")]
    Cancelled,
}

impl SessionError {
    /// Text shown to the user in a single warning message.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::NetlistLoad { log, circuit } => format!(
                "The simulator gave an error when loading the netlist. \
                 Probably some SPICE field is wrong, please, check them.\n\
                 If the parts are from the simulation bin, report the bug.\n\n\
                 Errors:\n{}\n\nNetlist:\n{}",
                log, circuit
            ),
            SessionError::FatalSolve { log, circuit } => format!(
                "The simulator gave an error when trying to simulate this circuit. \
                 Please, check the wiring and try again.\n\n\
                 Errors:\n{}\n\nNetlist:\n{}",
                log, circuit
            ),
            other => {
                let mut msg = other.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg.push('.');
                msg
            }
        }
    }
}

/// An instance whose diagnostic was skipped for this session.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub instance: InstanceId,
    pub title: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Query(#[from] DeviceQueryError),

    #[error("no counterpart in the other view")]
    NoCounterpart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_includes_log_and_circuit() {
        let err = SessionError::NetlistLoad {
            log: "Error on line 3".to_string(),
            circuit: "R1 1 0 1k".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("Error on line 3"));
        assert!(msg.contains("R1 1 0 1k"));
    }

    #[test]
    fn test_timeout_message() {
        let err = SessionError::EngineTimeout {
            timeout: Duration::from_millis(3000),
        };
        assert_eq!(
            err.user_message(),
            "The spice simulator did not finish after 3000 ms, aborting simulation."
        );
    }
}
