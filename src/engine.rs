use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Which engine output stream to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Narrow command/query interface of the external analog solver.
///
/// Everything except the background run is synchronous.
pub trait Engine {
    fn init(&mut self) -> Result<(), EngineError>;

    /// Empties both log streams.
    fn clear_log(&mut self);

    fn command(&mut self, command: &str) -> Result<(), EngineError>;

    fn load_circuit(&mut self, circuit: &str) -> Result<(), EngineError>;

    fn log(&self, stream: LogStream) -> String;

    fn error_occurred(&self) -> bool;

    fn is_background_running(&self) -> bool;

    /// Samples of a named result vector, empty if the vector is unknown.
    fn vector_values(&self, name: &str) -> Vec<f64>;

    /// Starts the analysis on the engine's own thread. Completion is reported
    /// through the returned signal.
    fn background_run(&mut self) -> Result<RunSignal, EngineError>;
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What the engine reports when a background run ends.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Finished,
    Failed(String),
}

/// Result of waiting on a [`RunSignal`].
#[derive(Debug, Clone, PartialEq)]
pub enum WaitResult {
    Finished,
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Engine side of a background run.
#[derive(Debug)]
pub struct RunNotifier {
    tx: Sender<RunOutcome>,
    token: CancelToken,
}

impl RunNotifier {
    pub fn finish(self) {
        // The waiter may already have given up, nothing to do then.
        let _ = self.tx.send(RunOutcome::Finished);
    }

    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(RunOutcome::Failed(reason.into()));
    }

    /// True once the waiter timed out or was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Orchestrator side of a background run.
#[derive(Debug)]
pub struct RunSignal {
    rx: Receiver<RunOutcome>,
    token: CancelToken,
}

/// Creates the two ends of a background-run completion channel.
pub fn run_channel() -> (RunNotifier, RunSignal) {
    let (tx, rx) = mpsc::channel();
    let token = CancelToken::new();
    (
        RunNotifier {
            tx,
            token: token.clone(),
        },
        RunSignal { rx, token },
    )
}

impl RunSignal {
    /// Blocks until the run reports back, `timeout` elapses, or `external`
    /// is cancelled. The channel is checked in `poll` sized slices so a
    /// cancellation from another thread is seen promptly.
    pub fn wait(&self, timeout: Duration, poll: Duration, external: &CancelToken) -> WaitResult {
        let poll = poll.max(Duration::from_millis(1));
        let deadline = Instant::now() + timeout;

        loop {
            if external.is_cancelled() {
                self.token.cancel();
                return WaitResult::Cancelled;
            }

            let now = Instant::now();
            if now >= deadline {
                self.token.cancel();
                return WaitResult::TimedOut;
            }

            match self.rx.recv_timeout(poll.min(deadline - now)) {
                Ok(RunOutcome::Finished) => return WaitResult::Finished,
                Ok(RunOutcome::Failed(reason)) => return WaitResult::Failed(reason),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return WaitResult::Failed(
                        "engine dropped the run without reporting completion".to_string(),
                    )
                }
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Solver output recorded ahead of time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    /// Result vectors by name, e.g. "v(1)" or "@r1[p]".
    pub vectors: HashMap<String, Vec<f64>>,
    /// Text the engine prints on stdout while loading the circuit.
    pub load_stdout: String,
    /// Text the engine prints on stderr while loading the circuit.
    pub load_stderr: String,
    /// Text the engine prints on stderr during the run.
    pub run_stderr: String,
    /// Value of the engine's error flag after the run.
    pub error_flag: bool,
    /// When false the run never reports completion.
    pub completes: bool,
    /// Makes `init` fail with this message.
    pub init_failure: Option<String>,
}

impl Default for Recording {
    fn default() -> Self {
        Recording {
            vectors: HashMap::new(),
            load_stdout: String::new(),
            load_stderr: String::new(),
            run_stderr: String::new(),
            error_flag: false,
            completes: true,
            init_failure: None,
        }
    }
}

impl Recording {
    pub fn with_vector(mut self, name: &str, value: f64) -> Self {
        self.vectors.insert(name.to_lowercase(), vec![value]);
        self
    }
}

/// An engine that replays a [`Recording`] instead of solving.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    vectors: HashMap<String, Vec<f64>>,
    stdout: String,
    stderr: String,
    circuit: Option<String>,
    commands: Vec<String>,
    pending: Option<RunNotifier>,
    error_flag: bool,
    initialized: bool,
}

impl ReplayEngine {
    pub fn new(recording: Recording) -> Self {
        let vectors = recording
            .vectors
            .iter()
            .map(|(name, values)| (name.to_lowercase(), values.clone()))
            .collect();
        ReplayEngine {
            recording,
            vectors,
            stdout: String::new(),
            stderr: String::new(),
            circuit: None,
            commands: Vec::new(),
            pending: None,
            error_flag: false,
            initialized: false,
        }
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn loaded_circuit(&self) -> Option<&str> {
        self.circuit.as_deref()
    }
}

impl Engine for ReplayEngine {
    fn init(&mut self) -> Result<(), EngineError> {
        if let Some(reason) = &self.recording.init_failure {
            return Err(EngineError::Init(reason.clone()));
        }
        self.initialized = true;
        Ok(())
    }

    fn clear_log(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }

    fn command(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("replay engine command: {}", command);
        if !self.initialized {
            return Err(EngineError::Command {
                command: command.to_string(),
                reason: "engine not initialized".to_string(),
            });
        }
        self.commands.push(command.to_string());
        match command {
            "remcirc" => {
                self.circuit = None;
                self.error_flag = false;
            }
            "bg_halt" => {
                // Dropping the notifier without a message disconnects the run.
                self.pending = None;
            }
            "listing" => {
                if let Some(circuit) = &self.circuit {
                    self.stdout.push_str(circuit);
                    self.stdout.push('\n');
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn load_circuit(&mut self, circuit: &str) -> Result<(), EngineError> {
        if circuit.trim().is_empty() {
            return Err(EngineError::Load("empty circuit".to_string()));
        }
        self.circuit = Some(circuit.to_string());
        self.stdout.push_str(&self.recording.load_stdout);
        self.stderr.push_str(&self.recording.load_stderr);
        Ok(())
    }

    fn log(&self, stream: LogStream) -> String {
        match stream {
            LogStream::Stdout => self.stdout.clone(),
            LogStream::Stderr => self.stderr.clone(),
        }
    }

    fn error_occurred(&self) -> bool {
        self.error_flag
    }

    fn is_background_running(&self) -> bool {
        self.pending.is_some()
    }

    fn vector_values(&self, name: &str) -> Vec<f64> {
        self.vectors
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn background_run(&mut self) -> Result<RunSignal, EngineError> {
        self.commands.push("bg_run".to_string());
        let (notifier, signal) = run_channel();

        if self.circuit.is_none() {
            warn!("replay engine asked to run without a circuit");
            self.stderr.push_str("Error: there aren't any circuits loaded.\n");
            notifier.finish();
            return Ok(signal);
        }

        self.stderr.push_str(&self.recording.run_stderr);
        self.error_flag = self.recording.error_flag;
        if self.recording.completes {
            notifier.finish();
        } else {
            self.pending = Some(notifier);
        }
        Ok(signal)
    }
}
