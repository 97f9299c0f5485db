pub mod circuit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod netlist;
pub mod presentation;
pub mod probe;
pub mod report;
pub mod rules;
pub mod scenario;
pub mod scheduler;
pub mod simulator;
pub mod units;

// Re-export commonly used types
pub use circuit::{ComponentInstance, DeviceKind, InstanceId, Pin, PinId, SceneItem, ViewId};
pub use config::{SimulatorConfig, Settings};
pub use engine::{CancelToken, Engine, ReplayEngine};
pub use error::{DeviceQueryError, SessionError};
pub use netlist::{NetlistBuilder, NetlistSnapshot};
pub use presentation::{Overlay, Presentation, RecordingSurface};
pub use report::SessionReport;
pub use rules::{DiagnosticVerdict, RuleSet};
pub use simulator::{SessionState, Simulator};

// Error types
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
