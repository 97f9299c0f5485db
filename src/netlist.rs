use serde::{Deserialize, Serialize};

use crate::circuit::{ComponentInstance, PinId, SceneItem, ViewId};
use crate::error::NetlistError;

/// What the editor hands over for one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetlistSnapshot {
    /// Circuit description submitted to the engine.
    pub circuit: String,
    /// Pin equivalence classes. The position of a class is its net number;
    /// class 0 is ground.
    pub nets: Vec<Vec<PinId>>,
    /// Instances that take part in the simulation.
    pub instances: Vec<ComponentInstance>,
}

/// Editor-side provider of netlists and scene contents.
pub trait NetlistBuilder {
    /// Builds the circuit description of `view`. `label` ends up as the
    /// circuit title.
    fn build_netlist(&mut self, view: ViewId, label: &str) -> Result<NetlistSnapshot, NetlistError>;

    /// Every item currently in the scene of `view`.
    fn scene_items(&self, view: ViewId) -> Vec<SceneItem>;
}
