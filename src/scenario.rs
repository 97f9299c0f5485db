//! Circuits captured to JSON together with the solver output they produced.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::circuit::{ComponentInstance, PinId, SceneItem, ViewId, TITLE_PLACEHOLDER};
use crate::engine::Recording;
use crate::error::NetlistError;
use crate::netlist::{NetlistBuilder, NetlistSnapshot};

/// Id offset of synthesized other-view items.
const COUNTERPART_ID_OFFSET: u64 = 1_000_000;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^{}]+)\}").unwrap();
    static ref CONNECTOR: Regex = Regex::new(r"^net connector(\d+)$").unwrap();
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneLists {
    pub schematic: Vec<SceneItem>,
    pub breadboard: Vec<SceneItem>,
}

/// A recorded editing state: what the editor would hand over, and what the
/// engine answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Circuit text. Generated from the spice lines when empty.
    #[serde(default)]
    pub circuit: String,
    #[serde(default = "default_view")]
    pub view: ViewId,
    pub nets: Vec<Vec<PinId>>,
    pub instances: Vec<ComponentInstance>,
    /// Scene contents. When absent, both views hold exactly the simulated
    /// parts.
    #[serde(default)]
    pub scene: Option<SceneLists>,
    #[serde(default)]
    pub engine: Recording,
}

fn default_view() -> ViewId {
    ViewId::Schematic
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut scenario: Scenario = serde_json::from_str(text)?;
        if scenario.scene.is_none() {
            scenario.scene = Some(scenario.synthesize_scene());
        }
        debug!(
            "scenario with {} instances and {} nets",
            scenario.instances.len(),
            scenario.nets.len()
        );
        Ok(scenario)
    }

    fn synthesize_scene(&self) -> SceneLists {
        let own: Vec<SceneItem> = self
            .instances
            .iter()
            .map(|i| SceneItem::part(i.id.0, &i.title))
            .collect();
        let other: Vec<SceneItem> = self
            .instances
            .iter()
            .map(|i| SceneItem::part(i.id.0 + COUNTERPART_ID_OFFSET, &i.title))
            .collect();
        match self.view {
            ViewId::Schematic => SceneLists {
                schematic: own,
                breadboard: other,
            },
            ViewId::Breadboard => SceneLists {
                schematic: other,
                breadboard: own,
            },
        }
    }

    fn circuit_text(&self, label: &str) -> Result<String, NetlistError> {
        if !self.circuit.trim().is_empty() {
            return Ok(self.circuit.clone());
        }
        let net_of: HashMap<PinId, usize> = self
            .nets
            .iter()
            .enumerate()
            .flat_map(|(net, pins)| pins.iter().map(move |pin| (*pin, net)))
            .collect();

        let mut text = format!("{}\n", label);
        for instance in self.instances.iter().filter(|i| !i.spice.is_empty()) {
            text.push_str(&spice_line(instance, &net_of)?);
            text.push('\n');
        }
        text.push_str(".OP\n.END\n");
        Ok(text)
    }
}

/// Expands the placeholders of one spice line: the title, `{net connectorN}`
/// as the net of the Nth pin, and any other name as a property value.
/// Unconnected pins land on net 0.
fn spice_line(instance: &ComponentInstance, net_of: &HashMap<PinId, usize>) -> Result<String, NetlistError> {
    let mut failure = None;
    let line = PLACEHOLDER.replace_all(&instance.spice, |caps: &Captures| {
        let name = &caps[1];
        if &caps[0] == TITLE_PLACEHOLDER {
            return instance.title.clone();
        }
        if let Some(connector) = CONNECTOR.captures(name) {
            let pin = connector[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| instance.pins.get(n));
            return match pin {
                Some(pin) => net_of.get(&pin.id).copied().unwrap_or(0).to_string(),
                None => {
                    failure.get_or_insert_with(|| {
                        format!("{} has no pin for {{{}}}", instance.title, name)
                    });
                    String::new()
                }
            };
        }
        match instance.property(name) {
            Some(property) => property.value.clone(),
            None => {
                failure.get_or_insert_with(|| {
                    format!("{} has no property for {{{}}}", instance.title, name)
                });
                String::new()
            }
        }
    });
    match failure {
        Some(reason) => Err(NetlistError::Build(reason)),
        None => Ok(line.into_owned()),
    }
}

impl NetlistBuilder for Scenario {
    fn build_netlist(&mut self, view: ViewId, label: &str) -> Result<NetlistSnapshot, NetlistError> {
        if view != self.view {
            return Err(NetlistError::UnknownView(view.to_string()));
        }
        Ok(NetlistSnapshot {
            circuit: self.circuit_text(label)?,
            nets: self.nets.clone(),
            instances: self.instances.clone(),
        })
    }

    fn scene_items(&self, view: ViewId) -> Vec<SceneItem> {
        let Some(scene) = &self.scene else {
            return Vec::new();
        };
        match view {
            ViewId::Schematic => scene.schematic.clone(),
            ViewId::Breadboard => scene.breadboard.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{InstanceId, Pin};

    const SCENARIO: &str = r#"{
        "nets": [[11], [10]],
        "instances": [{
            "id": 1,
            "title": "R1",
            "family": "Resistor",
            "spice": "R{instanceTitle} {net connector0} {net connector1} 220",
            "pins": [{"id": 10, "name": "pin 1"}, {"id": 11, "name": "pin 2"}],
            "properties": {"power": {"value": "0.25", "symbol": "W"}}
        }],
        "engine": {"vectors": {"@r1[p]": [0.3]}}
    }"#;

    #[test]
    fn test_scene_is_synthesized() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let breadboard = scenario.scene_items(ViewId::Breadboard);
        assert_eq!(breadboard.len(), 1);
        assert_eq!(breadboard[0].title, "R1");
        assert_eq!(breadboard[0].id, InstanceId(1 + COUNTERPART_ID_OFFSET));
        assert!(scenario.engine.completes);
    }

    #[test]
    fn test_generated_circuit_text() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        let snapshot = scenario.build_netlist(ViewId::Schematic, "Simulator Netlist").unwrap();
        assert!(snapshot.circuit.starts_with("Simulator Netlist\n"));
        assert!(snapshot.circuit.contains("\nRR1 1 0 220\n"));
        assert!(!snapshot.circuit.contains('{'));
        assert_eq!(snapshot.nets.len(), 2);

        assert_eq!(
            scenario.build_netlist(ViewId::Breadboard, "x"),
            Err(NetlistError::UnknownView("breadboard".to_string()))
        );
    }

    #[test]
    fn test_spice_line_placeholders() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        let battery = ComponentInstance::new(2, "VCC1", "Battery")
            .with_spice("V{instanceTitle} {net connector1} {net connector0} DC {Voltage}")
            .with_pin(Pin::new(20, "+"))
            .with_pin(Pin::new(21, "-"))
            .with_property("voltage", "9V", "V");
        scenario.instances.push(battery);
        scenario.nets[1].push(PinId(20));

        let snapshot = scenario.build_netlist(ViewId::Schematic, "Simulator Netlist").unwrap();
        assert!(snapshot.circuit.contains("\nVVCC1 0 1 DC 9V\n"));
    }

    #[test]
    fn test_unresolved_placeholder_fails_the_build() {
        let mut scenario = Scenario::from_json(SCENARIO).unwrap();
        scenario.instances[0].spice = "R{instanceTitle} {net connector0} {net connector2} 220".to_string();
        assert_eq!(
            scenario.build_netlist(ViewId::Schematic, "x"),
            Err(NetlistError::Build("R1 has no pin for {net connector2}".to_string()))
        );

        scenario.instances[0].spice = "R{instanceTitle} {net connector0} {net connector1} {resistance}".to_string();
        assert_eq!(
            scenario.build_netlist(ViewId::Schematic, "x"),
            Err(NetlistError::Build("R1 has no property for {resistance}".to_string()))
        );
    }

    #[test]
    fn test_bad_json_is_reported() {
        assert!(Scenario::from_json("{\"nets\": 3}").is_err());
    }
}
