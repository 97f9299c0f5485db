use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of one item in one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a connector on one item view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u64);

/// The two linked presentations of the same circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewId {
    Schematic,
    Breadboard,
}

impl ViewId {
    pub fn other(self) -> ViewId {
        match self {
            ViewId::Schematic => ViewId::Breadboard,
            ViewId::Breadboard => ViewId::Schematic,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::Schematic => write!(f, "schematic"),
            ViewId::Breadboard => write!(f, "breadboard"),
        }
    }
}

/// A connector of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    /// Shared name, e.g. "+", "pin 1", "com probe".
    pub name: String,
    /// Shared description, e.g. "VCC", "ground".
    #[serde(default)]
    pub description: String,
    /// True when at least one wire is attached.
    #[serde(default)]
    pub wired: bool,
}

impl Pin {
    pub fn new(id: u64, name: &str) -> Self {
        Pin {
            id: PinId(id),
            name: name.to_string(),
            description: String::new(),
            wired: false,
        }
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn wired(mut self) -> Self {
        self.wired = true;
        self
    }

    fn name_is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn description_is(&self, description: &str) -> bool {
        self.description.eq_ignore_ascii_case(description)
    }
}

/// A property value with the unit symbol it is written in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub value: String,
    #[serde(default)]
    pub symbol: String,
}

/// Coarse device category, assigned once from the family string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Capacitor(Polarity),
    Diode,
    Led,
    Resistor,
    Multimeter,
    DcMotor,
    Sensor(SensorOutput),
    Battery,
    Potentiometer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Bidirectional,
    Polarized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorOutput {
    /// Line sensors drive their output through a transistor.
    PushPull,
    /// Distance sensors are a source with a series resistor.
    Analog,
}

impl DeviceKind {
    /// Classifies a family string by case-insensitive substring. The first
    /// match wins, in a fixed order starting with capacitors.
    pub fn classify(family: &str) -> Option<DeviceKind> {
        let family = family.to_lowercase();
        let has = |needle: &str| family.contains(needle);

        if has("capacitor") {
            let polarity = if has("bidirectional") {
                Polarity::Bidirectional
            } else {
                Polarity::Polarized
            };
            Some(DeviceKind::Capacitor(polarity))
        } else if has("diode") {
            Some(DeviceKind::Diode)
        } else if has("led") {
            Some(DeviceKind::Led)
        } else if has("resistor") {
            Some(DeviceKind::Resistor)
        } else if has("multimeter") {
            Some(DeviceKind::Multimeter)
        } else if has("dc motor") {
            Some(DeviceKind::DcMotor)
        } else if has("line sensor") {
            Some(DeviceKind::Sensor(SensorOutput::PushPull))
        } else if has("distance sensor") {
            Some(DeviceKind::Sensor(SensorOutput::Analog))
        } else if has("battery") || has("voltage source") {
            Some(DeviceKind::Battery)
        } else if has("potentiometer") || has("sparkfun trimpot") {
            Some(DeviceKind::Potentiometer)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeviceKind::Capacitor(_) => "capacitor",
            DeviceKind::Diode => "diode",
            DeviceKind::Led => "led",
            DeviceKind::Resistor => "resistor",
            DeviceKind::Multimeter => "multimeter",
            DeviceKind::DcMotor => "dc motor",
            DeviceKind::Sensor(_) => "sensor",
            DeviceKind::Battery => "battery",
            DeviceKind::Potentiometer => "potentiometer",
        }
    }
}

/// Placeholder the spice line template uses for the instance title.
pub const TITLE_PLACEHOLDER: &str = "{instanceTitle}";

/// One logical circuit element as seen from one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: InstanceId,
    pub title: String,
    pub family: String,
    /// Spice line template, e.g. "R{instanceTitle} {net connector0} {net connector1} {resistance}".
    #[serde(default)]
    pub spice: String,
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

impl ComponentInstance {
    pub fn new(id: u64, title: &str, family: &str) -> Self {
        ComponentInstance {
            id: InstanceId(id),
            title: title.to_string(),
            family: family.to_string(),
            spice: String::new(),
            pins: Vec::new(),
            properties: HashMap::new(),
        }
    }

    pub fn with_spice(mut self, spice: &str) -> Self {
        self.spice = spice.to_string();
        self
    }

    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_property(mut self, name: &str, value: &str, symbol: &str) -> Self {
        self.set_property(name, value, symbol);
        self
    }

    pub fn set_property(&mut self, name: &str, value: &str, symbol: &str) {
        self.properties.insert(
            name.to_lowercase(),
            Property {
                value: value.to_string(),
                symbol: symbol.to_string(),
            },
        );
    }

    /// Property lookup, case-insensitive on the name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(&name.to_lowercase()).or_else(|| {
            self.properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, prop)| prop)
        })
    }

    pub fn kind(&self) -> Option<DeviceKind> {
        DeviceKind::classify(&self.family)
    }

    pub fn pin_named(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|pin| pin.name_is(name))
    }

    /// First pin whose description matches any of `descriptions`.
    pub fn pin_described(&self, descriptions: &[&str]) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|pin| descriptions.iter().any(|d| pin.description_is(d)))
    }
}

/// Presentation-level classification of a scene item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Part,
    Wire,
    Connector,
    PartLabel,
    Note,
    LedLight,
    Symbol,
    Board,
    Breadboard,
    Ruler,
}

impl ItemKind {
    /// Connective and decorative items are part of every circuit and never
    /// dimmed on their own.
    pub fn is_structural(self) -> bool {
        !matches!(self, ItemKind::Part)
    }
}

/// An item as listed by one view's scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    pub id: InstanceId,
    pub title: String,
    pub kind: ItemKind,
}

impl SceneItem {
    pub fn part(id: u64, title: &str) -> Self {
        SceneItem {
            id: InstanceId(id),
            title: title.to_string(),
            kind: ItemKind::Part,
        }
    }

    pub fn of_kind(id: u64, title: &str, kind: ItemKind) -> Self {
        SceneItem {
            id: InstanceId(id),
            title: title.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            DeviceKind::classify("Ceramic Capacitor Bidirectional"),
            Some(DeviceKind::Capacitor(Polarity::Bidirectional))
        );
        assert_eq!(
            DeviceKind::classify("electrolytic capacitor"),
            Some(DeviceKind::Capacitor(Polarity::Polarized))
        );
        assert_eq!(DeviceKind::classify("Rectifier Diode"), Some(DeviceKind::Diode));
        assert_eq!(DeviceKind::classify("LED"), Some(DeviceKind::Led));
        assert_eq!(DeviceKind::classify("resistor"), Some(DeviceKind::Resistor));
        assert_eq!(
            DeviceKind::classify("Line Sensor"),
            Some(DeviceKind::Sensor(SensorOutput::PushPull))
        );
        assert_eq!(
            DeviceKind::classify("IR distance sensor"),
            Some(DeviceKind::Sensor(SensorOutput::Analog))
        );
        assert_eq!(DeviceKind::classify("Battery"), Some(DeviceKind::Battery));
        assert_eq!(DeviceKind::classify("voltage source"), Some(DeviceKind::Battery));
        assert_eq!(
            DeviceKind::classify("Sparkfun Trimpot"),
            Some(DeviceKind::Potentiometer)
        );
        assert_eq!(DeviceKind::classify("microcontroller"), None);
    }

    #[test]
    fn test_pin_lookup_is_case_insensitive() {
        let motor = ComponentInstance::new(1, "M1", "dc motor")
            .with_pin(Pin::new(10, "Pin 1"))
            .with_pin(Pin::new(11, "pin 2").described("Supply Voltage"));

        assert_eq!(motor.pin_named("pin 1").map(|p| p.id), Some(PinId(10)));
        assert_eq!(
            motor.pin_described(&["vcc", "supply voltage"]).map(|p| p.id),
            Some(PinId(11))
        );
        assert!(motor.pin_named("pin 3").is_none());
    }

    #[test]
    fn test_property_lookup() {
        let r = ComponentInstance::new(1, "R1", "resistor").with_property("Power", "0.25", "W");
        assert_eq!(r.property("power").map(|p| p.value.as_str()), Some("0.25"));
        assert!(r.property("tolerance").is_none());
    }

    #[test]
    fn test_structural_items() {
        assert!(!ItemKind::Part.is_structural());
        assert!(ItemKind::Wire.is_structural());
        assert!(ItemKind::Breadboard.is_structural());
        assert_eq!(ViewId::Schematic.other(), ViewId::Breadboard);
    }
}
