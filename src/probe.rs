//! Turns raw solver vectors into voltages, currents and powers of parts.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::circuit::{ComponentInstance, PinId};
use crate::engine::Engine;
use crate::error::DeviceQueryError;
use crate::index::{SessionIndex, GROUND_NET};
use crate::units::from_engineering;

/// A terminal of a bipolar transistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransistorLeg {
    Base,
    Collector,
    Emitter,
}

impl TransistorLeg {
    fn suffix(self) -> &'static str {
        match self {
            TransistorLeg::Base => "[ib]",
            TransistorLeg::Collector => "[ic]",
            TransistorLeg::Emitter => "[ie]",
        }
    }
}

impl FromStr for TransistorLeg {
    type Err = DeviceQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" | "b" => Ok(TransistorLeg::Base),
            "collector" | "c" => Ok(TransistorLeg::Collector),
            "emitter" | "e" => Ok(TransistorLeg::Emitter),
            _ => Err(DeviceQueryError::UnsupportedLeg(s.to_string())),
        }
    }
}

impl fmt::Display for TransistorLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransistorLeg::Base => write!(f, "base"),
            TransistorLeg::Collector => write!(f, "collector"),
            TransistorLeg::Emitter => write!(f, "emitter"),
        }
    }
}

/// Read-only view of one finished solve.
pub struct Probe<'a> {
    engine: &'a dyn Engine,
    index: &'a SessionIndex,
}

impl<'a> Probe<'a> {
    pub fn new(engine: &'a dyn Engine, index: &'a SessionIndex) -> Self {
        Probe { engine, index }
    }

    /// First sample of a vector, or `default` if the engine has none.
    pub fn vector_or(&self, name: &str, default: f64) -> f64 {
        match self.engine.vector_values(name).first() {
            Some(&value) => value,
            None => {
                debug!("vector '{}' not found, using {}", name, default);
                default
            }
        }
    }

    fn net_voltage(&self, pin: PinId) -> f64 {
        // Unmapped pins fall back to the ground net.
        let net = self.index.net_of(pin).unwrap_or(GROUND_NET);
        if net == GROUND_NET {
            0.0
        } else {
            self.vector_or(&format!("v({})", net), 0.0)
        }
    }

    /// Potential of `a` relative to `b`.
    pub fn voltage(&self, a: PinId, b: PinId) -> Result<f64, DeviceQueryError> {
        Ok(self.net_voltage(a) - self.net_voltage(b))
    }

    /// Current through an instance, or through one of its subparts when a
    /// part is split over several solver elements (potentiometer "A"/"B").
    pub fn current(&self, instance: &ComponentInstance, subpart: &str) -> Result<f64, DeviceQueryError> {
        let code = self.index.type_code(instance)?;
        let suffix = match code {
            'd' => "[id]",
            'r' | 'c' | 'l' | 'v' | 'e' | 'f' | 'g' | 'h' | 'i' => "[i]",
            other => {
                return Err(DeviceQueryError::UnknownTypeCode {
                    title: instance.title.clone(),
                    code: other,
                })
            }
        };

        let element = element_name(instance, subpart);
        // An LED titled "LED1" is the diode "dled1" for the solver.
        let signal = if element.starts_with(code) {
            format!("@{}{}", element, suffix)
        } else {
            format!("@{}{}{}", code, element, suffix)
        };
        Ok(self.vector_or(&signal, 0.0))
    }

    /// Power dissipated or delivered by an instance or one of its subparts.
    pub fn power(&self, instance: &ComponentInstance, subpart: &str) -> Result<f64, DeviceQueryError> {
        let signal = format!("@{}[p]", element_name(instance, subpart));
        Ok(self.vector_or(&signal, 0.0))
    }

    /// Current through one leg of the transistor named `spice_name`.
    pub fn transistor_leg_current(
        &self,
        spice_name: &str,
        leg: TransistorLeg,
    ) -> Result<f64, DeviceQueryError> {
        if !spice_name
            .chars()
            .next()
            .is_some_and(|c| c.eq_ignore_ascii_case(&'q'))
        {
            return Err(DeviceQueryError::NotATransistor(spice_name.to_string()));
        }
        let signal = format!("@{}{}", spice_name, leg.suffix());
        Ok(self.vector_or(&signal, 0.0))
    }

    pub fn device_type_code(&self, instance: &ComponentInstance) -> Result<char, DeviceQueryError> {
        self.index.type_code(instance)
    }

    /// Rated limit stored in a property. An unset property means no limit.
    pub fn max_property_value(
        &self,
        instance: &ComponentInstance,
        property: &str,
    ) -> Result<f64, DeviceQueryError> {
        max_property_value(instance, property)
    }
}

fn element_name(instance: &ComponentInstance, subpart: &str) -> String {
    let mut name = instance.title.to_lowercase();
    name.push_str(&subpart.to_lowercase());
    name
}

/// See [`Probe::max_property_value`].
pub fn max_property_value(instance: &ComponentInstance, property: &str) -> Result<f64, DeviceQueryError> {
    match instance.property(property) {
        Some(prop) if !prop.value.trim().is_empty() => from_engineering(&prop.value, &prop.symbol)
            .map_err(|source| DeviceQueryError::BadProperty {
                title: instance.title.clone(),
                property: property.to_string(),
                source,
            }),
        _ => Ok(f64::INFINITY),
    }
}
