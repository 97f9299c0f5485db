use std::collections::HashMap;

use log::{debug, warn};

use crate::circuit::{ComponentInstance, DeviceKind, InstanceId, PinId, SceneItem, TITLE_PLACEHOLDER};
use crate::error::DeviceQueryError;

/// Net id that always sits at 0 V.
pub const GROUND_NET: usize = 0;

/// Lookup tables for one simulation session. Rebuilt from scratch for every
/// run and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct SessionIndex {
    pin_nets: HashMap<PinId, usize>,
    net_count: usize,
    counterparts: HashMap<InstanceId, InstanceId>,
    origins: HashMap<InstanceId, InstanceId>,
    kinds: HashMap<InstanceId, DeviceKind>,
    type_codes: HashMap<InstanceId, Result<char, DeviceQueryError>>,
}

impl SessionIndex {
    /// Indexes `nets` and matches every simulated instance with the
    /// same-titled part of the other view.
    pub fn build(
        nets: &[Vec<PinId>],
        instances: &[ComponentInstance],
        other_view: &[SceneItem],
    ) -> Self {
        let mut pin_nets = HashMap::new();
        for (net, pins) in nets.iter().enumerate() {
            for &pin in pins {
                if let Some(previous) = pin_nets.insert(pin, net) {
                    warn!("pin {:?} listed in nets {} and {}", pin, previous, net);
                }
            }
        }

        let mut by_title: HashMap<&str, InstanceId> = HashMap::with_capacity(other_view.len());
        for item in other_view.iter().filter(|item| !item.kind.is_structural()) {
            if by_title.contains_key(item.title.as_str()) {
                warn!("duplicate title '{}' in the other view, keeping the first", item.title);
                continue;
            }
            by_title.insert(item.title.as_str(), item.id);
        }

        let mut counterparts = HashMap::new();
        let mut origins = HashMap::new();
        let mut kinds = HashMap::new();
        let mut type_codes = HashMap::new();
        for instance in instances {
            match by_title.get(instance.title.as_str()) {
                Some(&other) => {
                    counterparts.insert(instance.id, other);
                    origins.insert(other, instance.id);
                }
                None => debug!("no counterpart for '{}'", instance.title),
            }
            if let Some(kind) = instance.kind() {
                kinds.insert(instance.id, kind);
            }
            type_codes.insert(instance.id, device_type_code(instance));
        }

        SessionIndex {
            pin_nets,
            net_count: nets.len(),
            counterparts,
            origins,
            kinds,
            type_codes,
        }
    }

    /// Net of `pin`. Pins missing from the net list are unmapped.
    pub fn net_of(&self, pin: PinId) -> Option<usize> {
        self.pin_nets.get(&pin).copied()
    }

    pub fn net_count(&self) -> usize {
        self.net_count
    }

    /// The other view's item for a simulated instance.
    pub fn counterpart(&self, instance: InstanceId) -> Option<InstanceId> {
        self.counterparts.get(&instance).copied()
    }

    /// The simulated instance an other-view item stands for.
    pub fn origin(&self, counterpart: InstanceId) -> Option<InstanceId> {
        self.origins.get(&counterpart).copied()
    }

    pub fn kind(&self, instance: InstanceId) -> Option<DeviceKind> {
        self.kinds.get(&instance).copied()
    }

    /// Type code letter derived when the index was built.
    pub fn type_code(&self, instance: &ComponentInstance) -> Result<char, DeviceQueryError> {
        match self.type_codes.get(&instance.id) {
            Some(code) => code.clone(),
            None => device_type_code(instance),
        }
    }
}

/// The solver element letter of an instance: the character right before the
/// title placeholder in its spice template, lowercased.
pub fn device_type_code(instance: &ComponentInstance) -> Result<char, DeviceQueryError> {
    let missing = || DeviceQueryError::MissingTypeCode {
        title: instance.title.clone(),
        template: instance.spice.clone(),
    };
    let position = instance.spice.find(TITLE_PLACEHOLDER).ok_or_else(missing)?;
    instance.spice[..position]
        .chars()
        .next_back()
        .map(|c| c.to_ascii_lowercase())
        .ok_or_else(missing)
}
