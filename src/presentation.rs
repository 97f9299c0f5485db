use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::circuit::InstanceId;

/// A diagnostic marker attached to an instance for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    Smoke,
    RotateCw,
    RotateCcw,
    Display(String),
}

/// State changes and messages for the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    EnabledChanged(bool),
    SimulatingChanged(bool),
    Error { title: String, message: String },
}

/// Where diagnostics are shown. Requests only, the GUI does the rendering.
pub trait Presentation {
    fn set_dimmed(&mut self, instance: InstanceId, dimmed: bool);

    fn add_overlay(&mut self, instance: InstanceId, overlay: &Overlay);

    fn set_brightness(&mut self, instance: InstanceId, ratio: f64);

    /// Removes overlays, dimming and brightness of one instance.
    fn clear_overlays(&mut self, instance: InstanceId);

    /// Removes everything a previous session put on any view.
    fn clear_all(&mut self);

    fn notify(&mut self, notification: Notification);
}

/// In-memory surface that keeps what was requested.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub overlays: HashMap<InstanceId, Vec<Overlay>>,
    pub dimmed: HashSet<InstanceId>,
    pub brightness: HashMap<InstanceId, f64>,
    pub notifications: Vec<Notification>,
}

impl RecordingSurface {
    pub fn overlays_of(&self, instance: InstanceId) -> &[Overlay] {
        self.overlays
            .get(&instance)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_smoke(&self, instance: InstanceId) -> bool {
        self.overlays_of(instance).contains(&Overlay::Smoke)
    }

    pub fn is_dimmed(&self, instance: InstanceId) -> bool {
        self.dimmed.contains(&instance)
    }

    /// True when nothing is shown on any instance.
    pub fn is_clean(&self) -> bool {
        self.overlays.values().all(Vec::is_empty) && self.dimmed.is_empty() && self.brightness.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Error { message, .. } => Some(message.as_str()),
            _ => None,
        })
    }
}

impl Presentation for RecordingSurface {
    fn set_dimmed(&mut self, instance: InstanceId, dimmed: bool) {
        if dimmed {
            self.dimmed.insert(instance);
        } else {
            self.dimmed.remove(&instance);
        }
    }

    fn add_overlay(&mut self, instance: InstanceId, overlay: &Overlay) {
        self.overlays.entry(instance).or_default().push(overlay.clone());
    }

    fn set_brightness(&mut self, instance: InstanceId, ratio: f64) {
        self.brightness.insert(instance, ratio);
    }

    fn clear_overlays(&mut self, instance: InstanceId) {
        self.overlays.remove(&instance);
        self.dimmed.remove(&instance);
        self.brightness.remove(&instance);
    }

    fn clear_all(&mut self) {
        self.overlays.clear();
        self.dimmed.clear();
        self.brightness.clear();
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
