//! Per-family checks that decide whether a part works within its ratings.

use log::debug;
use serde::Serialize;

use crate::circuit::{ComponentInstance, DeviceKind, InstanceId, Polarity, SensorOutput};
use crate::error::DeviceQueryError;
use crate::presentation::Overlay;
use crate::probe::{Probe, TransistorLeg};
use crate::units::{from_engineering, to_engineering};

/// Fraction of the short-circuit current a battery tolerates.
pub const DEFAULT_BATTERY_SAFETY_MARGIN: f64 = 0.1;

/// Readings smaller than this are shown as zero.
const DISPLAY_ZERO: f64 = 1.0e-12;

/// Digits of the multimeter screen, the decimal point excluded.
const DISPLAY_WIDTH: usize = 5;

/// Whether an instance took part in the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Simulated,
    NotSimulated,
}

/// Outcome of the diagnostics for one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticVerdict {
    pub instance: InstanceId,
    pub title: String,
    pub kind: Option<DeviceKind>,
    pub coverage: Coverage,
    pub overlays: Vec<Overlay>,
    /// Requested LED brightness, relative to the rated current.
    pub brightness: Option<f64>,
}

impl DiagnosticVerdict {
    pub fn new(instance: &ComponentInstance, kind: DeviceKind) -> Self {
        DiagnosticVerdict {
            instance: instance.id,
            title: instance.title.clone(),
            kind: Some(kind),
            coverage: Coverage::Simulated,
            overlays: Vec::new(),
            brightness: None,
        }
    }

    /// A simulated instance no rule applies to.
    pub fn undiagnosed(instance: &ComponentInstance) -> Self {
        DiagnosticVerdict {
            instance: instance.id,
            title: instance.title.clone(),
            kind: None,
            coverage: Coverage::Simulated,
            overlays: Vec::new(),
            brightness: None,
        }
    }

    pub fn not_simulated(instance: InstanceId, title: &str) -> Self {
        DiagnosticVerdict {
            instance,
            title: title.to_string(),
            kind: None,
            coverage: Coverage::NotSimulated,
            overlays: Vec::new(),
            brightness: None,
        }
    }

    pub fn has_smoke(&self) -> bool {
        self.overlays.contains(&Overlay::Smoke)
    }

    pub fn display(&self) -> Option<&str> {
        self.overlays.iter().find_map(|overlay| match overlay {
            Overlay::Display(text) => Some(text.as_str()),
            _ => None,
        })
    }

    fn smoke(&mut self) {
        self.overlays.push(Overlay::Smoke);
    }

    fn show(&mut self, text: String) {
        self.overlays.push(Overlay::Display(text));
    }
}

/// Pads a screen message on the left so it fills the display. The decimal
/// point shares a cell with the preceding digit.
pub fn pad_display(msg: &str) -> String {
    let cells = msg.chars().filter(|&c| c != '.').count();
    if cells < DISPLAY_WIDTH {
        format!("{}{}", " ".repeat(DISPLAY_WIDTH - cells), msg)
    } else {
        msg.to_string()
    }
}

/// Formats a reading for the multimeter screen: four significant digits,
/// upper-case 'K' for kilo, padded to the screen width.
pub fn format_reading(value: f64) -> String {
    if !value.is_finite() {
        return pad_display("ERR");
    }
    let value = if value.abs() < DISPLAY_ZERO { 0.0 } else { value };

    let precision = 4usize.saturating_sub(integer_cells(&to_engineering(value, "", 6)));
    let mut text = to_engineering(value, "", precision);
    // Rounding can gain an integer digit: 999.95 -> "1000.0" -> "1.0k".
    let settled = 4usize.saturating_sub(integer_cells(&text));
    if settled != precision {
        let rounded = from_engineering(&text, "").unwrap_or(value);
        text = to_engineering(rounded, "", settled);
    }
    pad_display(&text.replace('k', "K"))
}

/// Cells taken by the sign and the integer digits.
fn integer_cells(text: &str) -> usize {
    text.chars().take_while(|c| c.is_ascii_digit() || *c == '-').count()
}

fn error_display() -> String {
    pad_display("ERR")
}

/// The rule set, dispatched on [`DeviceKind`].
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub battery_safety_margin: f64,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            battery_safety_margin: DEFAULT_BATTERY_SAFETY_MARGIN,
        }
    }
}

impl RuleSet {
    pub fn new(battery_safety_margin: f64) -> Self {
        RuleSet {
            battery_safety_margin,
        }
    }

    /// Checks one instance against the finished solve.
    pub fn diagnose(
        &self,
        part: &ComponentInstance,
        kind: DeviceKind,
        probe: &Probe<'_>,
    ) -> Result<DiagnosticVerdict, DeviceQueryError> {
        let mut verdict = DiagnosticVerdict::new(part, kind);
        match kind {
            DeviceKind::Capacitor(polarity) => check_capacitor(part, polarity, probe, &mut verdict)?,
            DeviceKind::Diode => check_power(part, probe, &mut verdict)?,
            DeviceKind::Led => check_led(part, probe, &mut verdict)?,
            DeviceKind::Resistor => check_power(part, probe, &mut verdict)?,
            DeviceKind::Multimeter => check_multimeter(part, probe, &mut verdict)?,
            DeviceKind::DcMotor => check_dc_motor(part, probe, &mut verdict)?,
            DeviceKind::Sensor(output) => check_sensor(part, output, probe, &mut verdict)?,
            DeviceKind::Battery => self.check_battery(part, probe, &mut verdict)?,
            DeviceKind::Potentiometer => check_potentiometer(part, probe, &mut verdict)?,
        }
        Ok(verdict)
    }

    /// A battery is shorted when it delivers more than a fraction of its
    /// short-circuit current.
    fn check_battery(
        &self,
        part: &ComponentInstance,
        probe: &Probe<'_>,
        verdict: &mut DiagnosticVerdict,
    ) -> Result<(), DeviceQueryError> {
        let voltage = probe.max_property_value(part, "voltage")?;
        let resistance = probe.max_property_value(part, "internal resistance")?;
        let max_current = voltage / resistance * self.battery_safety_margin;
        let current = probe.current(part, "")?;
        debug!(
            "{}: voltage={} resistance={} max current={} current={}",
            part.title, voltage, resistance, max_current, current
        );
        if current.abs() > max_current {
            verdict.smoke();
        }
        Ok(())
    }
}

/// Diodes and resistors burn when they dissipate more than rated.
fn check_power(
    part: &ComponentInstance,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let max_power = probe.max_property_value(part, "power")?;
    let power = probe.power(part, "")?;
    debug!("{}: power={} max={}", part.title, power, max_power);
    if power > max_power {
        verdict.smoke();
    }
    Ok(())
}

fn check_potentiometer(
    part: &ComponentInstance,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let max_power = probe.max_property_value(part, "power")?;
    let power = probe.power(part, "A")? + probe.power(part, "B")?;
    if power > max_power {
        verdict.smoke();
    }
    Ok(())
}

fn check_led(
    part: &ComponentInstance,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let current = probe.current(part, "")?;
    let max_current = probe.max_property_value(part, "current")?;
    debug!("{}: current={} max={}", part.title, current, max_current);

    if current > max_current {
        verdict.smoke();
        verdict.brightness = Some(0.0);
    } else {
        verdict.brightness = Some(current / max_current);
    }
    Ok(())
}

fn check_capacitor(
    part: &ComponentInstance,
    polarity: Polarity,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let (Some(pos), Some(neg)) = (part.pin_named("+"), part.pin_named("-")) else {
        return Ok(());
    };

    let max_voltage = probe.max_property_value(part, "voltage")?;
    let v = probe.voltage(pos.id, neg.id)?;
    debug!("{}: voltage={} max={}", part.title, v, max_voltage);

    let burnt = match polarity {
        Polarity::Bidirectional => v.abs() > max_voltage,
        // Electrolytic and tantalum parts also fail under reverse bias.
        Polarity::Polarized => v > max_voltage / 2.0 || v < 0.0,
    };
    if burnt {
        verdict.smoke();
    }
    Ok(())
}

fn check_sensor(
    part: &ComponentInstance,
    output: SensorOutput,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let max_voltage = probe.max_property_value(part, "voltage (max)")?;
    let max_output_current = probe.max_property_value(part, "max output current")?;

    let vcc = part.pin_described(&["vcc", "supply voltage"]);
    let gnd = part.pin_described(&["gnd", "ground"]);
    let out = part.pin_described(&["out", "output voltage"]);
    let (Some(vcc), Some(gnd), Some(_out)) = (vcc, gnd, out) else {
        return Ok(());
    };

    let supply = probe.voltage(vcc.id, gnd.id)?;
    let output_current = match output {
        SensorOutput::PushPull => {
            let transistor = format!("q{}", part.title.to_lowercase());
            probe.transistor_leg_current(&transistor, TransistorLeg::Collector)?
        }
        SensorOutput::Analog => probe.current(part, "a")?,
    };
    debug!(
        "{}: supply={} max={} output current={} max={}",
        part.title, supply, max_voltage, output_current, max_output_current
    );

    if supply > max_voltage || supply < 0.0 || output_current.abs() > max_output_current {
        verdict.smoke();
    }
    Ok(())
}

fn check_dc_motor(
    part: &ComponentInstance,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let max_voltage = probe.max_property_value(part, "voltage (max)")?;
    let min_voltage = probe.max_property_value(part, "voltage (min)")?;

    let (Some(pin1), Some(pin2)) = (part.pin_named("pin 1"), part.pin_named("pin 2")) else {
        return Ok(());
    };

    let v = probe.voltage(pin1.id, pin2.id)?;
    if v.abs() > max_voltage {
        verdict.smoke();
    } else if v.abs() >= min_voltage {
        debug!("{}: motor rotates at {} V", part.title, v);
        verdict.overlays.push(if v > 0.0 {
            Overlay::RotateCw
        } else {
            Overlay::RotateCcw
        });
    }
    Ok(())
}

fn check_multimeter(
    part: &ComponentInstance,
    probe: &Probe<'_>,
    verdict: &mut DiagnosticVerdict,
) -> Result<(), DeviceQueryError> {
    let com = part.pin_named("com probe");
    let v_probe = part.pin_named("v probe");
    let a_probe = part.pin_named("a probe");
    let (Some(com), Some(v_probe), Some(a_probe)) = (com, v_probe, a_probe) else {
        return Ok(());
    };

    if com.wired && v_probe.wired && a_probe.wired {
        debug!("{}: all three probes connected", part.title);
        verdict.show(error_display());
        return Ok(());
    }

    let variant = part
        .property("variant")
        .map(|p| p.value.to_lowercase())
        .unwrap_or_default();

    match variant.as_str() {
        "voltmeter (dc)" => {
            if a_probe.wired {
                verdict.show(error_display());
            } else if com.wired && v_probe.wired {
                let v = probe.voltage(v_probe.id, com.id)?;
                verdict.show(format_reading(v));
            }
        }
        "ammeter (dc)" => {
            if v_probe.wired {
                verdict.show(error_display());
            } else {
                verdict.show(format_reading(probe.current(part, "")?));
            }
        }
        "ohmmeter" => {
            if a_probe.wired {
                verdict.show(error_display());
            } else {
                let v = probe.voltage(v_probe.id, com.id)?;
                let i = probe.current(part, "")?;
                debug!("{}: ohmmeter v={} i={}", part.title, v, i);
                verdict.show(format_reading((v / i).abs()));
            }
        }
        other => debug!("{}: unknown multimeter variant '{}'", part.title, other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Pin, PinId};
    use crate::engine::{Recording, ReplayEngine};
    use crate::index::SessionIndex;

    fn run(part: &ComponentInstance, nets: &[Vec<PinId>], recording: Recording) -> DiagnosticVerdict {
        let index = SessionIndex::build(nets, std::slice::from_ref(part), &[]);
        let engine = ReplayEngine::new(recording);
        let probe = Probe::new(&engine, &index);
        let kind = index.kind(part.id).expect("classified part");
        RuleSet::default().diagnose(part, kind, &probe).unwrap()
    }

    fn resistor(power: &str) -> ComponentInstance {
        ComponentInstance::new(1, "R1", "Resistor")
            .with_spice("R{instanceTitle} {net connector0} {net connector1} {resistance}")
            .with_property("power", power, "W")
    }

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(3.3), " 3.300");
        assert_eq!(format_reading(1500.0), "1.500K");
        assert_eq!(format_reading(470.0), " 470.0");
        assert_eq!(format_reading(-3.3), " -3.30");
        assert_eq!(format_reading(1.0e-15), " 0.000");
        assert_eq!(format_reading(0.0215), "21.50m");
        assert_eq!(format_reading(f64::INFINITY), "  ERR");
    }

    #[test]
    fn test_format_reading_after_rounding_up() {
        assert_eq!(format_reading(999.95), "1.000K");
        assert_eq!(format_reading(999.97), "1.000K");
        assert_eq!(format_reading(-999.97), "-1.00K");
        assert_eq!(format_reading(99.9996), " 100.0");
        assert_eq!(format_reading(9.99996), " 10.00");
    }

    #[test]
    fn test_resistor_power_is_strict() {
        let over = run(&resistor("0.25"), &[], Recording::default().with_vector("@r1[p]", 0.30));
        assert!(over.has_smoke());

        let at_limit = run(&resistor("0.25"), &[], Recording::default().with_vector("@r1[p]", 0.25));
        assert!(!at_limit.has_smoke());
    }

    #[test]
    fn test_unset_rating_never_smokes() {
        let part = ComponentInstance::new(1, "D1", "rectifier diode")
            .with_spice("D{instanceTitle} {net connector0} {net connector1} 1N4001");
        let verdict = run(&part, &[], Recording::default().with_vector("@d1[p]", 100.0));
        assert!(!verdict.has_smoke());
    }

    fn led() -> ComponentInstance {
        ComponentInstance::new(1, "LED1", "LED")
            .with_spice("D{instanceTitle} {net connector0} {net connector1} LED")
            .with_property("current", "0.02", "A")
    }

    #[test]
    fn test_led_over_current() {
        let verdict = run(&led(), &[], Recording::default().with_vector("@dled1[id]", 0.025));
        assert!(verdict.has_smoke());
        assert_eq!(verdict.brightness, Some(0.0));
    }

    #[test]
    fn test_led_brightness() {
        let verdict = run(&led(), &[], Recording::default().with_vector("@dled1[id]", 0.01));
        assert!(!verdict.has_smoke());
        assert_eq!(verdict.brightness, Some(0.5));
    }

    fn capacitor(family: &str) -> ComponentInstance {
        ComponentInstance::new(1, "C1", family)
            .with_spice("C{instanceTitle} {net connector0} {net connector1} {capacitance}")
            .with_property("voltage", "16V", "V")
            .with_pin(Pin::new(10, "+"))
            .with_pin(Pin::new(11, "-"))
    }

    fn cap_nets() -> Vec<Vec<PinId>> {
        vec![vec![PinId(11)], vec![PinId(10)]]
    }

    #[test]
    fn test_polarized_capacitor_reverse_bias() {
        let verdict = run(
            &capacitor("Electrolytic Capacitor"),
            &cap_nets(),
            Recording::default().with_vector("v(1)", -0.5),
        );
        assert!(verdict.has_smoke());
    }

    #[test]
    fn test_polarized_capacitor_half_rating() {
        let ok = run(
            &capacitor("Electrolytic Capacitor"),
            &cap_nets(),
            Recording::default().with_vector("v(1)", 8.0),
        );
        assert!(!ok.has_smoke());

        let over = run(
            &capacitor("Electrolytic Capacitor"),
            &cap_nets(),
            Recording::default().with_vector("v(1)", 8.5),
        );
        assert!(over.has_smoke());
    }

    #[test]
    fn test_bidirectional_capacitor() {
        let reverse = run(
            &capacitor("Ceramic Capacitor Bidirectional"),
            &cap_nets(),
            Recording::default().with_vector("v(1)", -12.0),
        );
        assert!(!reverse.has_smoke());

        let over = run(
            &capacitor("Ceramic Capacitor Bidirectional"),
            &cap_nets(),
            Recording::default().with_vector("v(1)", -16.5),
        );
        assert!(over.has_smoke());
    }

    #[test]
    fn test_capacitor_without_polarity_pins_has_no_verdict() {
        let part = ComponentInstance::new(1, "C1", "capacitor")
            .with_property("voltage", "1", "V")
            .with_pin(Pin::new(10, "pin 1"));
        let verdict = run(&part, &[], Recording::default());
        assert!(verdict.overlays.is_empty());
    }

    fn battery() -> ComponentInstance {
        ComponentInstance::new(1, "VCC1", "Battery")
            .with_spice("V{instanceTitle} {net connector1} {net connector0} DC {voltage}")
            .with_property("voltage", "9V", "V")
            .with_property("internal resistance", "1Ω", "Ω")
    }

    #[test]
    fn test_battery_short_circuit() {
        let shorted = run(&battery(), &[], Recording::default().with_vector("@vcc1[i]", -1.0));
        assert!(shorted.has_smoke());

        let fine = run(&battery(), &[], Recording::default().with_vector("@vcc1[i]", 0.5));
        assert!(!fine.has_smoke());
    }

    #[test]
    fn test_potentiometer_sums_legs() {
        let pot = ComponentInstance::new(1, "R2", "Rotary Potentiometer (Small)")
            .with_property("power", "0.1", "W");
        let verdict = run(
            &pot,
            &[],
            Recording::default()
                .with_vector("@r2a[p]", 0.06)
                .with_vector("@r2b[p]", 0.06),
        );
        assert!(verdict.has_smoke());
    }

    fn motor() -> ComponentInstance {
        ComponentInstance::new(1, "M1", "DC Motor")
            .with_property("voltage (max)", "6", "V")
            .with_property("voltage (min)", "1.5", "V")
            .with_pin(Pin::new(10, "pin 1"))
            .with_pin(Pin::new(11, "pin 2"))
    }

    #[test]
    fn test_dc_motor_rotation() {
        let nets = vec![vec![PinId(11)], vec![PinId(10)]];
        let cw = run(&motor(), &nets, Recording::default().with_vector("v(1)", 3.0));
        assert_eq!(cw.overlays, vec![Overlay::RotateCw]);

        let ccw = run(&motor(), &nets, Recording::default().with_vector("v(1)", -3.0));
        assert_eq!(ccw.overlays, vec![Overlay::RotateCcw]);

        let stalled = run(&motor(), &nets, Recording::default().with_vector("v(1)", 1.0));
        assert!(stalled.overlays.is_empty());

        let burnt = run(&motor(), &nets, Recording::default().with_vector("v(1)", 9.0));
        assert_eq!(burnt.overlays, vec![Overlay::Smoke]);
    }

    fn sensor(family: &str) -> ComponentInstance {
        ComponentInstance::new(1, "U1", family)
            .with_spice("V{instanceTitle}a {net connector2} 0 DC 1")
            .with_property("voltage (max)", "5.5", "V")
            .with_property("voltage (min)", "4.5", "V")
            .with_property("max output current", "10mA", "A")
            .with_pin(Pin::new(10, "1").described("VCC"))
            .with_pin(Pin::new(11, "2").described("GND"))
            .with_pin(Pin::new(12, "3").described("OUT"))
    }

    #[test]
    fn test_line_sensor_reads_transistor_collector() {
        let nets = vec![vec![PinId(11)], vec![PinId(10)]];
        let verdict = run(
            &sensor("Line Sensor"),
            &nets,
            Recording::default()
                .with_vector("v(1)", 5.0)
                .with_vector("@qu1[ic]", 0.02),
        );
        assert!(verdict.has_smoke());
    }

    #[test]
    fn test_distance_sensor_supply_limits() {
        let nets = vec![vec![PinId(11)], vec![PinId(10)]];
        let fine = run(
            &sensor("Distance Sensor"),
            &nets,
            Recording::default()
                .with_vector("v(1)", 5.0)
                .with_vector("@vu1a[i]", 0.001),
        );
        assert!(!fine.has_smoke());

        let reversed = run(
            &sensor("Distance Sensor"),
            &nets,
            Recording::default().with_vector("v(1)", -5.0),
        );
        assert!(reversed.has_smoke());
    }

    fn multimeter(variant: &str, com: bool, v: bool, a: bool) -> ComponentInstance {
        let pin = |id, name, wired| {
            let pin = Pin::new(id, name);
            if wired {
                pin.wired()
            } else {
                pin
            }
        };
        ComponentInstance::new(1, "Multimeter1", "Multimeter")
            .with_spice("R{instanceTitle} {net connector0} {net connector1} 1e-6")
            .with_property("variant", variant, "")
            .with_pin(pin(10, "COM Probe", com))
            .with_pin(pin(11, "V Probe", v))
            .with_pin(pin(12, "A Probe", a))
    }

    fn meter_nets() -> Vec<Vec<PinId>> {
        vec![vec![PinId(10)], vec![PinId(11)], vec![PinId(12)]]
    }

    #[test]
    fn test_multimeter_three_probes_is_error() {
        for variant in ["voltmeter (dc)", "ammeter (dc)", "ohmmeter"] {
            let verdict = run(
                &multimeter(variant, true, true, true),
                &meter_nets(),
                Recording::default(),
            );
            assert_eq!(verdict.display().map(str::trim), Some("ERR"));
        }
    }

    #[test]
    fn test_voltmeter_reading() {
        let verdict = run(
            &multimeter("Voltmeter (DC)", true, true, false),
            &meter_nets(),
            Recording::default().with_vector("v(1)", 3.3),
        );
        assert_eq!(verdict.display(), Some(" 3.300"));
    }

    #[test]
    fn test_voltmeter_with_current_probe_is_error() {
        let verdict = run(
            &multimeter("voltmeter (dc)", true, false, true),
            &meter_nets(),
            Recording::default(),
        );
        assert_eq!(verdict.display(), Some("  ERR"));
    }

    #[test]
    fn test_voltmeter_unconnected_shows_nothing() {
        let verdict = run(
            &multimeter("voltmeter (dc)", true, false, false),
            &meter_nets(),
            Recording::default(),
        );
        assert_eq!(verdict.display(), None);
    }

    #[test]
    fn test_ammeter_reading() {
        let verdict = run(
            &multimeter("ammeter (dc)", true, false, true),
            &meter_nets(),
            Recording::default().with_vector("@rmultimeter1[i]", 0.0125),
        );
        assert_eq!(verdict.display(), Some("12.50m"));

        let wrong = run(
            &multimeter("ammeter (dc)", true, true, false),
            &meter_nets(),
            Recording::default(),
        );
        assert_eq!(wrong.display(), Some("  ERR"));
    }

    #[test]
    fn test_ohmmeter_reading() {
        let verdict = run(
            &multimeter("ohmmeter", true, true, false),
            &meter_nets(),
            Recording::default()
                .with_vector("v(1)", 2.2)
                .with_vector("@rmultimeter1[i]", -0.001),
        );
        assert_eq!(verdict.display(), Some("2.200K"));
    }

    #[test]
    fn test_ohmmeter_with_ammeter_lead_is_error() {
        let verdict = run(
            &multimeter("ohmmeter", true, false, true),
            &meter_nets(),
            Recording::default()
                .with_vector("v(1)", 2.2)
                .with_vector("@rmultimeter1[i]", -0.001),
        );
        assert_eq!(verdict.display(), Some("  ERR"));
    }

    #[test]
    fn test_query_error_surfaces() {
        let part = ComponentInstance::new(1, "LED1", "LED").with_property("current", "20mA", "A");
        let index = SessionIndex::build(&[], std::slice::from_ref(&part), &[]);
        let engine = ReplayEngine::new(Recording::default());
        let probe = Probe::new(&engine, &index);
        let result = RuleSet::default().diagnose(&part, DeviceKind::Led, &probe);
        assert!(matches!(result, Err(DeviceQueryError::MissingTypeCode { .. })));
    }
}
