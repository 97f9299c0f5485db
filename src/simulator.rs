//! Drives one simulation session at a time: netlist, engine run, wait,
//! diagnostics, presentation.

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::circuit::{ComponentInstance, InstanceId, SceneItem};
use crate::config::SimulatorConfig;
use crate::engine::{CancelToken, Engine, LogStream, WaitResult};
use crate::error::{SessionError, SkipReason, Skipped};
use crate::index::SessionIndex;
use crate::netlist::{NetlistBuilder, NetlistSnapshot};
use crate::presentation::{Notification, Presentation};
use crate::probe::Probe;
use crate::report::SessionReport;
use crate::rules::{DiagnosticVerdict, RuleSet};
use crate::scheduler::DebounceTimer;

/// Title of every error notification.
pub const ERROR_TITLE: &str = "Simulator Error";

/// Where the orchestrator is within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Triggered,
    Loading,
    Running,
    Waiting,
    Diagnosing,
    LoadFailed,
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Triggered => "triggered",
            SessionState::Loading => "loading",
            SessionState::Running => "running",
            SessionState::Waiting => "waiting",
            SessionState::Diagnosing => "diagnosing",
            SessionState::LoadFailed => "load failed",
            SessionState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// The live-simulation orchestrator.
pub struct Simulator<E: Engine, N: NetlistBuilder, P: Presentation> {
    engine: E,
    builder: N,
    surface: P,
    config: SimulatorConfig,
    rules: RuleSet,
    enabled: bool,
    simulating: bool,
    state: SessionState,
    timer: DebounceTimer,
    cancel: CancelToken,
}

impl<E: Engine, N: NetlistBuilder, P: Presentation> Simulator<E, N, P> {
    pub fn new(engine: E, builder: N, surface: P, config: SimulatorConfig) -> Self {
        Simulator {
            engine,
            builder,
            surface,
            rules: RuleSet::new(config.battery_safety_margin),
            enabled: config.enabled_at_startup,
            simulating: false,
            state: SessionState::Idle,
            timer: DebounceTimer::new(config.debounce()),
            cancel: CancelToken::new(),
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn builder_mut(&mut self) -> &mut N {
        &mut self.builder
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token that aborts a session waiting on the engine, usable from
    /// another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("session state {} -> {}", self.state, next);
            self.state = next;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns the feature on or off. Turning it off removes everything the
    /// simulator shows.
    pub fn enable(&mut self, enable: bool) {
        if self.enabled != enable {
            info!("simulator {}", if enable { "enabled" } else { "disabled" });
            self.surface.notify(Notification::EnabledChanged(enable));
        }
        self.enabled = enable;
        if !enable {
            self.timer.cancel();
            self.surface.clear_all();
            if self.state == SessionState::Triggered {
                self.transition(SessionState::Idle);
            }
        }
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    /// Enters simulation mode and runs a first session right away.
    pub fn start_simulation(&mut self) -> Result<Option<SessionReport>, SessionError> {
        self.simulating = true;
        self.surface.notify(Notification::SimulatingChanged(true));
        self.simulate()
    }

    /// Leaves simulation mode and removes every overlay and dimming.
    pub fn stop_simulation(&mut self) {
        self.simulating = false;
        self.timer.cancel();
        self.cancel.cancel();
        self.surface.clear_all();
        self.surface.notify(Notification::SimulatingChanged(false));
        self.transition(SessionState::Idle);
    }

    /// Reports a circuit change. Only arms the debounce timer, sessions start
    /// from [`run_pending`](Self::run_pending).
    pub fn trigger(&mut self, now: Instant) {
        if !self.simulating {
            return;
        }
        self.timer.arm(now);
        if self.state == SessionState::Idle {
            self.transition(SessionState::Triggered);
        }
    }

    /// Runs a session if the debounce delay elapsed.
    pub fn run_pending(&mut self, now: Instant) -> Result<Option<SessionReport>, SessionError> {
        if self.timer.fire_if_due(now) {
            self.simulate()
        } else {
            Ok(None)
        }
    }

    /// Runs one session. `Ok(None)` when the simulator is disabled or not in
    /// simulation mode.
    ///
    /// Session failures are also reported to the presentation surface, the
    /// returned error is for the caller's bookkeeping.
    pub fn simulate(&mut self) -> Result<Option<SessionReport>, SessionError> {
        if !self.enabled || !self.simulating {
            debug!("simulator is not enabled or not simulating");
            self.transition(SessionState::Idle);
            return Ok(None);
        }

        self.timer.cancel();
        self.cancel.reset();
        let started = Instant::now();

        match self.run_session() {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                info!(
                    "session finished in {:?}: {} verdicts, {} dimmed, {} skipped",
                    report.elapsed,
                    report.verdicts.len(),
                    report.dimmed.len(),
                    report.skipped.len()
                );
                self.transition(SessionState::Idle);
                Ok(Some(report))
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn fail(&mut self, err: &SessionError) {
        error!("simulation session failed: {}", err);
        match err {
            SessionError::EngineInit(_) | SessionError::NetlistLoad { .. } => {
                if matches!(err, SessionError::NetlistLoad { .. }) {
                    self.transition(SessionState::LoadFailed);
                }
                self.stop_simulation();
            }
            SessionError::EngineTimeout { .. } | SessionError::Cancelled => {
                self.transition(SessionState::Aborted);
                self.surface.clear_all();
            }
            SessionError::FatalSolve { .. } | SessionError::Engine(_) | SessionError::Netlist(_) => {
                self.surface.clear_all();
            }
        }
        if !matches!(err, SessionError::Cancelled) {
            self.surface.notify(Notification::Error {
                title: ERROR_TITLE.to_string(),
                message: err.user_message(),
            });
        }
        self.transition(SessionState::Idle);
    }

    fn engine_log(&self) -> String {
        format!(
            "{}{}",
            self.engine.log(LogStream::Stdout),
            self.engine.log(LogStream::Stderr)
        )
    }

    fn run_session(&mut self) -> Result<SessionReport, SessionError> {
        self.transition(SessionState::Loading);
        self.engine.init().map_err(SessionError::EngineInit)?;
        self.engine.clear_log();

        let view = self.config.netlist_view;
        let snapshot = self.builder.build_netlist(view, &self.config.netlist_label)?;
        debug!("netlist:\n{}", snapshot.circuit);

        self.load(&snapshot)?;

        self.transition(SessionState::Running);
        self.engine.command("listing")?;
        let signal = self.engine.background_run()?;

        // Work done while the engine runs.
        let index = SessionIndex::build(
            &snapshot.nets,
            &snapshot.instances,
            &self.builder.scene_items(view.other()),
        );
        self.surface.clear_all();
        let (dimmed, not_simulated) = self.dim_non_simulated(&snapshot, &index);

        self.transition(SessionState::Waiting);
        match signal.wait(self.config.timeout(), self.config.poll_interval(), &self.cancel) {
            WaitResult::Finished => debug!("the engine has finished"),
            WaitResult::TimedOut => {
                if let Err(err) = self.engine.command("bg_halt") {
                    warn!("could not halt the engine: {}", err);
                }
                return Err(SessionError::EngineTimeout {
                    timeout: self.config.timeout(),
                });
            }
            WaitResult::Cancelled => {
                if self.engine.is_background_running() {
                    debug!("session cancelled while the engine is still running");
                }
                return Err(SessionError::Cancelled);
            }
            WaitResult::Failed(reason) => {
                return Err(SessionError::FatalSolve {
                    log: format!("{}{}\n", self.engine_log(), reason),
                    circuit: snapshot.circuit,
                });
            }
        }

        let stderr = self.engine.log(LogStream::Stderr);
        if self.engine.error_occurred() || self.config.heuristics.fatal(&stderr) {
            warn!("fatal error found, stopping the simulation");
            return Err(SessionError::FatalSolve {
                log: self.engine_log(),
                circuit: snapshot.circuit,
            });
        }

        self.transition(SessionState::Diagnosing);
        let (mut verdicts, skipped) = diagnose_all(
            &self.engine,
            &mut self.surface,
            &self.rules,
            &index,
            &snapshot.instances,
        );
        verdicts.extend(not_simulated);

        Ok(SessionReport {
            verdicts,
            dimmed,
            skipped,
            elapsed: Default::default(),
        })
    }

    /// Replaces whatever circuit the engine holds with `snapshot`.
    fn load(&mut self, snapshot: &NetlistSnapshot) -> Result<(), SessionError> {
        self.engine.command("remcirc")?;
        self.engine.command("reset")?;
        self.engine.clear_log();

        let loaded = self.engine.load_circuit(&snapshot.circuit);
        let stdout = self.engine.log(LogStream::Stdout);
        let stderr = self.engine.log(LogStream::Stderr);

        let rejected = match &loaded {
            Err(err) => {
                warn!("engine rejected the netlist: {}", err);
                true
            }
            Ok(()) => self.config.heuristics.load_failed(&stdout, &stderr),
        };
        if rejected {
            return Err(SessionError::NetlistLoad {
                log: format!("{}{}", stdout, stderr),
                circuit: snapshot.circuit.clone(),
            });
        }
        Ok(())
    }

    /// Dims every part of both views that takes no part in the simulation.
    fn dim_non_simulated(
        &mut self,
        snapshot: &NetlistSnapshot,
        index: &SessionIndex,
    ) -> (Vec<InstanceId>, Vec<DiagnosticVerdict>) {
        let view = self.config.netlist_view;
        let simulated: HashSet<InstanceId> = snapshot.instances.iter().map(|i| i.id).collect();

        let own = self.builder.scene_items(view);
        let other = self.builder.scene_items(view.other());
        let candidates = own
            .iter()
            .filter(|item| !simulated.contains(&item.id))
            .chain(other.iter().filter(|item| index.origin(item.id).is_none()));

        let mut dimmed = Vec::new();
        let mut verdicts = Vec::new();
        for item in candidates.filter(|item: &&SceneItem| !item.kind.is_structural()) {
            self.surface.set_dimmed(item.id, true);
            dimmed.push(item.id);
            verdicts.push(DiagnosticVerdict::not_simulated(item.id, &item.title));
        }
        debug!("{} parts are not simulated", dimmed.len());
        (dimmed, verdicts)
    }
}

/// Runs the rules over every simulated instance and applies the verdicts.
fn diagnose_all<E: Engine, P: Presentation>(
    engine: &E,
    surface: &mut P,
    rules: &RuleSet,
    index: &SessionIndex,
    instances: &[ComponentInstance],
) -> (Vec<DiagnosticVerdict>, Vec<Skipped>) {
    let probe = Probe::new(engine, index);
    let mut verdicts = Vec::with_capacity(instances.len());
    let mut skipped = Vec::new();

    for part in instances {
        surface.clear_overlays(part.id);
        let Some(counterpart) = index.counterpart(part.id) else {
            warn!("skipping '{}': no counterpart in the other view", part.title);
            skipped.push(Skipped {
                instance: part.id,
                title: part.title.clone(),
                reason: SkipReason::NoCounterpart,
            });
            continue;
        };
        surface.clear_overlays(counterpart);

        let Some(kind) = index.kind(part.id) else {
            debug!("'{}' ({}) has no diagnostic rule", part.title, part.family);
            verdicts.push(DiagnosticVerdict::undiagnosed(part));
            continue;
        };

        match rules.diagnose(part, kind, &probe) {
            Ok(verdict) => {
                apply_verdict(surface, part.id, counterpart, &verdict);
                verdicts.push(verdict);
            }
            Err(err) => {
                warn!("skipping '{}': {}", part.title, err);
                skipped.push(Skipped {
                    instance: part.id,
                    title: part.title.clone(),
                    reason: SkipReason::Query(err),
                });
            }
        }
    }
    (verdicts, skipped)
}

/// Overlays go to both views, brightness to the counterpart.
fn apply_verdict<P: Presentation>(
    surface: &mut P,
    instance: InstanceId,
    counterpart: InstanceId,
    verdict: &DiagnosticVerdict,
) {
    for overlay in &verdict.overlays {
        surface.add_overlay(instance, overlay);
        surface.add_overlay(counterpart, overlay);
    }
    if let Some(brightness) = verdict.brightness {
        surface.set_brightness(counterpart, brightness.max(0.0));
    }
}
