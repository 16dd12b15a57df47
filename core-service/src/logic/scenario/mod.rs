//! Scenario Orchestrator - dependent probe sequences under a generation token
//!
//! Every run captures the generation it was started with. Starting another
//! run or calling `reset()` bumps the generation, and from then on every
//! continuation of the older run finds a mismatch and stops without touching
//! the sink. In-flight requests are never cancelled; their responses are
//! simply dropped.
//!
//! ```text
//!   Idle ──start_run──► Running(0) ──► Running(i+1) ──► Completed
//!                           │
//!                           └── generation mismatch ──► Aborted
//! ```

pub mod presets;


use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::logic::config::MonitorConfig;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::probe::{ProbeInput, ProbeResult};
use crate::logic::remote::ProbeClient;

/// Locations picked by `ProbeMutation::RandomLocation`
pub const PROBE_LOCATIONS: [&str; 7] = ["Lagos", "New York", "London", "Tokyo", "Mumbai", "Moscow", "Dubai"];

/// Fallback base amount for `ScaleAmount` when the field is blank or zero
pub const DEFAULT_BASE_AMOUNT: f64 = 1000.0;

// ============================================================================
// STEPS
// ============================================================================

/// Edit applied to the shared probe input before a step's probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProbeMutation {
    SetAmount(f64),
    /// Multiply the current amount; a blank or zero amount starts from `default`
    ScaleAmount { factor: f64, default: f64 },
    SetLocation(String),
    RandomLocation,
    SetOwner(String),
    SetItemId(String),
    /// `DEV-nnnn` item id, as if the request came from a new device
    RandomDeviceId,
    /// Fresh `TXN-nnnnnn-LIVE` item id so repeated scans are never duplicates
    RandomLiveId,
    SetTimestamp(String),
}

impl ProbeMutation {
    pub fn apply<R: Rng + ?Sized>(&self, input: &mut ProbeInput, rng: &mut R) {
        match self {
            ProbeMutation::SetAmount(amount) => input.amount = Some(*amount),
            ProbeMutation::ScaleAmount { factor, default } => {
                let base = match input.amount {
                    Some(a) if a.is_finite() && a != 0.0 => a,
                    _ => *default,
                };
                input.amount = Some(base * factor);
            }
            ProbeMutation::SetLocation(location) => input.location = location.clone(),
            ProbeMutation::RandomLocation => {
                let idx = rng.gen_range(0..PROBE_LOCATIONS.len());
                input.location = PROBE_LOCATIONS[idx].to_string();
            }
            ProbeMutation::SetOwner(owner) => input.owner_key = owner.clone(),
            ProbeMutation::SetItemId(id) => input.item_id = id.clone(),
            ProbeMutation::RandomDeviceId => {
                input.item_id = format!("DEV-{}", rng.gen_range(1000..10000));
            }
            ProbeMutation::RandomLiveId => {
                input.item_id = format!("TXN-{}-LIVE", rng.gen_range(100_000..1_000_000));
            }
            ProbeMutation::SetTimestamp(ts) => input.timestamp = ts.clone(),
        }
    }
}

/// One step: mutate the input, optionally probe, optionally pause
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSpec {
    pub label: String,
    pub mutations: Vec<ProbeMutation>,
    pub probe: bool,
    /// Pause before the next step (ignored on the last step)
    pub delay_after: Option<Duration>,
}

impl StepSpec {
    /// Input edits only
    pub fn mutate(label: impl Into<String>, mutations: Vec<ProbeMutation>) -> Self {
        Self { label: label.into(), mutations, probe: false, delay_after: None }
    }

    /// Edits followed by one probe of the resulting input
    pub fn probe(label: impl Into<String>, mutations: Vec<ProbeMutation>) -> Self {
        Self { label: label.into(), mutations, probe: true, delay_after: None }
    }

    pub fn then_wait(mut self, delay: Duration) -> Self {
        self.delay_after = Some(delay);
        self
    }
}

// ============================================================================
// RUN STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunState {
    #[default]
    Idle,
    Running(usize),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Completed,
    /// Superseded by a newer run or a reset. Not an error.
    Aborted { at_step: usize },
}

/// A started run. Holds an immutable copy of its generation.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRun {
    pub generation: u64,
    pub run_id: Uuid,
    pub name: String,
    pub steps: Vec<StepSpec>,
}

/// All mutable orchestration state, owned by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct OrchestratorState {
    pub generation: u64,
    pub input: ProbeInput,
    pub run_state: RunState,
    pub current_run: Option<Uuid>,
    pub last_result: Option<ProbeResult>,
}

// ============================================================================
// SINK
// ============================================================================

/// Run-scoped result display
pub trait ScenarioSink {
    fn render_step(&mut self, label: &str, input: &ProbeInput, result: &ProbeResult);

    /// Flagged probe result
    fn alert(&mut self, _label: &str, _result: &ProbeResult) {}

    /// Probe failed; the run moves on to the next step
    fn probe_failed(&mut self, _label: &str, _error: &MonitorError) {}

    /// Probe input edited by a step
    fn input_changed(&mut self, _input: &ProbeInput) {}

    /// Drop everything the sink shows for the current run
    fn clear(&mut self) {}
}

/// Scenario sink that reports through the log facade
#[derive(Debug, Default)]
pub struct LogScenarioSink;

impl ScenarioSink for LogScenarioSink {
    fn render_step(&mut self, label: &str, input: &ProbeInput, result: &ProbeResult) {
        log::info!(
            "[{}] {} | {} @ {} ({}) -> {} score {:.1}%",
            label,
            input.item_id,
            input.amount.unwrap_or_default(),
            input.location,
            input.owner_key,
            result.verdict(),
            result.score * 100.0
        );
        if let Some(text) = &result.explanation.text {
            log::info!("[{}]   {}", label, text);
        }
    }

    fn alert(&mut self, label: &str, result: &ProbeResult) {
        log::warn!("[{}] probe flagged (score {:.3})", label, result.score);
    }

    fn probe_failed(&mut self, label: &str, error: &MonitorError) {
        log::error!("[{}] probe failed: {}", label, error);
    }

    fn input_changed(&mut self, input: &ProbeInput) {
        log::debug!("Probe input: {:?}", input);
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct ScenarioOrchestrator<P: ProbeClient, S: ScenarioSink> {
    state: Mutex<OrchestratorState>,
    sink: Mutex<S>,
    rng: Mutex<StdRng>,
    probe: P,
    step_delay: Duration,
}

impl<P: ProbeClient, S: ScenarioSink> ScenarioOrchestrator<P, S> {
    pub fn new(probe: P, sink: S, config: &MonitorConfig) -> Self {
        Self {
            state: Mutex::new(OrchestratorState::default()),
            sink: Mutex::new(sink),
            rng: Mutex::new(StdRng::from_entropy()),
            probe,
            step_delay: config.step_delay(),
        }
    }

    /// Fix the random choices of `RandomLocation` / `RandomDeviceId`
    pub fn with_rng_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Pause used by presets between steps
    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Supersede whatever is running and hand out a new run
    pub fn start_run(&self, name: impl Into<String>, steps: Vec<StepSpec>) -> ScenarioRun {
        let mut state = self.state.lock();
        state.generation += 1;

        let run = ScenarioRun {
            generation: state.generation,
            run_id: Uuid::new_v4(),
            name: name.into(),
            steps,
        };
        state.current_run = Some(run.run_id);
        state.run_state = RunState::Running(0);

        log::info!("Scenario '{}' started (generation {}, {} steps)", run.name, run.generation, run.steps.len());
        run
    }

    /// Execute a started run step by step
    pub async fn drive(&self, run: &ScenarioRun) -> RunOutcome {
        let last = run.steps.len().saturating_sub(1);

        for (i, step) in run.steps.iter().enumerate() {
            let input = {
                let mut state = self.state.lock();
                if state.generation != run.generation {
                    return Self::abandon(run, i, "before step");
                }
                state.run_state = RunState::Running(i);

                let mut rng = self.rng.lock();
                for mutation in &step.mutations {
                    mutation.apply(&mut state.input, &mut *rng);
                }
                state.input.clone()
            };

            if !step.mutations.is_empty() {
                self.sink.lock().input_changed(&input);
            }

            if step.probe {
                let response = self.probe.analyze_single_item(&input).await;

                if !self.is_current(run.generation) {
                    return Self::abandon(run, i, "after probe response");
                }

                match response {
                    Ok(result) => {
                        let mut sink = self.sink.lock();
                        sink.render_step(&step.label, &input, &result);
                        if result.is_flagged {
                            sink.alert(&step.label, &result);
                        }
                        drop(sink);
                        self.state.lock().last_result = Some(result);
                    }
                    Err(e) => {
                        log::warn!("Scenario '{}' step '{}' probe failed: {}", run.name, step.label, e);
                        self.sink.lock().probe_failed(&step.label, &e);
                    }
                }
            }

            if let (Some(delay), true) = (step.delay_after, i < last) {
                tokio::time::sleep(delay).await;
                if !self.is_current(run.generation) {
                    return Self::abandon(run, i, "after delay");
                }
            }
        }

        let mut state = self.state.lock();
        if state.generation != run.generation {
            return Self::abandon(run, run.steps.len(), "at completion");
        }
        state.run_state = RunState::Completed;
        log::info!("Scenario '{}' completed", run.name);
        RunOutcome::Completed
    }

    /// `start_run` + `drive`
    pub async fn run(&self, name: impl Into<String>, steps: Vec<StepSpec>) -> RunOutcome {
        let run = self.start_run(name, steps);
        self.drive(&run).await
    }

    /// Invalidate every outstanding run, clear the input and the run display,
    /// then tell the remote side (best effort).
    pub async fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.generation += 1;
            state.input.clear();
            state.last_result = None;
            state.current_run = None;
            state.run_state = RunState::Idle;
            log::info!("Scenario state reset (generation {})", state.generation);
        }
        self.sink.lock().clear();

        if let Err(e) = self.probe.reset_remote_context().await {
            log::warn!("Remote context reset failed: {}", e);
        }
    }

    /// Manual judge action: one probe of the current input, outside any run.
    ///
    /// The caller always gets the response. It is only kept as `last_result`
    /// (and the item id rotated) if no reset happened while it was in flight.
    pub async fn judge(&self) -> MonitorResult<ProbeResult> {
        let (generation, input) = {
            let state = self.state.lock();
            (state.generation, state.input.clone())
        };

        let result = self.probe.analyze_single_item(&input).await?;

        let mut state = self.state.lock();
        if state.generation == generation {
            state.last_result = Some(result.clone());
            let mut rng = self.rng.lock();
            ProbeMutation::RandomLiveId.apply(&mut state.input, &mut *rng);
        } else {
            log::debug!("Judge response arrived after reset; not stored");
        }
        Ok(result)
    }

    pub fn set_input(&self, input: ProbeInput) {
        self.state.lock().input = input;
    }

    pub fn input(&self) -> ProbeInput {
        self.state.lock().input.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn run_state(&self) -> RunState {
        self.state.lock().run_state
    }

    pub fn last_result(&self) -> Option<ProbeResult> {
        self.state.lock().last_result.clone()
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Read the sink under its lock
    pub fn with_sink<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let sink = self.sink.lock();
        f(&*sink)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    /// Stale continuation. Shared state belongs to the newer generation, so
    /// nothing here is written back.
    fn abandon(run: &ScenarioRun, at_step: usize, point: &str) -> RunOutcome {
        log::debug!(
            "Scenario '{}' (generation {}) superseded {} at step {}",
            run.name, run.generation, point, at_step
        );
        RunOutcome::Aborted { at_step }
    }
}
