//! The agent loop
//!
//! Each iteration: replenish the reaction queue if a configured task
//! needs it, draw one task by weighted random selection, gate on the
//! task's cooldown, dispatch its action through the connection
//! registry, update state on success, then sleep. Iterations that
//! perform an action sleep the profile's `loop_delay`; iterations that
//! skip or fail sleep the longer fallback delay. Failures never stop
//! the loop; only explicit cancellation does.

use crate::connections::ConnectionRegistry;
use crate::state::AgentState;
use drover_common::config::{AgentProfile, ReplenishConfig, TaskConfig};
use drover_common::constants::{
    DEFAULT_ID_FIELD, FALLBACK_DELAY_SECS, STARTUP_COUNTDOWN_SECS,
};
use drover_common::DroverError;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why an iteration performed no action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The selected task's minimum inter-execution interval has not
    /// elapsed yet
    Cooldown { task: String },
    /// The selected task consumes queued items and none were available
    NoData { task: String },
    /// The selected task's connection has no valid credentials; it will
    /// keep being skipped until corrected externally
    NotConfigured { task: String },
    /// Every task has weight zero, so nothing can ever be selected
    Stalled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Cooldown { task } => write!(f, "task '{}' still cooling down", task),
            SkipReason::NoData { task } => write!(f, "no queued data for task '{}'", task),
            SkipReason::NotConfigured { task } => {
                write!(f, "connection for task '{}' not configured", task)
            }
            SkipReason::Stalled => write!(f, "all task weights are zero"),
        }
    }
}

/// Tagged result of one loop iteration. Skips and failures are
/// distinct control outcomes, not an overloaded error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The task's action ran and produced its side effect
    Performed { task: String },
    /// Nothing ran this round, for a stated reason
    Skipped(SkipReason),
    /// Dispatch was attempted and the provider call failed; retried on
    /// a later iteration, never within the same one
    Failed { task: String, error: String },
}

impl IterationOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, IterationOutcome::Performed { .. })
    }
}

/// Timing knobs for the loop, split from the profile so tests can run
/// with millisecond delays
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Sleep after an iteration that performed an action
    pub loop_delay: Duration,
    /// Longer sleep after a no-op or failed iteration
    pub fallback_delay: Duration,
    /// Cancellable countdown before the first autonomous action
    pub startup_countdown: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            loop_delay: Duration::from_secs(drover_common::DEFAULT_LOOP_DELAY_SECS),
            fallback_delay: Duration::from_secs(FALLBACK_DELAY_SECS),
            startup_countdown: Duration::from_secs(STARTUP_COUNTDOWN_SECS),
        }
    }
}

impl LoopConfig {
    /// Derive timing from the profile. The fallback delay is the fixed
    /// floor or twice the profile's loop delay, whichever is larger, so
    /// a no-op iteration always sleeps longer than a successful one.
    pub fn from_profile(profile: &AgentProfile) -> Self {
        LoopConfig {
            loop_delay: Duration::from_secs(profile.loop_delay),
            fallback_delay: Duration::from_secs(
                FALLBACK_DELAY_SECS.max(profile.loop_delay.saturating_mul(2)),
            ),
            ..Default::default()
        }
    }
}

type Observer = Box<dyn FnMut(&IterationOutcome) + Send + Sync>;

/// The scheduling loop: owns the agent state, borrows nothing mutable
/// from outside, and drives all dispatch through the shared registry
pub struct AgentLoop {
    agent_name: String,
    tasks: Vec<TaskConfig>,
    replenish: Option<ReplenishConfig>,
    registry: Arc<ConnectionRegistry>,
    config: LoopConfig,
    state: AgentState,
    rng: StdRng,
    iterations: u64,
    observer: Option<Observer>,
}

impl AgentLoop {
    pub fn new(profile: &AgentProfile, registry: Arc<ConnectionRegistry>) -> Self {
        AgentLoop {
            agent_name: profile.name.clone(),
            tasks: profile.tasks.clone(),
            replenish: profile.replenish.clone(),
            registry,
            config: LoopConfig::from_profile(profile),
            state: AgentState::new(),
            rng: StdRng::from_entropy(),
            iterations: 0,
            observer: None,
        }
    }

    /// Override the timing knobs (tests use millisecond delays)
    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Deterministic task selection for tests
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register a per-iteration outcome hook (telemetry, tests)
    pub fn on_outcome(
        mut self,
        observer: impl FnMut(&IterationOutcome) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Completed iterations so far
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Run until `token` is cancelled. Cancellation is observed during
    /// the startup countdown, at iteration boundaries, and during the
    /// inter-iteration sleep; already-sent provider actions are never
    /// rolled back.
    pub async fn run(mut self, token: CancellationToken) {
        info!(agent = %self.agent_name, "starting agent loop");
        if !self.countdown(&token).await {
            info!("agent loop cancelled before first iteration");
            return;
        }

        loop {
            if token.is_cancelled() {
                break;
            }
            let outcome = self.iterate().await;
            self.observe(&outcome);

            let delay = self.delay_for(&outcome);
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!(
            agent = %self.agent_name,
            iterations = self.iterations,
            "agent loop stopped"
        );
    }

    /// Operator abort window before autonomous behavior begins
    async fn countdown(&self, token: &CancellationToken) -> bool {
        let mut remaining = self.config.startup_countdown;
        let step = Duration::from_secs(1);
        while !remaining.is_zero() {
            info!("first action in {:?} (cancel to abort)", remaining);
            let sleep_for = remaining.min(step);
            tokio::select! {
                _ = token.cancelled() => return false,
                _ = tokio::time::sleep(sleep_for) => {}
            }
            remaining -= sleep_for;
        }
        true
    }

    /// One full pass of the per-iteration algorithm. Never propagates
    /// an error: every failure is folded into the returned outcome so
    /// the loop always reaches its next iteration.
    pub async fn iterate(&mut self) -> IterationOutcome {
        self.iterations += 1;

        // 1. Replenish the reaction queue when a live task depends on
        //    it and it ran dry. A failed replenish is "nothing to do
        //    this round", not an aborted iteration.
        self.replenish_if_needed().await;

        // 2. Weighted random selection; repeats across iterations are
        //    expected and correct.
        let Some(index) = self.select_index() else {
            return IterationOutcome::Skipped(SkipReason::Stalled);
        };
        let task = self.tasks[index].clone();
        debug!(task = %task.name, "selected task");

        // 3. Cooldown gate
        if let Some(secs) = task.cooldown_secs {
            if let Some(remaining) =
                self.state.cooldown_remaining(&task.name, Duration::from_secs(secs))
            {
                debug!(task = %task.name, ?remaining, "cooldown not elapsed");
                return IterationOutcome::Skipped(SkipReason::Cooldown { task: task.name });
            }
        }

        // 4. Assemble arguments, consuming one queued item if the task
        //    reacts to incoming data
        let mut args = task.args.clone();
        let mut consumed_id = None;
        if task.uses_queue {
            let Some(item) = self.state.pop_queue() else {
                return IterationOutcome::Skipped(SkipReason::NoData { task: task.name });
            };
            consumed_id = self.item_id(&item);
            merge_item_args(&mut args, item);
        }

        // 5. Dispatch and record. Provider actions may be
        //    non-idempotent, so a failure is surfaced and left for a
        //    later natural iteration rather than retried here.
        match self
            .registry
            .perform(&task.connection, &task.action, &args)
            .await
        {
            Ok(_) => {
                self.state.record_action(&task.name);
                if let Some(id) = consumed_id {
                    self.state.mark_handled(&id);
                }
                IterationOutcome::Performed { task: task.name }
            }
            Err(DroverError::NotConfigured(_)) => {
                IterationOutcome::Skipped(SkipReason::NotConfigured { task: task.name })
            }
            Err(e) => {
                warn!(task = %task.name, error = %e, "task execution failed");
                IterationOutcome::Failed {
                    task: task.name,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn replenish_if_needed(&mut self) {
        let Some(replenish) = self.replenish.clone() else {
            return;
        };
        let queue_wanted = self.tasks.iter().any(|t| t.uses_queue && t.weight > 0.0);
        if !queue_wanted || !self.state.queue_is_empty() {
            return;
        }

        match self
            .registry
            .perform(&replenish.connection, &replenish.action, &replenish.args)
            .await
        {
            Ok(Value::Array(items)) => {
                let fresh: Vec<Value> = items
                    .into_iter()
                    .filter(|item| match self.item_id(item) {
                        Some(id) => !self.state.is_handled(&id),
                        None => true,
                    })
                    .collect();
                debug!(count = fresh.len(), "replenished reaction queue");
                self.state.refill_queue(fresh);
            }
            Ok(_) => warn!(
                action = %replenish.action,
                "replenish action returned a non-array result; queue left empty"
            ),
            Err(e) => warn!(error = %e, "replenish failed; nothing to do this round"),
        }
    }

    /// Weighted draw over the task list; `None` when all weights are
    /// zero (a stall, not a crash)
    fn select_index(&mut self) -> Option<usize> {
        let weights: Vec<f64> = self.tasks.iter().map(|t| t.weight.max(0.0)).collect();
        if weights.iter().sum::<f64>() <= 0.0 {
            return None;
        }
        let dist = WeightedIndex::new(&weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    /// Two-tier delay policy: normal delay after a performed action,
    /// the longer fallback after a skip or failure
    fn delay_for(&self, outcome: &IterationOutcome) -> Duration {
        if outcome.performed() {
            self.config.loop_delay
        } else {
            self.config.fallback_delay
        }
    }

    fn item_id(&self, item: &Value) -> Option<String> {
        let field = self
            .replenish
            .as_ref()
            .map(|r| r.id_field.as_str())
            .unwrap_or(DEFAULT_ID_FIELD);
        match &item[field] {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn observe(&mut self, outcome: &IterationOutcome) {
        match outcome {
            IterationOutcome::Performed { task } => {
                info!(iteration = self.iterations, task = %task, "action performed");
            }
            IterationOutcome::Skipped(reason) => {
                info!(iteration = self.iterations, reason = %reason, "iteration skipped");
            }
            IterationOutcome::Failed { task, error } => {
                warn!(iteration = self.iterations, task = %task, error = %error, "iteration failed");
            }
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(outcome);
        }
    }
}

/// Fold a consumed queue item into the action arguments. Object fields
/// become arguments unless the task already pins them statically; other
/// item shapes are passed whole under "item".
fn merge_item_args(args: &mut Map<String, Value>, item: Value) {
    match item {
        Value::Object(fields) => {
            for (key, value) in fields {
                args.entry(key).or_insert(value);
            }
        }
        other => {
            args.entry("item".to_string()).or_insert(other);
        }
    }
}
