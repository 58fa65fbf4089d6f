//! Conversation scenarios implementation
//!
//! A scenario is a named, multi-step conversation. Its trigger phrases start
//! it from the first step; every later user input resumes it at the step the
//! previous input pointed to. Each step handler decides the next step name
//! itself, the step list only fixes the entry step.

use std::fmt;
use std::sync::Arc;
use futures::future::BoxFuture;

use crate::dispatch::UpdateContext;
use crate::handlers::{HandlerResult, StepHandler};
use crate::utils::logging::log_step_transition;
use super::context::{ConversationState, ScratchData};

/// What a step handler wants to happen after it ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Wait for the next input on the named step
    Continue(String),
    /// End the scenario and clear the conversation state
    Terminate,
}

impl StepOutcome {
    pub fn next(step: impl Into<String>) -> Self {
        StepOutcome::Continue(step.into())
    }

    pub fn finish() -> Self {
        StepOutcome::Terminate
    }
}

/// Represents a step within a scenario
#[derive(Clone)]
pub struct ScenarioStep {
    name: String,
    handler: StepHandler,
}

impl ScenarioStep {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ScenarioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Represents a conversation scenario
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    triggers: Vec<String>,
    steps: Vec<ScenarioStep>,
}

/// What happened when a scenario was driven by one update
#[derive(Debug)]
pub enum StepReport {
    /// The step ran and the scenario now waits on the named step
    Continued(String),
    /// The step ran and ended the scenario
    Terminated,
    /// No step matched the state; nothing ran and the state is untouched
    NoStep,
    /// The step handler failed; the state keeps its previous step
    Failed(anyhow::Error),
}

impl Scenario {
    /// Start building new scenario with name
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    /// Scenario without steps; driving it is always a no-op
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triggers: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    /// Whether `text` exactly matches one of the trigger phrases
    pub fn is_triggered_by(&self, text: &str) -> bool {
        self.triggers.iter().any(|trigger| trigger == text)
    }

    /// First step with the given name
    pub fn step(&self, name: &str) -> Option<&ScenarioStep> {
        self.steps.iter().find(|step| step.name == name)
    }

    pub fn entry_step(&self) -> Option<&ScenarioStep> {
        self.steps.first()
    }

    /// Run exactly one step of this scenario against `state`
    ///
    /// With no current step the entry step runs on freshly reset data.
    /// Otherwise the step named by the state runs; an unknown name runs
    /// nothing and leaves the state as it was.
    pub async fn execute(&self, ctx: &UpdateContext, state: &mut ConversationState) -> StepReport {
        let step = match state.step.as_deref() {
            None => match self.entry_step() {
                Some(step) => {
                    state.data = ScratchData::new();
                    step
                }
                None => return StepReport::NoStep,
            },
            Some(name) => match self.step(name) {
                Some(step) => step,
                None => return StepReport::NoStep,
            },
        };

        let outcome = match (step.handler)(ctx, &mut state.data).await {
            Ok(outcome) => outcome,
            Err(e) => return StepReport::Failed(e),
        };

        match outcome {
            StepOutcome::Continue(next) if !next.is_empty() => {
                log_step_transition(&self.name, state.step.as_deref(), Some(&next));
                state.advance(&next);
                StepReport::Continued(next)
            }
            _ => {
                log_step_transition(&self.name, state.step.as_deref(), None);
                state.finish();
                StepReport::Terminated
            }
        }
    }
}

/// Used to conveniently build new scenarios
pub struct ScenarioBuilder {
    scenario: Scenario,
}

impl ScenarioBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scenario: Scenario::empty(name),
        }
    }

    /// Sets the commands or phrases that start the scenario, replacing earlier ones
    pub fn triggered_by<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenario.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a step; the first step added is the entry step
    pub fn add_step<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: for<'a> Fn(&'a UpdateContext, &'a mut ScratchData) -> BoxFuture<'a, HandlerResult<StepOutcome>>
            + Send
            + Sync
            + 'static,
    {
        self.scenario.steps.push(ScenarioStep {
            name: name.into(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Returns the constructed scenario
    pub fn build(self) -> Scenario {
        self.scenario
    }
}

/// Registry of scenarios in registration order
///
/// Lookups by name and by trigger return the first match, so names are
/// expected to be unique.
#[derive(Debug, Clone, Default)]
pub struct ScenarioManager {
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new scenario
    pub fn register_scenario(&mut self, scenario: Scenario) {
        self.scenarios.push(Arc::new(scenario));
    }

    /// Get a scenario by name
    pub fn get_scenario(&self, name: &str) -> Option<&Arc<Scenario>> {
        self.scenarios.iter().find(|scenario| scenario.name() == name)
    }

    /// First scenario one of whose triggers equals `text`
    pub fn find_by_trigger(&self, text: &str) -> Option<&Arc<Scenario>> {
        self.scenarios.iter().find(|scenario| scenario.is_triggered_by(text))
    }

    /// Get all registered scenarios
    pub fn get_all_scenarios(&self) -> &[Arc<Scenario>] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
