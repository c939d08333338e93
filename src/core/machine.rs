//! Declarative transition graph: states, events, guarded transitions,
//! entry/exit actions, and branch constructs.
//!
//! Guards are pure predicates over the record; actions may mutate only the
//! record passed to them. Both are named strategy objects so transition
//! failures can say which guard or action was involved.
//!
//! `fire` runs exit action, state change, entry action, in that order, and
//! does NOT roll back: if the entry action fails after the state change, the
//! machine stays in the target state and the error is returned. Callers must
//! treat that as a degraded state requiring inspection.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::core::error::HelmsmanError;
use crate::core::record::ProjectRecord;

/// Opaque state name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State(pub String);

impl State {
    pub fn new(name: &str) -> Self {
        State(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event(pub String);

impl Event {
    pub fn new(name: &str) -> Self {
        Event(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure predicate over project data gating whether a transition may fire.
pub trait Guard: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, record: &ProjectRecord) -> bool;
}

/// Entry/exit action. May mutate only the record it is handed.
pub trait Action: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, record: &mut ProjectRecord) -> Result<(), HelmsmanError>;
}

struct FnGuard<F> {
    name: String,
    f: F,
}

impl<F> Guard for FnGuard<F>
where
    F: Fn(&ProjectRecord) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, record: &ProjectRecord) -> bool {
        (self.f)(record)
    }
}

struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> Action for FnAction<F>
where
    F: Fn(&mut ProjectRecord) -> Result<(), HelmsmanError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, record: &mut ProjectRecord) -> Result<(), HelmsmanError> {
        (self.f)(record)
    }
}

/// Wraps a named closure as a guard strategy object.
pub fn guard_fn<F>(name: &str, f: F) -> Arc<dyn Guard>
where
    F: Fn(&ProjectRecord) -> bool + Send + Sync + 'static,
{
    Arc::new(FnGuard {
        name: name.to_string(),
        f,
    })
}

/// Wraps a named closure as an action strategy object.
pub fn action_fn<F>(name: &str, f: F) -> Arc<dyn Action>
where
    F: Fn(&mut ProjectRecord) -> Result<(), HelmsmanError> + Send + Sync + 'static,
{
    Arc::new(FnAction {
        name: name.to_string(),
        f,
    })
}

/// One edge of the transition graph.
#[derive(Clone)]
pub struct Transition {
    pub from: State,
    pub to: State,
    pub event: Event,
    pub guard: Option<Arc<dyn Guard>>,
    pub on_exit: Option<Arc<dyn Action>>,
    pub on_entry: Option<Arc<dyn Action>>,
}

impl Transition {
    pub fn new(from: &str, event: &str, to: &str) -> Self {
        Transition {
            from: State::new(from),
            to: State::new(to),
            event: Event::new(event),
            guard: None,
            on_exit: None,
            on_entry: None,
        }
    }

    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn on_exit(mut self, action: Arc<dyn Action>) -> Self {
        self.on_exit = Some(action);
        self
    }

    pub fn on_entry(mut self, action: Arc<dyn Action>) -> Self {
        self.on_entry = Some(action);
        self
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("event", &self.event)
            .field("guard", &self.guard.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

/// Transition table indexed by `(from, event)`.
#[derive(Debug, Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
    index: HashMap<(State, Event), usize>,
}

impl TransitionTable {
    /// Builds the table, rejecting duplicate `(from, event)` pairs.
    pub fn build(transitions: Vec<Transition>) -> Result<Self, HelmsmanError> {
        let mut index = HashMap::new();
        for (i, t) in transitions.iter().enumerate() {
            let key = (t.from.clone(), t.event.clone());
            if index.insert(key, i).is_some() {
                return Err(HelmsmanError::ValidationError(format!(
                    "duplicate transition from state '{}' on event '{}'",
                    t.from, t.event
                )));
            }
        }
        Ok(TransitionTable { transitions, index })
    }

    pub fn get(&self, from: &State, event: &Event) -> Option<&Transition> {
        self.index
            .get(&(from.clone(), event.clone()))
            .map(|&i| &self.transitions[i])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// All states reachable from `initial` by following transitions,
    /// including `initial` itself.
    pub fn reachable_states(&self, initial: &State) -> HashSet<State> {
        let mut seen: HashSet<State> = HashSet::new();
        let mut frontier = vec![initial.clone()];
        while let Some(state) = frontier.pop() {
            if !seen.insert(state.clone()) {
                continue;
            }
            for t in &self.transitions {
                if t.from == state && !seen.contains(&t.to) {
                    frontier.push(t.to.clone());
                }
            }
        }
        seen
    }
}

/// Named discriminator function for branch constructs.
#[derive(Clone)]
pub struct Discriminator {
    name: String,
    f: Arc<dyn Fn(&ProjectRecord) -> Result<String, HelmsmanError> + Send + Sync>,
}

impl Discriminator {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&ProjectRecord) -> Result<String, HelmsmanError> + Send + Sync + 'static,
    {
        Discriminator {
            name: name.to_string(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, record: &ProjectRecord) -> Result<String, HelmsmanError> {
        (self.f)(record)
    }
}

/// One arm of a branch: the discriminator value that selects it, the event it
/// fires, and the transition shape it expands into.
#[derive(Clone)]
pub struct BranchArm {
    pub value: String,
    pub event: Event,
    pub to: State,
    pub guard: Option<Arc<dyn Guard>>,
    pub on_exit: Option<Arc<dyn Action>>,
    pub on_entry: Option<Arc<dyn Action>>,
}

impl BranchArm {
    pub fn new(value: &str, event: &str, to: &str) -> Self {
        BranchArm {
            value: value.to_string(),
            event: Event::new(event),
            to: State::new(to),
            guard: None,
            on_exit: None,
            on_entry: None,
        }
    }

    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn on_exit(mut self, action: Arc<dyn Action>) -> Self {
        self.on_exit = Some(action);
        self
    }

    pub fn on_entry(mut self, action: Arc<dyn Action>) -> Self {
        self.on_entry = Some(action);
        self
    }
}

/// Declarative multi-way decision from one state. At configuration time it
/// expands into ordinary transitions; at advance time the discriminator's
/// returned value selects which event the automatic determiner proposes.
#[derive(Clone)]
pub struct Branch {
    pub from: State,
    pub discriminator: Discriminator,
    pub arms: Vec<BranchArm>,
}

impl Branch {
    pub fn new(from: &str, discriminator: Discriminator, arms: Vec<BranchArm>) -> Self {
        Branch {
            from: State::new(from),
            discriminator,
            arms,
        }
    }

    /// Expands the branch into ordinary transitions, keeping the table's
    /// shape uniform.
    pub fn expand(&self) -> Vec<Transition> {
        self.arms
            .iter()
            .map(|arm| Transition {
                from: self.from.clone(),
                to: arm.to.clone(),
                event: arm.event.clone(),
                guard: arm.guard.clone(),
                on_exit: arm.on_exit.clone(),
                on_entry: arm.on_entry.clone(),
            })
            .collect()
    }

    /// Proposes the event for the arm matching the discriminator's value.
    /// An unmapped value is an error and mutates nothing.
    pub fn determine(&self, record: &ProjectRecord) -> Result<Event, HelmsmanError> {
        let value = self.discriminator.evaluate(record)?;
        self.arms
            .iter()
            .find(|arm| arm.value == value)
            .map(|arm| arm.event.clone())
            .ok_or_else(|| {
                HelmsmanError::TransitionError(format!(
                    "discriminator '{}' returned unmapped value '{}' in state '{}'",
                    self.discriminator.name(),
                    value,
                    self.from
                ))
            })
    }
}

/// A live machine: the current state plus a shared transition table.
#[derive(Debug, Clone)]
pub struct Machine {
    current: State,
    table: Arc<TransitionTable>,
}

impl Machine {
    pub fn new(current: State, table: Arc<TransitionTable>) -> Self {
        Machine { current, table }
    }

    pub fn state(&self) -> &State {
        &self.current
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// True iff a transition exists from the current state for `event` and
    /// its guard (if any) passes against the record.
    pub fn can_fire(&self, event: &Event, record: &ProjectRecord) -> bool {
        match self.table.get(&self.current, event) {
            None => false,
            Some(t) => t.guard.as_ref().is_none_or(|g| g.check(record)),
        }
    }

    /// Fires `event`: exit action, state change, entry action, in that
    /// order. A guard rejection leaves the state unchanged. An entry-action
    /// failure leaves the machine in the target state (no rollback).
    pub fn fire(&mut self, event: &Event, record: &mut ProjectRecord) -> Result<(), HelmsmanError> {
        let transition = self.table.get(&self.current, event).ok_or_else(|| {
            HelmsmanError::TransitionError(format!(
                "no transition from state '{}' on event '{}'",
                self.current, event
            ))
        })?;
        if let Some(guard) = &transition.guard {
            if !guard.check(record) {
                return Err(HelmsmanError::TransitionError(format!(
                    "cannot fire '{}' from state '{}': guard '{}' rejected",
                    event,
                    self.current,
                    guard.name()
                )));
            }
        }
        let to = transition.to.clone();
        let on_exit = transition.on_exit.clone();
        let on_entry = transition.on_entry.clone();

        if let Some(action) = on_exit {
            action.run(record).map_err(|e| {
                HelmsmanError::TransitionError(format!(
                    "exit action '{}' failed leaving state '{}': {}",
                    action.name(),
                    self.current,
                    e
                ))
            })?;
        }
        self.current = to;
        if let Some(action) = on_entry {
            action.run(record).map_err(|e| {
                HelmsmanError::TransitionError(format!(
                    "entry action '{}' failed entering state '{}': {}",
                    action.name(),
                    self.current,
                    e
                ))
            })?;
        }
        Ok(())
    }
}
