use crate::context::ExprId;
use crate::effects::{DurativeCondition, Effect, TimedEffect};
use crate::{IntValue, Object, Param, Sym};

/// How an action's executing agent is determined.
///
/// `Fixed` actions are already bound to a specific agent object (typically
/// produced by grounding a parameterized action once per agent during
/// single-agent projection or robustness-verification compilation).
/// `Parameter` actions determine their agent from one of their own
/// parameters, by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentBinding {
    Fixed(Object),
    Parameter(usize),
}

/// Closed bounds on a durative action's duration. `lower == upper` encodes a
/// fixed duration.
#[derive(Clone, Copy, Debug)]
pub struct DurationBound {
    pub lower: IntValue,
    pub upper: IntValue,
}

impl DurationBound {
    pub fn fixed(value: IntValue) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InstantaneousAction {
    pub name: Sym,
    pub parameters: Vec<Param>,
    pub agent: AgentBinding,
    /// Conditions that must hold in the state the action is applied to.
    pub preconditions: Vec<ExprId>,
    /// Additional conditions that, when violated, make the action eligible
    /// to wait rather than fail outright during robustness verification.
    pub waitfor: Vec<ExprId>,
    pub effects: Vec<Effect>,
}

impl InstantaneousAction {
    pub fn new(name: impl Into<Sym>, parameters: Vec<Param>, agent: AgentBinding) -> Self {
        Self {
            name: name.into(),
            parameters,
            agent,
            preconditions: Vec::new(),
            waitfor: Vec::new(),
            effects: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DurativeAction {
    pub name: Sym,
    pub parameters: Vec<Param>,
    pub agent: AgentBinding,
    pub duration: DurationBound,
    pub conditions: Vec<DurativeCondition>,
    pub waitfor: Vec<DurativeCondition>,
    pub effects: Vec<TimedEffect>,
}

impl DurativeAction {
    pub fn new(name: impl Into<Sym>, parameters: Vec<Param>, agent: AgentBinding, duration: DurationBound) -> Self {
        Self {
            name: name.into(),
            parameters,
            agent,
            duration,
            conditions: Vec::new(),
            waitfor: Vec::new(),
            effects: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Action {
    Instantaneous(InstantaneousAction),
    Durative(DurativeAction),
}

impl Action {
    pub fn name(&self) -> &Sym {
        match self {
            Action::Instantaneous(a) => &a.name,
            Action::Durative(a) => &a.name,
        }
    }

    pub fn parameters(&self) -> &[Param] {
        match self {
            Action::Instantaneous(a) => &a.parameters,
            Action::Durative(a) => &a.parameters,
        }
    }

    pub fn agent(&self) -> &AgentBinding {
        match self {
            Action::Instantaneous(a) => &a.agent,
            Action::Durative(a) => &a.agent,
        }
    }

    pub fn is_durative(&self) -> bool {
        matches!(self, Action::Durative(_))
    }

    pub fn as_instantaneous(&self) -> Option<&InstantaneousAction> {
        match self {
            Action::Instantaneous(a) => Some(a),
            Action::Durative(_) => None,
        }
    }

    pub fn as_durative(&self) -> Option<&DurativeAction> {
        match self {
            Action::Durative(a) => Some(a),
            Action::Instantaneous(_) => None,
        }
    }
}

/// Insertion-ordered registry of the actions declared by a problem.
#[derive(Clone, Default, Debug)]
pub struct Actions {
    by_name: hashbrown::HashMap<Sym, usize>,
    actions: Vec<Action>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, action: Action) -> Result<(), crate::errors::ProblemDefinitionError> {
        let name = action.name().clone();
        if self.by_name.contains_key(&name) {
            return Err(crate::errors::ProblemDefinitionError::DuplicateAction(name));
        }
        self.by_name.insert(name, self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, name: &Sym) -> Option<&Action> {
        self.by_name.get(name).map(|&i| &self.actions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> + '_ {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_action_name_rejected() {
        let mut actions = Actions::new();
        actions
            .add(Action::Instantaneous(InstantaneousAction::new(
                "move",
                vec![],
                AgentBinding::Parameter(0),
            )))
            .unwrap();
        let dup = actions.add(Action::Instantaneous(InstantaneousAction::new(
            "move",
            vec![],
            AgentBinding::Parameter(0),
        )));
        assert!(dup.is_err());
    }

    #[test]
    fn lookup_by_name() {
        let mut actions = Actions::new();
        actions
            .add(Action::Instantaneous(InstantaneousAction::new(
                "move",
                vec![],
                AgentBinding::Parameter(0),
            )))
            .unwrap();
        assert!(actions.get(&"move".into()).is_some());
        assert!(actions.get(&"missing".into()).is_none());
    }
}
