use crate::{ExprId, Object, Sym};

/// A participant in a multi-agent problem.
///
/// `Fresh` agents own an object created solely to represent them (the common
/// case: "the agent `car1`, of type `car`"). `Existing` agents instead wrap
/// an object that was already part of the problem for an unrelated reason
/// (e.g. a `location` that is itself capable of acting). The distinction
/// matters to single-agent projection: actions bound to an `Existing` agent
/// are kept in every agent's projection, not just the projected agent's own.
///
/// Each variant also carries the agent's own goals: the propositions that
/// agent is individually responsible for reaching, used both by single-agent
/// projection (which replaces the whole problem's goals with just these) and
/// by the end actions a robustness-verification compilation builds per agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Agent {
    Fresh(Object, Vec<ExprId>),
    Existing(Object, Vec<ExprId>),
}

impl Agent {
    pub fn object(&self) -> &Object {
        match self {
            Agent::Fresh(o, _) | Agent::Existing(o, _) => o,
        }
    }

    pub fn name(&self) -> &Sym {
        self.object().name()
    }

    pub fn goals(&self) -> &[ExprId] {
        match self {
            Agent::Fresh(_, goals) | Agent::Existing(_, goals) => goals,
        }
    }

    pub fn is_existing_object_agent(&self) -> bool {
        matches!(self, Agent::Existing(..))
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for Agents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::utils::disp_iter(f, &self.agents, ", ")
    }
}

/// Insertion-ordered registry of the agents declared by a problem.
#[derive(Clone, Default, Debug)]
pub struct Agents {
    agents: Vec<Agent>,
}

impl Agents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get_by_name(&self, name: &Sym) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    /// The object type shared by every declared agent. Social-law
    /// compilation requires all agents to be instances of a single type;
    /// a problem mixing agent types is rejected when this is checked.
    pub fn homogeneous_type(&self) -> Result<Option<crate::Type>, crate::errors::ProblemDefinitionError> {
        let mut iter = self.agents.iter();
        let Some(first) = iter.next() else {
            return Ok(None);
        };
        for other in iter {
            if !first.object().tpe().overlaps(other.object().tpe()) {
                return Err(crate::errors::ProblemDefinitionError::HeterogeneousAgentTypes(
                    first.name().clone(),
                    other.name().clone(),
                ));
            }
        }
        Ok(Some(first.object().tpe().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::TRUE;
    use crate::{Context, Type, UserTypes};

    fn car(name: &str) -> Object {
        Object::new(name, Type::User("car".into(), std::sync::Arc::new(UserTypes::new())))
    }

    #[test]
    fn fresh_and_existing_share_lookup() {
        let mut agents = Agents::new();
        agents.add(Agent::Fresh(car("car1"), Vec::new()));
        agents.add(Agent::Existing(car("dock1"), Vec::new()));
        assert!(!agents.get_by_name(&"car1".into()).unwrap().is_existing_object_agent());
        assert!(agents.get_by_name(&"dock1".into()).unwrap().is_existing_object_agent());
    }

    #[test]
    fn heterogeneous_types_rejected() {
        let mut agents = Agents::new();
        agents.add(Agent::Fresh(car("car1"), Vec::new()));
        let truck = Object::new(
            "truck1",
            Type::User("truck".into(), std::sync::Arc::new(UserTypes::new())),
        );
        agents.add(Agent::Fresh(truck, Vec::new()));
        assert!(agents.homogeneous_type().is_err());
    }

    #[test]
    fn goals_accessor_returns_agents_own_goals() {
        let mut ctx = Context::new();
        let g = TRUE(&mut ctx);
        let agent = Agent::Fresh(car("car1"), vec![g]);
        assert_eq!(agent.goals(), &[g]);
    }
}
