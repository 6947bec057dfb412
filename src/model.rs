use itertools::Itertools;

use crate::context::ExprId;
use crate::errors::CoreError;
use crate::expressions::{self, Expr};
use crate::timing::TimeInterval;
use crate::{Actions, Agents, Context, Fluents, Objects, Types};

/// A statement that must hold over `interval` in every valid plan. Plain
/// end-of-plan goals are `TimedGoal { interval: TimeInterval::at_end(), .. }`
/// by convention; the rest supports goals stated against durative plans.
#[derive(Clone, Debug)]
pub struct TimedGoal {
    pub interval: TimeInterval,
    pub expression: ExprId,
}

impl TimedGoal {
    pub fn at_end(expression: ExprId) -> Self {
        Self {
            interval: TimeInterval::at_end(),
            expression,
        }
    }
}

/// A complete planning problem: the symbols it is built from (`types`,
/// `objects`, `fluents`), the agents that act in it, the actions available,
/// the initial state (given as a set of unconditional effects at the
/// origin), and the goals it must reach.
pub struct Problem {
    pub name: crate::Sym,
    pub context: Context,
    pub actions: Actions,
    pub agents: Agents,
    pub init: Vec<crate::effects::Effect>,
    pub goals: Vec<ExprId>,
    pub timed_goals: Vec<TimedGoal>,
}

impl Problem {
    pub fn new(name: impl Into<crate::Sym>, context: Context) -> Self {
        Self {
            name: name.into(),
            context,
            actions: Actions::new(),
            agents: Agents::new(),
            init: Vec::new(),
            goals: Vec::new(),
            timed_goals: Vec::new(),
        }
    }

    pub fn types(&self) -> &Types {
        &self.context.types
    }
    pub fn objects(&self) -> &Objects {
        &self.context.objects
    }
    pub fn fluents(&self) -> &Fluents {
        &self.context.fluents
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.agents.homogeneous_type()?;
        Ok(())
    }

    /// A bitset-like summary of which features this problem actually uses,
    /// computed by inspecting every condition, effect and goal. Transformers
    /// that only handle a subset of features check this before running.
    pub fn kind(&self) -> ProblemKind {
        let mut kind = ProblemKind::default();
        kind.has_multi_agent = self.agents.len() > 1;

        let mut visited = hashbrown::HashSet::new();
        let mut note_negation = |e: ExprId, ctx: &Context| {
            if matches!(ctx.expr(e), Expr::Not(_)) {
                kind.has_negative_conditions = true;
            }
        };
        for action in self.actions.iter() {
            match action {
                crate::Action::Instantaneous(a) => {
                    if !a.waitfor.is_empty() {
                        kind.has_waitfor = true;
                    }
                    for &c in a.preconditions.iter().chain(a.waitfor.iter()) {
                        expressions::walk(c, &self.context, &mut visited, &mut note_negation);
                    }
                }
                crate::Action::Durative(a) => {
                    kind.has_durative_actions = true;
                    if !a.waitfor.is_empty() {
                        kind.has_waitfor = true;
                    }
                    for c in a.conditions.iter().chain(a.waitfor.iter()) {
                        expressions::walk(c.condition, &self.context, &mut visited, &mut note_negation);
                    }
                }
            }
        }
        for &g in &self.goals {
            expressions::walk(g, &self.context, &mut visited, &mut note_negation);
        }
        for g in &self.timed_goals {
            expressions::walk(g.expression, &self.context, &mut visited, &mut note_negation);
        }
        kind
    }

    /// Every ground fluent application derivable from the declared fluents
    /// and objects: for each fluent, the cartesian product of the objects
    /// compatible with each of its parameter types. Used by the
    /// negative-conditions compilation to declare a shadow fluent for every
    /// possible application, and by grounding-based planners.
    pub fn ground_fluent_applications(&mut self) -> Vec<ExprId> {
        let mut result = Vec::new();
        let fluent_ids: Vec<_> = self.context.fluents.iter().map(|(id, _)| id).collect();
        for id in fluent_ids {
            let fluent = self.context.fluents.get(id).clone();
            if fluent.parameters.is_empty() {
                let app = self
                    .context
                    .intern(Expr::FluentApp(id, Default::default()))
                    .expect("fluent application of a declared fluent is always well-typed");
                result.push(app);
                continue;
            }
            let per_param_objects: Vec<Vec<crate::Object>> = fluent
                .parameters
                .iter()
                .map(|p| self.context.objects.of_type(p.tpe()).cloned().collect())
                .collect();
            for combo in per_param_objects.into_iter().multi_cartesian_product() {
                let args = combo
                    .iter()
                    .map(|o| {
                        self.context
                            .intern(Expr::ObjectRef(o.clone()))
                            .expect("object reference is always well-typed")
                    })
                    .collect();
                let app = self
                    .context
                    .intern(Expr::FluentApp(id, args))
                    .expect("fluent application of a declared fluent is always well-typed");
                result.push(app);
            }
        }
        result
    }
}

/// Summary of the features exercised by a `Problem`, used by transformers to
/// reject inputs outside the subset they support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProblemKind {
    pub has_negative_conditions: bool,
    pub has_durative_actions: bool,
    pub has_multi_agent: bool,
    pub has_waitfor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{fluent_app, not};
    use crate::{Action, AgentBinding, Agent, InstantaneousAction, Object, Type, UserTypes};

    #[test]
    fn kind_detects_negative_conditions() {
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("free", vec![], crate::Type::Bool).unwrap();
        let app = fluent_app(f, Default::default(), &mut ctx).unwrap();
        let negated = not(app, &mut ctx).unwrap();
        let mut problem = Problem::new("p", ctx);
        problem.goals.push(negated);
        assert!(problem.kind().has_negative_conditions);
    }

    #[test]
    fn kind_detects_multi_agent_and_waitfor() {
        let ut = std::sync::Arc::new(UserTypes::new());
        let mut ctx = Context::new();
        let car_t = Type::User("object".into(), ut);
        let f = ctx.fluents.add_fluent("free", vec![], crate::Type::Bool).unwrap();
        let app = fluent_app(f, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("p", ctx);
        problem.agents.add(Agent::Fresh(Object::new("a1", car_t.clone()), Vec::new()));
        problem.agents.add(Agent::Fresh(Object::new("a2", car_t.clone()), Vec::new()));
        let mut action = InstantaneousAction::new("act", vec![], AgentBinding::Parameter(0));
        action.waitfor.push(app);
        problem.actions.add(Action::Instantaneous(action)).unwrap();
        let kind = problem.kind();
        assert!(kind.has_multi_agent);
        assert!(kind.has_waitfor);
    }
}
