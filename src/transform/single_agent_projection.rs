//! Projects a multi-agent problem down to the point of view of a single
//! agent: actions belonging to other agents are dropped, except those bound
//! to an agent that wraps an object which already existed in the problem for
//! other reasons (an [`Agent::Existing`](crate::Agent)), which every agent's
//! projection keeps unconditionally — dropping them would make the
//! projected problem unsolvable even when the original multi-agent plan
//! only ever needed the projected agent's own actions.
//!
//! Every kept action additionally gets a precondition on a fresh
//! `active-agent(a)` fluent, true only for the projected agent's own object;
//! `waitfor` conditions are folded into `preconditions` (a lone agent has no
//! one else's action to wait *for*, so a stall here is just a precondition
//! that doesn't hold); and the projected problem's goals become the
//! projected agent's own goals rather than the whole problem's.
//!
//! Durative actions are rejected outright: grounding an agent parameter
//! inside a durative condition/effect is not supported.

use hashbrown::HashMap;

use crate::actions::{AgentBinding, InstantaneousAction};
use crate::effects::Effect;
use crate::errors::{CoreError, UnsupportedFeatureError};
use crate::expressions;
use crate::fluents::FluentId;
use crate::transform::{ActionMap, TransformResult, Transformer};
use crate::{Action, Context, Object, Param, Problem, Sym, Type};

pub struct SingleAgentProjection {
    pub agent: Sym,
}

impl SingleAgentProjection {
    pub fn new(agent: impl Into<Sym>) -> Self {
        Self { agent: agent.into() }
    }
}

impl Transformer for SingleAgentProjection {
    fn name(&self) -> &'static str {
        "single_agent_projection"
    }

    fn transform(&self, problem: &Problem) -> Result<TransformResult, CoreError> {
        tracing::debug!(agent = %self.agent, actions = problem.actions.len(), "single_agent_projection");
        if problem.kind().has_durative_actions {
            return Err(UnsupportedFeatureError::DurativeActionsUnsupported("single_agent_projection").into());
        }
        let mut new_problem = Problem::new(format!("{}-{}", problem.name, self.agent), problem.context.clone());
        new_problem.init.clone_from(&problem.init);
        new_problem.timed_goals.clone_from(&problem.timed_goals);
        if let Some(agent) = problem.agents.get_by_name(&self.agent) {
            new_problem.agents.add(agent.clone());
        }
        for agent in problem.agents.iter().filter(|a| a.is_existing_object_agent()) {
            new_problem.agents.add(agent.clone());
        }
        new_problem.goals = problem
            .agents
            .get_by_name(&self.agent)
            .map(|a| a.goals().to_vec())
            .unwrap_or_default();

        let agent_type = problem
            .agents
            .homogeneous_type()?
            .unwrap_or_else(|| new_problem.context.types.top_user_type());
        let active_agent = new_problem
            .context
            .fluents
            .add_fluent("active-agent", vec![Param::new("a", agent_type)], Type::Bool)?;
        if let Some(agent) = problem.agents.get_by_name(&self.agent) {
            let obj_ref = expressions::auto_promote(agent.object(), &mut new_problem.context)?;
            let app = expressions::fluent_app(active_agent, std::iter::once(obj_ref).collect(), &mut new_problem.context)?;
            let true_expr = expressions::TRUE(&mut new_problem.context);
            new_problem.init.push(Effect::unconditional(app, true_expr, &new_problem.context)?);
        }

        let mut action_map = ActionMap::new();
        for action in problem.actions.iter() {
            let ia = action
                .as_instantaneous()
                .expect("durative actions were rejected above");
            match &ia.agent {
                AgentBinding::Fixed(obj) => {
                    if obj.name() == &self.agent || is_existing_object_agent(problem, obj.name()) {
                        let projected = project_action(ia.clone(), obj, active_agent, &mut new_problem.context)?;
                        action_map.record(ia.name.clone(), projected.name.clone());
                        new_problem.actions.add(Action::Instantaneous(projected))?;
                    }
                }
                AgentBinding::Parameter(idx) => {
                    let param = ia.parameters[*idx].clone();
                    let candidates: Vec<Object> = problem.context.objects.of_type(param.tpe()).cloned().collect();
                    for obj in candidates {
                        if obj.name() != &self.agent && !is_existing_object_agent(problem, obj.name()) {
                            continue;
                        }
                        let grounded = ground_on_agent(ia, *idx, &obj, &mut new_problem.context)?;
                        let projected = project_action(grounded, &obj, active_agent, &mut new_problem.context)?;
                        action_map.record(ia.name.clone(), projected.name.clone());
                        new_problem.actions.add(Action::Instantaneous(projected))?;
                    }
                }
            }
        }
        Ok(TransformResult {
            problem: new_problem,
            action_map,
        })
    }
}

fn is_existing_object_agent(problem: &Problem, name: &Sym) -> bool {
    problem
        .agents
        .iter()
        .any(|a| a.name() == name && a.is_existing_object_agent())
}

/// Folds `waitfor` into `preconditions` (clearing it) and adds a precondition
/// on `active_agent(owner)`, per the projection's generalization beyond a
/// bare ownership filter.
fn project_action(
    mut ia: InstantaneousAction,
    owner: &Object,
    active_agent: FluentId,
    ctx: &mut Context,
) -> Result<InstantaneousAction, CoreError> {
    ia.preconditions.append(&mut ia.waitfor);
    let owner_ref = expressions::auto_promote(owner, ctx)?;
    let app = expressions::fluent_app(active_agent, std::iter::once(owner_ref).collect(), ctx)?;
    ia.preconditions.push(app);
    Ok(ia)
}

/// Substitutes the agent parameter at `idx` by `obj` throughout the action,
/// removing it from the parameter list and fixing the agent binding.
fn ground_on_agent(
    ia: &InstantaneousAction,
    idx: usize,
    obj: &Object,
    ctx: &mut Context,
) -> Result<InstantaneousAction, CoreError> {
    let param_name = ia.parameters[idx].name().clone();
    let obj_ref = expressions::auto_promote(obj, ctx)?;
    let mut map = HashMap::new();
    map.insert(param_name, obj_ref);

    let mut new_params = ia.parameters.clone();
    new_params.remove(idx);
    let mut grounded = InstantaneousAction::new(
        format!("{}__{}", ia.name, obj.name()),
        new_params,
        AgentBinding::Fixed(obj.clone()),
    );
    for &p in &ia.preconditions {
        grounded.preconditions.push(expressions::substitute(p, &map, ctx)?);
    }
    for &w in &ia.waitfor {
        grounded.waitfor.push(expressions::substitute(w, &map, ctx)?);
    }
    for eff in &ia.effects {
        let target = expressions::substitute(eff.fluent_application, &map, ctx)?;
        let value = expressions::substitute(eff.value, &map, ctx)?;
        let condition = eff.condition.map(|c| expressions::substitute(c, &map, ctx)).transpose()?;
        grounded.effects.push(Effect::new(target, value, condition, ctx)?);
    }
    Ok(grounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::TRUE;
    use crate::{Agent, Expr, UserTypes};

    #[test]
    fn fixed_action_of_other_agent_is_dropped() {
        let ut = std::sync::Arc::new(UserTypes::new());
        let ctx = Context::new();
        let t = Type::User("object".into(), ut);
        let mut problem = Problem::new("p", ctx);
        problem.agents.add(Agent::Fresh(Object::new("a1", t.clone()), Vec::new()));
        problem.agents.add(Agent::Fresh(Object::new("a2", t.clone()), Vec::new()));
        let true_expr = TRUE(&mut problem.context);
        let mut act = InstantaneousAction::new("noop", vec![], AgentBinding::Fixed(Object::new("a2", t.clone())));
        act.preconditions.push(true_expr);
        problem.actions.add(Action::Instantaneous(act)).unwrap();

        let sap = SingleAgentProjection::new("a1");
        let result = sap.transform(&problem).unwrap();
        assert!(result.problem.actions.is_empty());
    }

    #[test]
    fn kept_action_gains_active_agent_precondition_and_waitfor_folds_in() {
        let ut = std::sync::Arc::new(UserTypes::new());
        let ctx = Context::new();
        let t = Type::User("object".into(), ut);
        let mut problem = Problem::new("p", ctx);
        let a1 = Object::new("a1", t.clone());
        problem.agents.add(Agent::Fresh(a1.clone(), Vec::new()));
        let f = problem.context.fluents.add_fluent("ready", vec![], Type::Bool).unwrap();
        let ready = expressions::fluent_app(f, Default::default(), &mut problem.context).unwrap();
        let mut act = InstantaneousAction::new("go", vec![], AgentBinding::Fixed(a1));
        act.waitfor.push(ready);
        problem.actions.add(Action::Instantaneous(act)).unwrap();

        let sap = SingleAgentProjection::new("a1");
        let result = sap.transform(&problem).unwrap();
        let projected = result.problem.actions.get(&"go".into()).unwrap().as_instantaneous().unwrap();
        assert!(projected.waitfor.is_empty());
        assert!(projected.preconditions.contains(&ready));
        let active_agent = result.problem.context.fluents.get_by_name("active-agent").unwrap();
        assert!(projected.preconditions.iter().any(|&p| matches!(
            result.problem.context.expr(p),
            Expr::FluentApp(f, _) if *f == active_agent
        )));
    }

    #[test]
    fn goals_become_the_projected_agents_own_goals() {
        let ut = std::sync::Arc::new(UserTypes::new());
        let mut ctx = Context::new();
        let t = Type::User("object".into(), ut);
        let agent_goal = TRUE(&mut ctx);
        let mut problem = Problem::new("p", ctx);
        let a1 = Object::new("a1", t.clone());
        problem.agents.add(Agent::Fresh(a1, vec![agent_goal]));
        let other_goal = expressions::FALSE(&mut problem.context);
        problem.goals.push(other_goal);

        let sap = SingleAgentProjection::new("a1");
        let result = sap.transform(&problem).unwrap();
        assert_eq!(result.problem.goals, vec![agent_goal]);
    }
}
