use hashbrown::HashMap;

use crate::context::ExprId;
use crate::effects::Effect;
use crate::errors::{CoreError, UnsupportedFeatureError};
use crate::expressions::{self, Expr};
use crate::fluents::FluentId;
use crate::transform::robustness::{fail_name, success_name, wait_name};
use crate::transform::{ActionMap, TransformResult, Transformer};
use crate::{Action, Agent, AgentBinding, InstantaneousAction, Param, Problem, Type};

/// Compiles an instantaneous-action multi-agent problem into its
/// robustness-verification counterpart.
///
/// Every original fluent `f` gets two mirrors: a global view `g-f` (what
/// actually happened) and, per agent, a local view `l-f` (what that agent
/// believes happened from the inside). Every original fluent additionally
/// gets a global waiting marker `w-f`. Alongside these, the compiled problem
/// carries five bookkeeping fluents: `act` (someone is still acting; starts
/// true), `crash` (some agent's precondition has failed), `fin(a)` (agent
/// `a` has finished, one way or another), and `waiting(a)` (agent `a` is
/// stuck on a waitfor condition).
///
/// Every original action `a` belonging to agent `A` compiles to a family of
/// copies built on a shared base (`act` holds; every precondition and
/// waitfor condition, locally mirrored for `A`, holds; every effect is
/// mirrored into `A`'s local view):
///   - `a_s`: additionally requires every precondition/waitfor to hold
///     *globally*, `A` not already waiting, no crash yet, and no effect
///     about to set a fluent true that some other agent is still waiting on;
///     commits `a`'s effects to the global view too.
///   - `a_f_i`: precondition `i` fails globally while every waitfor holds
///     globally; sets `failure`/`crash`.
///   - `a_w_i`: waitfor condition `i` fails globally; marks that condition's
///     global waiting marker and `A` as waiting; sets `failure`.
///   - `a_pc`/`a_pw`: once crashed, or once `A` itself is waiting, `A` keeps
///     updating its own local view without the global state moving.
///
/// Per declared agent `A`, three end actions decide whether `A` is ever
/// allowed to consider itself finished: `end_s_A` (every goal holds both
/// globally and locally), `end_w_A` (A is waiting but every goal holds
/// locally), `end_f_A_i` (goal `i` does not hold globally even though every
/// one of `A`'s goals holds locally — `A` believes it succeeded when it
/// didn't). The verification goal is `failure ∧ ⋀_A fin(A)`: any plan
/// reaching it is a counterexample to the social law's robustness.
pub struct InstantaneousRobustnessVerifier;

impl Transformer for InstantaneousRobustnessVerifier {
    fn name(&self) -> &'static str {
        "robustness_verification_instantaneous"
    }

    fn transform(&self, problem: &Problem) -> Result<TransformResult, CoreError> {
        tracing::debug!(actions = problem.actions.len(), "robustness_verification_instantaneous");
        if problem.kind().has_durative_actions {
            return Err(
                UnsupportedFeatureError::DurativeActionsUnsupported("robustness_verification_instantaneous").into(),
            );
        }
        let mut new_problem = Problem::new(format!("{}-robustness", problem.name), problem.context.clone());
        new_problem.agents.clone_from(&problem.agents);
        new_problem.timed_goals.clone_from(&problem.timed_goals);

        let agent_type = problem
            .agents
            .homogeneous_type()?
            .unwrap_or_else(|| new_problem.context.types.top_user_type());

        let fluents = RobustnessFluents::build(problem, agent_type, &mut new_problem)?;

        // Mirror the original initial state into both the global and every
        // agent's local view; the mirror fluents themselves default false,
        // matching the planner's absent-entry-is-false convention, except
        // `act` which starts true.
        for eff in &problem.init {
            let global_target = fluents.global(eff.fluent_application, &mut new_problem.context)?;
            new_problem
                .init
                .push(Effect::unconditional(global_target, eff.value, &new_problem.context)?);
            for agent in problem.agents.iter() {
                let agent_expr = expressions::auto_promote(agent.object(), &mut new_problem.context)?;
                let local_target = fluents.local(eff.fluent_application, agent_expr, &mut new_problem.context)?;
                new_problem
                    .init
                    .push(Effect::unconditional(local_target, eff.value, &new_problem.context)?);
            }
        }
        let act_app = fluents.act_app(&mut new_problem.context)?;
        let true_expr = expressions::TRUE(&mut new_problem.context);
        new_problem.init.push(Effect::unconditional(act_app, true_expr, &new_problem.context)?);

        let mut fin_apps = Vec::new();
        for agent in problem.agents.iter() {
            let agent_expr = expressions::auto_promote(agent.object(), &mut new_problem.context)?;
            fin_apps.push(fluents.fin_app(agent_expr, &mut new_problem.context)?);
        }
        let failure_app = fluents.failure_app(&mut new_problem.context)?;
        let goal_conjuncts: Vec<ExprId> = std::iter::once(failure_app).chain(fin_apps).collect();
        new_problem.goals = vec![expressions::and(goal_conjuncts, &mut new_problem.context)?];

        let mut action_map = ActionMap::new();
        for agent in problem.agents.iter() {
            build_end_actions(agent, &fluents, &mut new_problem)?;
        }
        for action in problem.actions.iter() {
            let ia = action.as_instantaneous().expect("durative actions were rejected above");
            split_into(ia, &mut new_problem, &mut action_map, &fluents)?;
        }

        Ok(TransformResult {
            problem: new_problem,
            action_map,
        })
    }
}

/// The mirror-fluent tables and bookkeeping fluents a robustness-verification
/// compilation needs, plus the helpers to build expressions against them.
struct RobustnessFluents {
    g_map: HashMap<FluentId, FluentId>,
    l_map: HashMap<FluentId, FluentId>,
    w_map: HashMap<FluentId, FluentId>,
    failure: FluentId,
    crash: FluentId,
    act: FluentId,
    fin: FluentId,
    waiting: FluentId,
}

impl RobustnessFluents {
    fn build(problem: &Problem, agent_type: Type, new_problem: &mut Problem) -> Result<Self, CoreError> {
        let mut g_map = HashMap::new();
        let mut l_map = HashMap::new();
        let mut w_map = HashMap::new();
        let original_fluents: Vec<_> = problem.context.fluents.iter().map(|(id, f)| (id, f.clone())).collect();
        for (id, fluent) in &original_fluents {
            let g_id = new_problem
                .context
                .fluents
                .add_fluent(format!("g-{}", fluent.name), fluent.parameters.clone(), fluent.return_type.clone())?;
            g_map.insert(*id, g_id);

            let mut local_params = vec![Param::new("agent", agent_type.clone())];
            local_params.extend(fluent.parameters.clone());
            let l_id = new_problem
                .context
                .fluents
                .add_fluent(format!("l-{}", fluent.name), local_params, fluent.return_type.clone())?;
            l_map.insert(*id, l_id);

            let w_id = new_problem
                .context
                .fluents
                .add_fluent(format!("w-{}", fluent.name), fluent.parameters.clone(), fluent.return_type.clone())?;
            w_map.insert(*id, w_id);
        }

        let failure = new_problem.context.fluents.add_fluent("failure", vec![], Type::Bool)?;
        let crash = new_problem.context.fluents.add_fluent("crash", vec![], Type::Bool)?;
        let act = new_problem.context.fluents.add_fluent("act", vec![], Type::Bool)?;
        let fin = new_problem
            .context
            .fluents
            .add_fluent("fin", vec![Param::new("a", agent_type.clone())], Type::Bool)?;
        let waiting = new_problem
            .context
            .fluents
            .add_fluent("waiting", vec![Param::new("a", agent_type)], Type::Bool)?;

        Ok(Self {
            g_map,
            l_map,
            w_map,
            failure,
            crash,
            act,
            fin,
            waiting,
        })
    }

    fn global(&self, e: ExprId, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::remap_fluents(e, &self.g_map, &[], ctx)?)
    }

    fn local(&self, e: ExprId, agent_expr: ExprId, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::remap_fluents(e, &self.l_map, &[agent_expr], ctx)?)
    }

    fn waiting_version(&self, e: ExprId, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::remap_fluents(e, &self.w_map, &[], ctx)?)
    }

    fn failure_app(&self, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::fluent_app(self.failure, Default::default(), ctx)?)
    }

    fn crash_app(&self, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::fluent_app(self.crash, Default::default(), ctx)?)
    }

    fn act_app(&self, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::fluent_app(self.act, Default::default(), ctx)?)
    }

    fn waiting_app(&self, agent_expr: ExprId, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::fluent_app(self.waiting, std::iter::once(agent_expr).collect(), ctx)?)
    }

    fn fin_app(&self, agent_expr: ExprId, ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
        Ok(expressions::fluent_app(self.fin, std::iter::once(agent_expr).collect(), ctx)?)
    }
}

fn agent_expr(agent: &AgentBinding, parameters: &[Param], ctx: &mut crate::Context) -> Result<ExprId, CoreError> {
    Ok(match agent {
        AgentBinding::Fixed(obj) => expressions::auto_promote(obj, ctx)?,
        AgentBinding::Parameter(idx) => expressions::auto_promote(&parameters[*idx], ctx)?,
    })
}

fn is_literal_true(value: ExprId, ctx: &crate::Context) -> bool {
    matches!(ctx.expr(value), Expr::BoolConst(true))
}

/// Builds the base action copy shared by every family: requires `act`,
/// mirrors every precondition/waitfor condition into `A`'s local view, and
/// mirrors every effect into `A`'s local view too. Each family then layers
/// its own extra preconditions/effects on top of this.
fn create_action_copy(
    ia: &InstantaneousAction,
    suffix: &str,
    fluents: &RobustnessFluents,
    ctx: &mut crate::Context,
) -> Result<InstantaneousAction, CoreError> {
    let mut copy = InstantaneousAction::new(format!("{}{}", ia.name, suffix), ia.parameters.clone(), ia.agent.clone());
    let owner = agent_expr(&ia.agent, &ia.parameters, ctx)?;

    copy.preconditions.push(fluents.act_app(ctx)?);
    for &cond in ia.preconditions.iter().chain(ia.waitfor.iter()) {
        copy.preconditions.push(fluents.local(cond, owner, ctx)?);
    }
    for eff in &ia.effects {
        let target = fluents.local(eff.fluent_application, owner, ctx)?;
        let condition = eff.condition.map(|c| fluents.local(c, owner, ctx)).transpose()?;
        copy.effects.push(Effect::new(target, eff.value, condition, ctx)?);
    }
    Ok(copy)
}

pub(super) fn split_into(
    ia: &InstantaneousAction,
    problem: &mut Problem,
    action_map: &mut ActionMap,
    fluents: &RobustnessFluents,
) -> Result<(), CoreError> {
    let owner = agent_expr(&ia.agent, &ia.parameters, &mut problem.context)?;

    // a_s: the success copy. Every precondition/waitfor holds globally too,
    // nobody is waiting, nothing has crashed, and no effect is about to set
    // a fluent true that some other agent is still waiting on; commits
    // every effect to the global view as well as the local one.
    let mut success = create_action_copy(ia, "_s", fluents, &mut problem.context)?;
    let not_waiting = expressions::not(fluents.waiting_app(owner, &mut problem.context)?, &mut problem.context)?;
    let not_crash = expressions::not(fluents.crash_app(&mut problem.context)?, &mut problem.context)?;
    success.preconditions.push(not_waiting);
    success.preconditions.push(not_crash);
    for eff in &ia.effects {
        if is_literal_true(eff.value, &problem.context) {
            let w_version = fluents.waiting_version(eff.fluent_application, &mut problem.context)?;
            let not_waiting_on_it = expressions::not(w_version, &mut problem.context)?;
            success.preconditions.push(not_waiting_on_it);
        }
    }
    for &cond in ia.preconditions.iter().chain(ia.waitfor.iter()) {
        success.preconditions.push(fluents.global(cond, &mut problem.context)?);
    }
    for eff in &ia.effects {
        let target = fluents.global(eff.fluent_application, &mut problem.context)?;
        let condition = eff.condition.map(|c| fluents.global(c, &mut problem.context)).transpose()?;
        success.effects.push(Effect::new(target, eff.value, condition, &problem.context)?);
    }
    debug_assert_eq!(success.name.as_str(), success_name(&ia.name));
    action_map.record(ia.name.clone(), success.name.clone());
    problem.actions.add(Action::Instantaneous(success))?;

    // a_f_i: precondition i fails globally while every waitfor condition
    // holds globally.
    for (i, &cond) in ia.preconditions.iter().enumerate() {
        let suffix = format!("_f_{i}");
        let mut fail = create_action_copy(ia, &suffix, fluents, &mut problem.context)?;
        debug_assert_eq!(fail.name.as_str(), fail_name(&ia.name, i));
        let not_waiting = expressions::not(fluents.waiting_app(owner, &mut problem.context)?, &mut problem.context)?;
        let not_crash = expressions::not(fluents.crash_app(&mut problem.context)?, &mut problem.context)?;
        fail.preconditions.push(not_waiting);
        fail.preconditions.push(not_crash);
        for &w in &ia.waitfor {
            fail.preconditions.push(fluents.global(w, &mut problem.context)?);
        }
        let global_cond = fluents.global(cond, &mut problem.context)?;
        let negated = expressions::not(global_cond, &mut problem.context)?;
        fail.preconditions.push(negated);
        let true_expr = expressions::TRUE(&mut problem.context);
        let failure_app = fluents.failure_app(&mut problem.context)?;
        let crash_app = fluents.crash_app(&mut problem.context)?;
        fail.effects.push(Effect::unconditional(failure_app, true_expr, &problem.context)?);
        fail.effects.push(Effect::unconditional(crash_app, true_expr, &problem.context)?);
        action_map.record(ia.name.clone(), fail.name.clone());
        problem.actions.add(Action::Instantaneous(fail))?;
    }

    // a_w_i: waitfor condition i fails globally.
    for (i, &cond) in ia.waitfor.iter().enumerate() {
        let suffix = format!("_w_{i}");
        let mut wait = create_action_copy(ia, &suffix, fluents, &mut problem.context)?;
        debug_assert_eq!(wait.name.as_str(), wait_name(&ia.name, i));
        let not_crash = expressions::not(fluents.crash_app(&mut problem.context)?, &mut problem.context)?;
        let not_waiting = expressions::not(fluents.waiting_app(owner, &mut problem.context)?, &mut problem.context)?;
        wait.preconditions.push(not_crash);
        wait.preconditions.push(not_waiting);
        let global_cond = fluents.global(cond, &mut problem.context)?;
        let negated = expressions::not(global_cond, &mut problem.context)?;
        wait.preconditions.push(negated);
        let true_expr = expressions::TRUE(&mut problem.context);
        let w_version = fluents.waiting_version(cond, &mut problem.context)?;
        let waiting_app = fluents.waiting_app(owner, &mut problem.context)?;
        let failure_app = fluents.failure_app(&mut problem.context)?;
        wait.effects.push(Effect::unconditional(w_version, true_expr, &problem.context)?);
        wait.effects.push(Effect::unconditional(waiting_app, true_expr, &problem.context)?);
        wait.effects.push(Effect::unconditional(failure_app, true_expr, &problem.context)?);
        action_map.record(ia.name.clone(), wait.name.clone());
        problem.actions.add(Action::Instantaneous(wait))?;
    }

    // a_pc/a_pw: phantom copies that keep the agent's local view moving
    // after a crash, or after the agent itself started waiting, without
    // touching the global state.
    let mut phantom_crash = create_action_copy(ia, "_pc", fluents, &mut problem.context)?;
    let crash_app = fluents.crash_app(&mut problem.context)?;
    phantom_crash.preconditions.push(crash_app);
    action_map.record(ia.name.clone(), phantom_crash.name.clone());
    problem.actions.add(Action::Instantaneous(phantom_crash))?;

    let mut phantom_wait = create_action_copy(ia, "_pw", fluents, &mut problem.context)?;
    let waiting_app = fluents.waiting_app(owner, &mut problem.context)?;
    phantom_wait.preconditions.push(waiting_app);
    action_map.record(ia.name.clone(), phantom_wait.name.clone());
    problem.actions.add(Action::Instantaneous(phantom_wait))?;

    Ok(())
}

/// Per-agent `end_s`/`end_w`/`end_f_i` actions: the only way `fin(A)` is
/// ever set, and so the only way the verification goal can be reached.
fn build_end_actions(agent: &Agent, fluents: &RobustnessFluents, problem: &mut Problem) -> Result<(), CoreError> {
    let ctx = &mut problem.context;
    let agent_binding = AgentBinding::Fixed(agent.object().clone());
    let owner = expressions::auto_promote(agent.object(), ctx)?;
    let not_fin = {
        let fin_app = fluents.fin_app(owner, ctx)?;
        expressions::not(fin_app, ctx)?
    };
    let true_expr = expressions::TRUE(ctx);
    let false_expr = expressions::FALSE(ctx);

    // end_s_A: every one of A's goals holds both globally and locally.
    let mut end_s = InstantaneousAction::new(format!("end_s_{}", agent.name()), vec![], agent_binding.clone());
    end_s.preconditions.push(not_fin);
    for &goal in agent.goals() {
        end_s.preconditions.push(fluents.global(goal, ctx)?);
        end_s.preconditions.push(fluents.local(goal, owner, ctx)?);
    }
    end_s.effects.push(Effect::unconditional(fluents.fin_app(owner, ctx)?, true_expr, ctx)?);
    end_s.effects.push(Effect::unconditional(fluents.act_app(ctx)?, false_expr, ctx)?);
    problem.actions.add(Action::Instantaneous(end_s))?;

    // end_w_A: A is waiting, but every one of its goals already holds locally.
    let mut end_w = InstantaneousAction::new(format!("end_w_{}", agent.name()), vec![], agent_binding.clone());
    end_w.preconditions.push(not_fin);
    end_w.preconditions.push(fluents.waiting_app(owner, ctx)?);
    for &goal in agent.goals() {
        end_w.preconditions.push(fluents.local(goal, owner, ctx)?);
    }
    end_w.effects.push(Effect::unconditional(fluents.fin_app(owner, ctx)?, true_expr, ctx)?);
    end_w.effects.push(Effect::unconditional(fluents.act_app(ctx)?, false_expr, ctx)?);
    problem.actions.add(Action::Instantaneous(end_w))?;

    // end_f_A_i: goal i does not hold globally even though every one of A's
    // goals holds locally — A believes it succeeded, but didn't.
    for (i, &missing_goal) in agent.goals().to_vec().iter().enumerate() {
        let mut end_f = InstantaneousAction::new(format!("end_f_{}_{i}", agent.name()), vec![], agent_binding.clone());
        end_f.preconditions.push(not_fin);
        let global_missing = fluents.global(missing_goal, ctx)?;
        let negated = expressions::not(global_missing, ctx)?;
        end_f.preconditions.push(negated);
        for &goal in agent.goals() {
            end_f.preconditions.push(fluents.local(goal, owner, ctx)?);
        }
        end_f.effects.push(Effect::unconditional(fluents.fin_app(owner, ctx)?, true_expr, ctx)?);
        end_f.effects.push(Effect::unconditional(fluents.act_app(ctx)?, false_expr, ctx)?);
        let failure_app = fluents.failure_app(ctx)?;
        end_f.effects.push(Effect::unconditional(failure_app, true_expr, ctx)?);
        problem.actions.add(Action::Instantaneous(end_f))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{fluent_app, TRUE};
    use crate::{Context, Object, UserTypes};

    fn car_type() -> Type {
        Type::User("car".into(), std::sync::Arc::new(UserTypes::new()))
    }

    #[test]
    fn success_fail_wait_and_phantom_copies_are_all_generated() {
        let t = car_type();
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("open", vec![], Type::Bool).unwrap();
        let app = fluent_app(f, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("p", ctx);
        let goal = TRUE(&mut problem.context);
        problem.agents.add(Agent::Fresh(Object::new("a1", t.clone()), vec![goal]));
        let mut action = InstantaneousAction::new("go", vec![], AgentBinding::Fixed(Object::new("a1", t)));
        action.preconditions.push(app);
        problem.actions.add(Action::Instantaneous(action)).unwrap();

        let verifier = InstantaneousRobustnessVerifier;
        let result = verifier.transform(&problem).unwrap();
        assert!(result.problem.actions.get(&"go_s".into()).is_some());
        assert!(result.problem.actions.get(&"go_f_0".into()).is_some());
        assert!(result.problem.actions.get(&"go_w_0".into()).is_none());
        assert!(result.problem.actions.get(&"go_pc".into()).is_some());
        assert!(result.problem.actions.get(&"go_pw".into()).is_some());
    }

    #[test]
    fn end_actions_are_generated_per_agent_goal() {
        let t = car_type();
        let mut ctx = Context::new();
        let goal = TRUE(&mut ctx);
        let mut problem = Problem::new("p", ctx);
        problem.agents.add(Agent::Fresh(Object::new("a1", t), vec![goal]));

        let verifier = InstantaneousRobustnessVerifier;
        let result = verifier.transform(&problem).unwrap();
        assert!(result.problem.actions.get(&"end_s_a1".into()).is_some());
        assert!(result.problem.actions.get(&"end_w_a1".into()).is_some());
        assert!(result.problem.actions.get(&"end_f_a1_0".into()).is_some());
    }

    #[test]
    fn goal_is_failure_conjoined_with_every_agents_fin() {
        let t = car_type();
        let mut ctx = Context::new();
        let goal = TRUE(&mut ctx);
        let mut problem = Problem::new("p", ctx);
        problem.agents.add(Agent::Fresh(Object::new("a1", t.clone()), vec![goal]));
        problem.agents.add(Agent::Fresh(Object::new("a2", t), vec![goal]));

        let verifier = InstantaneousRobustnessVerifier;
        let result = verifier.transform(&problem).unwrap();
        assert_eq!(result.problem.goals.len(), 1);
        match result.problem.context.expr(result.problem.goals[0]) {
            Expr::And(args) => assert_eq!(args.len(), 3), // failure + fin(a1) + fin(a2)
            other => panic!("expected a conjunction, got {other:?}"),
        }
    }
}
