//! Durative-action counterpart of [`instantaneous`](super::instantaneous).
//!
//! Each durative action is split into a `start` and an `end` instantaneous
//! action joined by a per-action-instance `active-<name>` marker. `over
//! all` conditions are additionally protected by an integer invariant
//! counter `i-<name>`, incremented when a start commits to needing the
//! condition and decremented when the matching end fires; an end whose
//! `over all` condition no longer holds when it fires means some other
//! agent's effect invalidated it while this action was in flight, which is
//! exactly the failure mode robustness verification is meant to catch.

use hashbrown::HashMap;

use crate::context::ExprId;
use crate::effects::Effect;
use crate::errors::{CoreError, TypeError};
use crate::expressions;
use crate::timing::TimeInterval;
use crate::transform::robustness::{FAILED_FLUENT, WAITING_FLUENT};
use crate::transform::{ActionMap, TransformResult, Transformer};
use crate::{Action, Context, DurativeAction, InstantaneousAction, Problem, Sym, Type};

pub struct DurativeRobustnessVerifier;

impl Transformer for DurativeRobustnessVerifier {
    fn name(&self) -> &'static str {
        "robustness_verification_durative"
    }

    fn transform(&self, problem: &Problem) -> Result<TransformResult, CoreError> {
        tracing::debug!(actions = problem.actions.len(), "robustness_verification_durative");
        let mut ctx = problem.context.clone();
        let failed = ctx.fluents.add_fluent(FAILED_FLUENT, vec![], Type::Bool)?;
        let waiting = ctx.fluents.add_fluent(WAITING_FLUENT, vec![], Type::Bool)?;

        let mut active: HashMap<Sym, crate::FluentId> = HashMap::new();
        let mut counters: HashMap<Sym, crate::FluentId> = HashMap::new();
        for action in problem.actions.iter() {
            if let Some(da) = action.as_durative() {
                active.insert(da.name.clone(), ctx.fluents.add_fluent(format!("active-{}", da.name), vec![], Type::Bool)?);
                if da.conditions.iter().any(|c| c.interval == TimeInterval::over_all()) {
                    counters.insert(da.name.clone(), ctx.fluents.add_fluent(format!("i-{}", da.name), vec![], Type::INT)?);
                }
            }
        }

        let mut new_problem = Problem::new(format!("{}-robustness", problem.name), ctx);
        new_problem.agents.clone_from(&problem.agents);
        new_problem.timed_goals.clone_from(&problem.timed_goals);
        new_problem.init.clone_from(&problem.init);

        let failed_app = expressions::fluent_app(failed, Default::default(), &mut new_problem.context)?;
        let waiting_app = expressions::fluent_app(waiting, Default::default(), &mut new_problem.context)?;
        let false_expr = expressions::FALSE(&mut new_problem.context);
        new_problem
            .init
            .push(Effect::unconditional(failed_app, false_expr, &new_problem.context)?);
        new_problem
            .init
            .push(Effect::unconditional(waiting_app, false_expr, &new_problem.context)?);
        for &active_f in active.values() {
            let app = expressions::fluent_app(active_f, Default::default(), &mut new_problem.context)?;
            new_problem
                .init
                .push(Effect::unconditional(app, false_expr, &new_problem.context)?);
        }
        for &counter_f in counters.values() {
            let app = expressions::fluent_app(counter_f, Default::default(), &mut new_problem.context)?;
            let zero = expressions::auto_promote(0i64, &mut new_problem.context)?;
            new_problem
                .init
                .push(Effect::unconditional(app, zero, &new_problem.context)?);
        }

        let goal = expressions::or([failed_app, waiting_app], &mut new_problem.context)?;
        new_problem.goals = vec![goal];

        let mut action_map = ActionMap::new();
        for action in problem.actions.iter() {
            match action {
                Action::Instantaneous(ia) => {
                    // A durative problem that also contains plain instantaneous actions
                    // splits them with the same simplified `_s`/`_f_i`/`_w_i` family this
                    // module already uses for durative actions, rather than pulling in
                    // `instantaneous`'s richer mirror-fluent scheme.
                    split_plain_instantaneous(ia, &mut new_problem, &mut action_map, failed_app, waiting_app)?;
                }
                Action::Durative(da) => {
                    split_durative(
                        da,
                        &mut new_problem,
                        &mut action_map,
                        failed_app,
                        waiting_app,
                        active[&da.name],
                        counters.get(&da.name).copied(),
                    )?;
                }
            }
        }

        Ok(TransformResult {
            problem: new_problem,
            action_map,
        })
    }
}

/// The simplified `_s`/`_f_i`/`_w_i` copy family this module's durative
/// splitting already uses, applied to a plain instantaneous action mixed
/// into a durative problem.
fn split_plain_instantaneous(
    ia: &InstantaneousAction,
    problem: &mut Problem,
    action_map: &mut ActionMap,
    failed_app: ExprId,
    waiting_app: ExprId,
) -> Result<(), CoreError> {
    let mut success = InstantaneousAction::new(
        crate::transform::robustness::success_name(&ia.name),
        ia.parameters.clone(),
        ia.agent.clone(),
    );
    success.preconditions = ia.preconditions.iter().chain(ia.waitfor.iter()).copied().collect();
    success.effects = ia.effects.clone();
    action_map.record(ia.name.clone(), success.name.clone());
    problem.actions.add(Action::Instantaneous(success))?;

    for (i, &cond) in ia.preconditions.iter().enumerate() {
        let negated = expressions::not(cond, &mut problem.context)?;
        let mut guard: Vec<ExprId> = ia.waitfor.clone();
        guard.push(negated);
        let mut fail = InstantaneousAction::new(
            crate::transform::robustness::fail_name(&ia.name, i),
            ia.parameters.clone(),
            ia.agent.clone(),
        );
        fail.preconditions = guard;
        let true_expr = expressions::TRUE(&mut problem.context);
        fail.effects = vec![Effect::unconditional(failed_app, true_expr, &problem.context)?];
        action_map.record(ia.name.clone(), fail.name.clone());
        problem.actions.add(Action::Instantaneous(fail))?;
    }

    for (i, &cond) in ia.waitfor.iter().enumerate() {
        let negated = expressions::not(cond, &mut problem.context)?;
        let mut wait = InstantaneousAction::new(
            crate::transform::robustness::wait_name(&ia.name, i),
            ia.parameters.clone(),
            ia.agent.clone(),
        );
        wait.preconditions = vec![negated];
        let true_expr = expressions::TRUE(&mut problem.context);
        wait.effects = vec![Effect::unconditional(waiting_app, true_expr, &problem.context)?];
        action_map.record(ia.name.clone(), wait.name.clone());
        problem.actions.add(Action::Instantaneous(wait))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn split_durative(
    da: &DurativeAction,
    problem: &mut Problem,
    action_map: &mut ActionMap,
    failed_app: ExprId,
    waiting_app: ExprId,
    active_fluent: crate::FluentId,
    counter_fluent: Option<crate::FluentId>,
) -> Result<(), CoreError> {
    let ctx = &mut problem.context;
    let start_conditions: Vec<ExprId> = da
        .conditions
        .iter()
        .filter(|c| c.interval.contains_start())
        .map(|c| c.condition)
        .collect();
    let overall_conditions: Vec<ExprId> = da
        .conditions
        .iter()
        .filter(|c| c.interval == TimeInterval::over_all())
        .map(|c| c.condition)
        .collect();
    let end_conditions: Vec<ExprId> = da
        .conditions
        .iter()
        .filter(|c| c.interval.contains_end())
        .map(|c| c.condition)
        .collect();
    let start_waitfor: Vec<ExprId> = da.waitfor.iter().map(|c| c.condition).collect();

    let active_true = expressions::TRUE(ctx);
    let active_false = expressions::FALSE(ctx);
    let active_app = expressions::fluent_app(active_fluent, Default::default(), ctx)?;

    // start_s: begins the action. All at-start conditions and waitfor conditions
    // hold; marks the action active and commits to every over-all condition.
    let mut start_s = InstantaneousAction::new(format!("{}__start_s", da.name), da.parameters.clone(), da.agent.clone());
    start_s.preconditions = start_conditions.iter().chain(overall_conditions.iter()).copied().collect();
    start_s.preconditions.extend(start_waitfor.iter().copied());
    start_s.effects.push(Effect::unconditional(active_app, active_true, ctx)?);
    for eff in &da.effects {
        if eff.timing.kind == crate::timing::TimepointKind::Start {
            start_s.effects.push(eff.effect.clone());
        }
    }
    if let Some(counter) = counter_fluent {
        start_s.effects.push(increment_counter(counter, 1, ctx)?);
    }
    action_map.record(da.name.clone(), start_s.name.clone());
    problem.actions.add(Action::Instantaneous(start_s))?;

    // start_f_i: an at-start precondition is violated while waitfor conditions hold.
    for (i, &cond) in start_conditions.iter().enumerate() {
        let negated = expressions::not(cond, ctx)?;
        let mut guard = start_waitfor.clone();
        guard.push(negated);
        let mut fail = InstantaneousAction::new(format!("{}__start_f_{i}", da.name), da.parameters.clone(), da.agent.clone());
        fail.preconditions = guard;
        let true_expr = expressions::TRUE(ctx);
        fail.effects = vec![Effect::unconditional(failed_app, true_expr, ctx)?];
        action_map.record(da.name.clone(), fail.name.clone());
        problem.actions.add(Action::Instantaneous(fail))?;
    }

    // start_w_i: a waitfor condition is violated; the agent must wait before starting.
    for (i, &cond) in start_waitfor.iter().enumerate() {
        let negated = expressions::not(cond, ctx)?;
        let mut wait = InstantaneousAction::new(format!("{}__start_w_{i}", da.name), da.parameters.clone(), da.agent.clone());
        wait.preconditions = vec![negated];
        let true_expr = expressions::TRUE(ctx);
        wait.effects = vec![Effect::unconditional(waiting_app, true_expr, ctx)?];
        action_map.record(da.name.clone(), wait.name.clone());
        problem.actions.add(Action::Instantaneous(wait))?;
    }

    // end_s: the action is active, every over-all condition still holds (nobody
    // invalidated it while this instance was in flight) and every at-end
    // condition holds; the action completes normally.
    let mut end_s = InstantaneousAction::new(format!("{}__end_s", da.name), da.parameters.clone(), da.agent.clone());
    end_s.preconditions = std::iter::once(active_app)
        .chain(overall_conditions.iter().copied())
        .chain(end_conditions.iter().copied())
        .collect();
    end_s.effects.push(Effect::unconditional(active_app, active_false, ctx)?);
    for eff in &da.effects {
        if eff.timing.kind == crate::timing::TimepointKind::End {
            end_s.effects.push(eff.effect.clone());
        }
    }
    if let Some(counter) = counter_fluent {
        end_s.effects.push(increment_counter(counter, -1, ctx)?);
    }
    action_map.record(da.name.clone(), end_s.name.clone());
    problem.actions.add(Action::Instantaneous(end_s))?;

    // end_f: the action was active but an over-all condition was invalidated by
    // some concurrent action before this instance could end: a genuine failure.
    if !overall_conditions.is_empty() {
        let any_overall_violated = expressions::or(
            overall_conditions.iter().map(|&c| expressions::not(c, ctx)).collect::<Result<Vec<_>, TypeError>>()?,
            ctx,
        )?;
        let mut end_fail = InstantaneousAction::new(format!("{}__end_f_0", da.name), da.parameters.clone(), da.agent.clone());
        end_fail.preconditions = vec![active_app, any_overall_violated];
        let true_expr = expressions::TRUE(ctx);
        end_fail.effects = vec![Effect::unconditional(failed_app, true_expr, ctx)?];
        action_map.record(da.name.clone(), end_fail.name.clone());
        problem.actions.add(Action::Instantaneous(end_fail))?;
    }

    // end_w: the action is active, over-all conditions still hold, but an
    // at-end condition does not yet: the agent must keep waiting for the
    // duration bound to elapse.
    if !end_conditions.is_empty() {
        let any_end_violated = expressions::or(
            end_conditions.iter().map(|&c| expressions::not(c, ctx)).collect::<Result<Vec<_>, TypeError>>()?,
            ctx,
        )?;
        let mut end_wait = InstantaneousAction::new(format!("{}__end_w_0", da.name), da.parameters.clone(), da.agent.clone());
        end_wait.preconditions = std::iter::once(active_app)
            .chain(overall_conditions.iter().copied())
            .chain(std::iter::once(any_end_violated))
            .collect();
        let true_expr = expressions::TRUE(ctx);
        end_wait.effects = vec![Effect::unconditional(waiting_app, true_expr, ctx)?];
        action_map.record(da.name.clone(), end_wait.name.clone());
        problem.actions.add(Action::Instantaneous(end_wait))?;
    }

    Ok(())
}

fn increment_counter(counter: crate::FluentId, delta: i64, ctx: &mut Context) -> Result<Effect, TypeError> {
    let app = expressions::fluent_app(counter, Default::default(), ctx)?;
    let delta_expr = expressions::auto_promote(delta, ctx)?;
    let value = expressions::plus([app, delta_expr], ctx)?;
    Effect::unconditional(app, value, ctx)
}
