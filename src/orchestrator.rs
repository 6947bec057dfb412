//! Ties the compilation passes together into the robustness-verification
//! procedure a caller actually runs: check every agent in isolation first
//! (cheap, and any single-agent failure already proves the social law is not
//! robust), then check the full multi-agent interleaving.
//!
//! This module owns no search itself; it drives whatever
//! [`Planner`](crate::planner::Planner) the caller supplies over each
//! compiled problem and reads the result back through
//! [`RobustnessStatus`](crate::transform::robustness::RobustnessStatus).

use crate::errors::{PlannerError, Res};
use crate::planner::{Planner, PlannerConfig, PlannerStatus};
use crate::transform::negative_conditions_remover::NegativeConditionsRemover;
use crate::transform::robustness::{classify_plan, durative::DurativeRobustnessVerifier, instantaneous::InstantaneousRobustnessVerifier, RobustnessStatus};
use crate::transform::single_agent_projection::SingleAgentProjection;
use crate::transform::{TransformResult, Transformer};
use crate::{Problem, Sym};

/// A multi-agent problem considered as a social law to be verified.
pub struct SocialLaw {
    pub problem: Problem,
}

impl SocialLaw {
    pub fn new(problem: Problem) -> Self {
        Self { problem }
    }

    /// Runs the full verification procedure: each agent checked in isolation
    /// for plain solvability first, then the complete multi-agent
    /// interleaving checked for a robustness counterexample.
    pub fn verify(&self, planner: &dyn Planner, config: PlannerConfig) -> Res<RobustnessStatus> {
        tracing::info!(agents = self.problem.agents.len(), actions = self.problem.actions.len(), "is_robust");
        if self.problem.kind().has_durative_actions {
            return self.verify_durative(planner, config);
        }

        for agent in self.problem.agents.iter() {
            if !self.is_single_agent_solvable(agent.name(), planner, config.clone())? {
                tracing::info!(agent = %agent.name(), "single agent alone cannot reach its own goals");
                return Ok(RobustnessStatus::NonRobustSingleAgent);
            }
        }

        tracing::debug!("is_multi_agent_robust");
        let identity = TransformResult {
            problem: clone_problem(&self.problem),
            action_map: Default::default(),
        };
        self.verify_compiled_instantaneous(&identity, planner, config)
    }

    /// Projects the problem down to just `agent`'s own point of view and
    /// asks the planner directly whether that projection is solvable — no
    /// robustness-verification compilation involved, since a lone agent has
    /// nobody else's action to race against.
    fn is_single_agent_solvable(&self, agent: &Sym, planner: &dyn Planner, config: PlannerConfig) -> Res<bool> {
        tracing::debug!(%agent, "is_single_agent_solvable");
        let projected = SingleAgentProjection::new(agent).transform(&self.problem)?;
        let prepared = prepare_for_planner(&projected.problem)?;
        match planner.solve(&prepared.problem, config)? {
            PlannerStatus::Solved(_) => Ok(true),
            PlannerStatus::Unsolvable => Ok(false),
            PlannerStatus::Undetermined => Err(PlannerError::Reported(
                "single-agent solvability search was cut off before proving either outcome".into(),
            )
            .into()),
        }
    }

    fn verify_compiled_instantaneous(
        &self,
        compiled: &TransformResult,
        planner: &dyn Planner,
        config: PlannerConfig,
    ) -> Res<RobustnessStatus> {
        let prepared = prepare_for_planner(&compiled.problem)?;
        let verified = InstantaneousRobustnessVerifier.transform(&prepared.problem)?;
        read_back(planner.solve(&verified.problem, config)?)
    }

    fn verify_durative(&self, planner: &dyn Planner, config: PlannerConfig) -> Res<RobustnessStatus> {
        let verified = DurativeRobustnessVerifier.transform(&self.problem)?;
        read_back(planner.solve(&verified.problem, config)?)
    }
}

/// Strips negative preconditions when present; otherwise passes the problem
/// through unchanged. Shared by the single-agent solvability check and the
/// multi-agent robustness check so both feed the planner the same normal
/// form.
fn prepare_for_planner(problem: &Problem) -> Res<TransformResult> {
    Ok(if problem.kind().has_negative_conditions {
        NegativeConditionsRemover.transform(problem)?
    } else {
        TransformResult {
            problem: clone_problem(problem),
            action_map: Default::default(),
        }
    })
}

fn read_back(status: PlannerStatus) -> Res<RobustnessStatus> {
    Ok(match status {
        PlannerStatus::Solved(plan) => classify_plan(&plan),
        PlannerStatus::Unsolvable => RobustnessStatus::Robust,
        PlannerStatus::Undetermined => {
            return Err(PlannerError::Reported("search was cut off before proving either outcome".into()).into())
        }
    })
}

fn clone_problem(problem: &Problem) -> Problem {
    let mut cloned = Problem::new(problem.name.clone(), problem.context.clone());
    cloned.actions = problem.actions.clone();
    cloned.agents = problem.agents.clone();
    cloned.init = problem.init.clone();
    cloned.goals = problem.goals.clone();
    cloned.timed_goals = problem.timed_goals.clone();
    cloned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{self, fluent_app};
    use crate::planner::BoundedBfsPlanner;
    use crate::{Action, Agent, AgentBinding, Context, Effect, InstantaneousAction, Object, Type, UserTypes};

    fn object_type() -> Type {
        Type::User("object".into(), std::sync::Arc::new(UserTypes::new()))
    }

    /// Two agents, each with one action that has no precondition and no
    /// waitfor at all: nothing in the compiled problem can ever fail a
    /// precondition or stall on a waitfor, so `failure` can never be set and
    /// the compiled counterexample problem is unsolvable.
    fn robust_problem() -> Problem {
        let t = object_type();
        let mut ctx = Context::new();
        let done_a = ctx.fluents.add_fluent("done_a", vec![], Type::Bool).unwrap();
        let done_b = ctx.fluents.add_fluent("done_b", vec![], Type::Bool).unwrap();
        let done_a_app = fluent_app(done_a, Default::default(), &mut ctx).unwrap();
        let done_b_app = fluent_app(done_b, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("robust", ctx);

        let a1 = Object::new("a1", t.clone());
        let a2 = Object::new("a2", t.clone());
        let goal_a = done_a_app;
        let goal_b = done_b_app;
        problem.agents.add(Agent::Fresh(a1.clone(), vec![goal_a]));
        problem.agents.add(Agent::Fresh(a2.clone(), vec![goal_b]));

        let true_expr = expressions::TRUE(&mut problem.context);
        let mut finish_a = InstantaneousAction::new("finish_a", vec![], AgentBinding::Fixed(a1));
        finish_a.effects.push(Effect::unconditional(done_a_app, true_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(finish_a)).unwrap();

        let mut finish_b = InstantaneousAction::new("finish_b", vec![], AgentBinding::Fixed(a2));
        finish_b.effects.push(Effect::unconditional(done_b_app, true_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(finish_b)).unwrap();

        problem
    }

    #[test]
    fn no_preconditions_or_waitfor_anywhere_means_robust() {
        let law = SocialLaw::new(robust_problem());
        let status = law.verify(&BoundedBfsPlanner, PlannerConfig::default()).unwrap();
        assert_eq!(status, RobustnessStatus::Robust);
    }

    /// `open` starts true. Agent A's only action to reach its goal requires
    /// `open`; agent B can clear `open` with an unconditional action before
    /// finishing its own unrelated goal. `use_a` is the only action anywhere
    /// with a plain precondition, and no action declares a `waitfor`, so any
    /// counterexample plan must pass through `use_a_f_0` and can never
    /// contain a `_w_` action.
    fn non_robust_fail_problem() -> Problem {
        let t = object_type();
        let mut ctx = Context::new();
        let open = ctx.fluents.add_fluent("open", vec![], Type::Bool).unwrap();
        let done_a = ctx.fluents.add_fluent("done_a", vec![], Type::Bool).unwrap();
        let done_b = ctx.fluents.add_fluent("done_b", vec![], Type::Bool).unwrap();
        let open_app = fluent_app(open, Default::default(), &mut ctx).unwrap();
        let done_a_app = fluent_app(done_a, Default::default(), &mut ctx).unwrap();
        let done_b_app = fluent_app(done_b, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("non-robust-fail", ctx);

        let a1 = Object::new("a1", t.clone());
        let a2 = Object::new("a2", t.clone());
        problem.agents.add(Agent::Fresh(a1.clone(), vec![done_a_app]));
        problem.agents.add(Agent::Fresh(a2.clone(), vec![done_b_app]));

        let true_expr = expressions::TRUE(&mut problem.context);
        let false_expr = expressions::FALSE(&mut problem.context);
        problem.init.push(Effect::unconditional(open_app, true_expr, &problem.context).unwrap());

        let mut use_a = InstantaneousAction::new("use_a", vec![], AgentBinding::Fixed(a1));
        use_a.preconditions.push(open_app);
        use_a.effects.push(Effect::unconditional(done_a_app, true_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(use_a)).unwrap();

        let mut close = InstantaneousAction::new("close", vec![], AgentBinding::Fixed(a2.clone()));
        close.effects.push(Effect::unconditional(open_app, false_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(close)).unwrap();

        let mut finish_b = InstantaneousAction::new("finish_b", vec![], AgentBinding::Fixed(a2));
        finish_b.effects.push(Effect::unconditional(done_b_app, true_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(finish_b)).unwrap();

        problem
    }

    #[test]
    fn a_violatable_precondition_with_no_waitfor_anywhere_is_non_robust_fail() {
        let law = SocialLaw::new(non_robust_fail_problem());
        let status = law.verify(&BoundedBfsPlanner, PlannerConfig::default()).unwrap();
        assert_eq!(status, RobustnessStatus::NonRobustFail);
    }

    /// `free` starts true. Both agents' only action waits for `free` and
    /// then clears it to reach their own goal; neither action has a plain
    /// precondition anywhere in the problem, so no `_f_` family exists at
    /// all and any counterexample plan must pass through a `_w_` action.
    fn non_robust_deadlock_problem() -> Problem {
        let t = object_type();
        let mut ctx = Context::new();
        let free = ctx.fluents.add_fluent("free", vec![], Type::Bool).unwrap();
        let done_a = ctx.fluents.add_fluent("done_a", vec![], Type::Bool).unwrap();
        let done_b = ctx.fluents.add_fluent("done_b", vec![], Type::Bool).unwrap();
        let free_app = fluent_app(free, Default::default(), &mut ctx).unwrap();
        let done_a_app = fluent_app(done_a, Default::default(), &mut ctx).unwrap();
        let done_b_app = fluent_app(done_b, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("non-robust-deadlock", ctx);

        let a1 = Object::new("a1", t.clone());
        let a2 = Object::new("a2", t.clone());
        problem.agents.add(Agent::Fresh(a1.clone(), vec![done_a_app]));
        problem.agents.add(Agent::Fresh(a2.clone(), vec![done_b_app]));

        let true_expr = expressions::TRUE(&mut problem.context);
        let false_expr = expressions::FALSE(&mut problem.context);
        problem.init.push(Effect::unconditional(free_app, true_expr, &problem.context).unwrap());

        for (obj, done_app) in [(a1, done_a_app), (a2, done_b_app)] {
            let mut cross = InstantaneousAction::new(format!("cross_{}", obj.name()), vec![], AgentBinding::Fixed(obj));
            cross.waitfor.push(free_app);
            cross.effects.push(Effect::unconditional(free_app, false_expr, &problem.context).unwrap());
            cross.effects.push(Effect::unconditional(done_app, true_expr, &problem.context).unwrap());
            problem.actions.add(Action::Instantaneous(cross)).unwrap();
        }

        problem
    }

    #[test]
    fn a_shared_waitfor_with_no_plain_precondition_anywhere_is_non_robust_deadlock() {
        let law = SocialLaw::new(non_robust_deadlock_problem());
        let status = law.verify(&BoundedBfsPlanner, PlannerConfig::default()).unwrap();
        assert_eq!(status, RobustnessStatus::NonRobustDeadlock);
    }

    /// `gate` starts false and nothing in the whole problem ever sets it:
    /// agent A's only action to reach its goal requires `gate`, so even
    /// projected alone A can never reach its goal — the single-agent phase
    /// must reject this before the multi-agent phase is ever reached.
    fn non_robust_single_agent_problem() -> Problem {
        let t = object_type();
        let mut ctx = Context::new();
        let gate = ctx.fluents.add_fluent("gate", vec![], Type::Bool).unwrap();
        let done_a = ctx.fluents.add_fluent("done_a", vec![], Type::Bool).unwrap();
        let gate_app = fluent_app(gate, Default::default(), &mut ctx).unwrap();
        let done_a_app = fluent_app(done_a, Default::default(), &mut ctx).unwrap();
        let mut problem = Problem::new("non-robust-single-agent", ctx);

        let a1 = Object::new("a1", t);
        problem.agents.add(Agent::Fresh(a1.clone(), vec![done_a_app]));

        let false_expr = expressions::FALSE(&mut problem.context);
        problem.init.push(Effect::unconditional(gate_app, false_expr, &problem.context).unwrap());

        let true_expr = expressions::TRUE(&mut problem.context);
        let mut act_a = InstantaneousAction::new("act_a", vec![], AgentBinding::Fixed(a1));
        act_a.preconditions.push(gate_app);
        act_a.effects.push(Effect::unconditional(done_a_app, true_expr, &problem.context).unwrap());
        problem.actions.add(Action::Instantaneous(act_a)).unwrap();

        problem
    }

    #[test]
    fn an_agent_whose_goal_is_unreachable_alone_is_non_robust_single_agent() {
        let law = SocialLaw::new(non_robust_single_agent_problem());
        let status = law.verify(&BoundedBfsPlanner, PlannerConfig::default()).unwrap();
        assert_eq!(status, RobustnessStatus::NonRobustSingleAgent);
    }
}
