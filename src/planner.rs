//! The search-side contract the core compiles *for*, without performing any
//! search itself. A `Planner` consumes a [`Problem`] produced by a
//! [`Transformer`](crate::transform::Transformer) pipeline and either finds a
//! [`Plan`] or reports why it couldn't.
//!
//! Robustness verification reframes "is this social law robust?" as "does no
//! plan exist in the compiled problem?", so the planner's job here is to
//! search for a *counterexample*, not to produce an executable plan for its
//! own sake.

use crate::context::ExprId;
use crate::errors::Res;
use crate::Sym;

/// A single ground action firing, named after the action it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionInstance {
    pub action: Sym,
}

impl ActionInstance {
    pub fn new(action: impl Into<Sym>) -> Self {
        Self { action: action.into() }
    }
}

impl std::fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.action)
    }
}

/// A totally-ordered sequence of action firings that reaches the problem's
/// goal from its initial state.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    pub actions: Vec<ActionInstance>,
}

impl Plan {
    pub fn new(actions: Vec<ActionInstance>) -> Self {
        Self { actions }
    }

    pub fn last(&self) -> Option<&ActionInstance> {
        self.actions.last()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::utils::disp_iter(f, &self.actions, "; ")
    }
}

/// The result of a single `Planner::solve` call.
#[derive(Clone, Debug)]
pub enum PlannerStatus {
    /// A plan was found.
    Solved(Plan),
    /// Search completed and proved no plan exists.
    Unsolvable,
    /// Search was cut off by `PlannerConfig::step_bound` or `time_bound`
    /// before it could prove either outcome.
    Undetermined,
}

/// Configuration needed to invoke a planner: for an external process, its
/// binary and extra arguments; for any implementation, the search bounds it
/// is expected to respect. This is the one piece of environment the core
/// inspects directly, rather than deriving from the problem itself.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// Path to an external planner executable, if `Planner` shells out to one.
    pub binary: Option<std::path::PathBuf>,
    /// Extra arguments forwarded verbatim to the external planner.
    pub extra_args: Vec<String>,
    /// Upper bound on search steps, chiefly respected by the bounded-BFS
    /// reference planner used in tests.
    pub step_bound: usize,
    pub time_bound: std::time::Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            binary: None,
            extra_args: Vec::new(),
            step_bound: 10_000,
            time_bound: std::time::Duration::from_secs(30),
        }
    }
}

/// A search procedure over ground states of a [`Problem`](crate::Problem).
///
/// The core never implements this itself for anything beyond tests: real
/// deployments plug in an external classical or temporal planner and report
/// its output back through this trait.
pub trait Planner {
    fn solve(&self, problem: &crate::Problem, config: PlannerConfig) -> Res<PlannerStatus>;
}

/// Evaluates whether `expr` holds in a state given as fluent-application
/// truth values, used by planner implementations to check preconditions and
/// goals without duplicating the expression evaluator per search algorithm.
pub fn holds(expr: ExprId, ctx: &crate::Context, state: &hashbrown::HashMap<ExprId, crate::IntValue>) -> bool {
    eval_bool(expr, ctx, state)
}

/// Evaluates `expr` to the integer value an effect would assign: booleans
/// become `0`/`1`, arithmetic expressions their numeric result.
pub fn value_of(expr: ExprId, ctx: &crate::Context, state: &hashbrown::HashMap<ExprId, crate::IntValue>) -> crate::IntValue {
    if ctx.type_of(expr).is_subtype_of(&crate::Type::Bool) {
        eval_bool(expr, ctx, state) as crate::IntValue
    } else {
        eval_int(expr, ctx, state)
    }
}

fn eval_bool(e: ExprId, ctx: &crate::Context, state: &hashbrown::HashMap<ExprId, crate::IntValue>) -> bool {
    use crate::Expr;
    match ctx.expr(e) {
        Expr::BoolConst(b) => *b,
        Expr::FluentApp(..) => state.get(&e).copied().unwrap_or(0) != 0,
        Expr::Not(a) => !eval_bool(*a, ctx, state),
        Expr::And(args) => args.iter().all(|&a| eval_bool(a, ctx, state)),
        Expr::Or(args) => args.iter().any(|&a| eval_bool(a, ctx, state)),
        Expr::Iff(a, b) => eval_bool(*a, ctx, state) == eval_bool(*b, ctx, state),
        Expr::Equals(a, b) => eval_int(*a, ctx, state) == eval_int(*b, ctx, state),
        Expr::Gt(a, b) => eval_int(*a, ctx, state) > eval_int(*b, ctx, state),
        // Quantifiers are expected to be grounded away before a plan is searched.
        Expr::Forall(..) | Expr::Exists(..) => true,
        _ => true,
    }
}

fn eval_int(e: ExprId, ctx: &crate::Context, state: &hashbrown::HashMap<ExprId, crate::IntValue>) -> crate::IntValue {
    use crate::Expr;
    match ctx.expr(e) {
        Expr::IntConst(i) => *i,
        Expr::FluentApp(..) => state.get(&e).copied().unwrap_or(0),
        Expr::Plus(args) => args.iter().map(|&a| eval_int(a, ctx, state)).sum(),
        Expr::Times(args) => args.iter().map(|&a| eval_int(a, ctx, state)).product(),
        Expr::Minus(a, b) => eval_int(*a, ctx, state) - eval_int(*b, ctx, state),
        _ => 0,
    }
}

/// Exhaustive breadth-first search over ground states, bounded by
/// `PlannerConfig`. Reference-only: real deployments hand this job to an
/// external classical or temporal planner via `PlannerConfig::binary`.
pub struct BoundedBfsPlanner;

impl Planner for BoundedBfsPlanner {
    fn solve(&self, problem: &crate::Problem, config: PlannerConfig) -> Res<PlannerStatus> {
        let start = std::time::Instant::now();
        let ctx = &problem.context;
        let mut initial_state: hashbrown::HashMap<ExprId, crate::IntValue> = hashbrown::HashMap::new();
        for eff in &problem.init {
            apply_effect(eff, ctx, &mut initial_state);
        }
        let goal = *problem
            .goals
            .first()
            .expect("a compiled robustness problem always carries exactly one goal expression");

        let mut queue = std::collections::VecDeque::new();
        let mut visited = hashbrown::HashSet::new();
        visited.insert(state_key(&initial_state));
        queue.push_back((initial_state, Vec::new()));

        let mut steps = 0usize;
        while let Some((state, path)) = queue.pop_front() {
            if holds(goal, ctx, &state) {
                return Ok(PlannerStatus::Solved(Plan::new(path)));
            }
            steps += 1;
            if steps > config.step_bound || start.elapsed() > config.time_bound {
                return Ok(PlannerStatus::Undetermined);
            }
            for action in problem.actions.iter() {
                let ia = action
                    .as_instantaneous()
                    .expect("the reference planner only handles fully-grounded instantaneous actions");
                if !ia.preconditions.iter().all(|&c| holds(c, ctx, &state)) {
                    continue;
                }
                let mut next = state.clone();
                for eff in &ia.effects {
                    apply_effect(eff, ctx, &mut next);
                }
                if visited.insert(state_key(&next)) {
                    let mut next_path = path.clone();
                    next_path.push(ActionInstance::new(ia.name.clone()));
                    queue.push_back((next, next_path));
                }
            }
        }
        Ok(PlannerStatus::Unsolvable)
    }
}

fn apply_effect(eff: &crate::Effect, ctx: &crate::Context, state: &mut hashbrown::HashMap<ExprId, crate::IntValue>) {
    if let Some(condition) = eff.condition {
        if !holds(condition, ctx, state) {
            return;
        }
    }
    let value = value_of(eff.value, ctx, state);
    state.insert(eff.fluent_application, value);
}

fn state_key(state: &hashbrown::HashMap<ExprId, crate::IntValue>) -> Vec<(ExprId, crate::IntValue)> {
    let mut entries: Vec<_> = state.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{fluent_app, TRUE};
    use crate::{Context, Type};

    #[test]
    fn holds_reads_fluent_from_state() {
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("open", vec![], Type::Bool).unwrap();
        let app = fluent_app(f, Default::default(), &mut ctx).unwrap();
        let mut state = hashbrown::HashMap::new();
        state.insert(app, 1);
        assert!(holds(app, &ctx, &state));
        let empty = hashbrown::HashMap::new();
        assert!(!holds(app, &ctx, &empty));
    }

    #[test]
    fn plan_display_joins_actions() {
        let t = TRUE(&mut Context::new());
        let _ = t;
        let plan = Plan::new(vec![ActionInstance::new("a"), ActionInstance::new("b")]);
        assert_eq!(plan.to_string(), "a; b");
    }
}
