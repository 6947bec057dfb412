//! Compiles a multi-agent problem into a classical/temporal planning
//! problem whose plans are counterexamples to the robustness of the
//! problem's social law: a plan found in the compiled problem corresponds to
//! an interleaving of agents' actions that leads some agent to either fail a
//! hard precondition or deadlock waiting on a condition that never becomes
//! true.
//!
//! Every original action `a` belonging to agent `A` is split into a family
//! of copies, built on a shared base (see
//! [`instantaneous`](self::instantaneous) for the full mirror-fluent
//! scheme):
//!   - `a_s`  ("success"): all of `a`'s preconditions and waitfor conditions
//!     hold globally; `a` completes normally, committing its effects to
//!     both the global and `a`'s agent's local view of the state.
//!   - `a_f_i` ("fail at precondition `i`"): precondition `i` is violated
//!     while every waitfor condition holds. Firing this copy means the
//!     social law failed to prevent agent `A` from attempting `a` in a
//!     state where it cannot legally execute: a genuine, unrecoverable
//!     failure.
//!   - `a_w_i` ("wait at condition `i`"): waitfor condition `i` is
//!     violated. Firing this copy means `A` must wait before attempting
//!     `a`; if every agent ends up only able to wait, the plan is a
//!     deadlock rather than a failure.
//!   - `a_pc`/`a_pw` ("phantom, crashed"/"phantom, waiting"): once `crash`
//!     or `A` itself is `waiting`, `A` keeps updating its own local view of
//!     the world as if `a` still executed, without the global state moving.
//!     This is what lets an agent's end action later detect that it
//!     *believes* it reached its goal while the rest of the problem
//!     disagrees.
//!
//! The orchestrator classifies a found counterexample plan by scanning its
//! actions in order for the first `_f_`- or `_w_`-suffixed one.

pub mod durative;
pub mod instantaneous;

use crate::planner::Plan;
use crate::Sym;

/// Marker fluents used by the durative compilation's simplified scheme
/// (see [`durative`]), kept independent of the richer mirror-fluent scheme
/// [`instantaneous`] builds.
pub const FAILED_FLUENT: &str = "__failed";
pub const WAITING_FLUENT: &str = "__waiting";

pub fn success_name(action: &Sym) -> String {
    format!("{action}_s")
}
pub fn fail_name(action: &Sym, precondition_index: usize) -> String {
    format!("{action}_f_{precondition_index}")
}
pub fn wait_name(action: &Sym, waitfor_index: usize) -> String {
    format!("{action}_w_{waitfor_index}")
}

/// How a counterexample plan found in a compiled robustness-verification
/// problem should be read back: the canonical outcome names used throughout
/// the rest of the crate (distinct from, but mapped onto, the compilation's
/// own `_s`/`_f_i`/`_w_i` action-name suffixes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobustnessStatus {
    /// No counterexample plan exists: the social law is robust.
    Robust,
    /// The counterexample plan only ever uses a single agent's actions: the
    /// projected single-agent problem was already not robust on its own.
    NonRobustSingleAgent,
    /// The counterexample plan's first `_f_`/`_w_` action is a `_f_i` copy:
    /// some agent's hard precondition was violated while its waitfor
    /// conditions held.
    NonRobustFail,
    /// The counterexample plan's first `_f_`/`_w_` action is a `_w_i` copy:
    /// a deadlock.
    NonRobustDeadlock,
}

/// Classifies a counterexample plan by scanning its actions in order and
/// reading off the first one whose name is `_f_`- or `_w_`-suffixed: the
/// first agent to actually fail or stall, not whichever action happened to
/// close out the plan.
pub fn classify_plan(plan: &Plan) -> RobustnessStatus {
    for action in &plan.actions {
        let name = action.action.as_str();
        if name.contains("_f_") {
            return RobustnessStatus::NonRobustFail;
        }
        if name.contains("_w_") {
            return RobustnessStatus::NonRobustDeadlock;
        }
    }
    RobustnessStatus::Robust
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ActionInstance;

    #[test]
    fn classification_scans_in_order_not_just_the_last_action() {
        let plan = Plan::new(vec![
            ActionInstance::new("go_w_0"),
            ActionInstance::new("go_pc"),
            ActionInstance::new("end_f_a1_0"),
        ]);
        assert_eq!(classify_plan(&plan), RobustnessStatus::NonRobustDeadlock);
    }

    #[test]
    fn no_fail_or_wait_action_means_robust() {
        let plan = Plan::new(vec![ActionInstance::new("go_s"), ActionInstance::new("end_s_a1")]);
        assert_eq!(classify_plan(&plan), RobustnessStatus::Robust);
    }
}
