//! Eliminates negated fluent applications from preconditions, waitfor
//! conditions and goals by introducing, for every boolean fluent `f` that is
//! ever negated, a shadow fluent `not-f` kept in lockstep with `f`: every
//! effect assigning a value to `f(args)` gets a mirrored effect assigning the
//! opposite value to `not-f(args)`, and the initial state is completed so
//! that `not-f(args)` starts out as the negation of `f(args)`'s initial
//! value (closed-world assumption). `Not(f(args))` is then rewritten to
//! `not-f(args)` everywhere.

use hashbrown::HashMap;

use crate::context::ExprId;
use crate::effects::Effect;
use crate::errors::{CoreError, TypeError};
use crate::expressions::{self, Expr};
use crate::transform::{ActionMap, TransformResult, Transformer};
use crate::{Context, FluentId, Problem, Type};

pub struct NegativeConditionsRemover;

impl Transformer for NegativeConditionsRemover {
    fn name(&self) -> &'static str {
        "negative_conditions_remover"
    }

    fn transform(&self, problem: &Problem) -> Result<TransformResult, CoreError> {
        let mut ctx = problem.context.clone();
        let negated_fluents = collect_negated_fluents(problem, &ctx);
        tracing::debug!(shadow_fluents = negated_fluents.len(), "negative_conditions_remover");

        let mut shadow: HashMap<FluentId, FluentId> = HashMap::new();
        for &f in &negated_fluents {
            let fluent = ctx.fluents.get(f).clone();
            let shadow_name = format!("not-{}", fluent.name);
            let shadow_id = ctx.fluents.add_fluent(shadow_name, fluent.parameters.clone(), Type::Bool)?;
            shadow.insert(f, shadow_id);
        }

        let mut new_problem = Problem::new(problem.name.clone(), ctx);
        new_problem.agents.clone_from(&problem.agents);
        new_problem.timed_goals.clone_from(&problem.timed_goals);

        // Mirror the initial state, then complete it for every shadow application
        // that was not explicitly assigned: absent ground atoms are false.
        let mut initial_value: HashMap<(FluentId, crate::context::SeqExprId), bool> = HashMap::new();
        for eff in &problem.init {
            let f = eff.fluent(&new_problem.context);
            if let Expr::FluentApp(_, args) = new_problem.context.expr(eff.fluent_application).clone() {
                if let Expr::BoolConst(v) = new_problem.context.expr(eff.value) {
                    initial_value.insert((f, args), *v);
                }
            }
            new_problem.init.push(eff.clone());
        }
        for (&f, &shadow_f) in &shadow {
            let fluent = new_problem.context.fluents.get(f).clone();
            let per_param_objects: Vec<Vec<crate::Object>> = fluent
                .parameters
                .iter()
                .map(|p| new_problem.context.objects.of_type(p.tpe()).cloned().collect())
                .collect();
            let groundings: Vec<Vec<crate::Object>> = if per_param_objects.is_empty() {
                vec![vec![]]
            } else {
                use itertools::Itertools;
                per_param_objects.into_iter().multi_cartesian_product().collect()
            };
            for combo in groundings {
                let args: crate::context::SeqExprId = combo
                    .iter()
                    .map(|o| expressions::auto_promote(o, &mut new_problem.context).expect("object ref is well-typed"))
                    .collect();
                let original_value = initial_value.get(&(f, args.clone())).copied().unwrap_or(false);
                let target = expressions::fluent_app(shadow_f, args, &mut new_problem.context)?;
                let value = if original_value {
                    expressions::FALSE(&mut new_problem.context)
                } else {
                    expressions::TRUE(&mut new_problem.context)
                };
                new_problem
                    .init
                    .push(Effect::unconditional(target, value, &new_problem.context)?);
            }
        }

        new_problem.goals = problem
            .goals
            .iter()
            .map(|&g| denegate(g, &mut new_problem.context, &shadow))
            .collect::<Result<Vec<_>, _>>()?;

        let mut action_map = ActionMap::new();
        for action in problem.actions.iter() {
            let ia = action
                .as_instantaneous()
                .ok_or_else(|| crate::errors::UnsupportedFeatureError::DurativeActionsUnsupported("negative_conditions_remover"))?;
            let mut new_action = ia.clone();
            new_action.preconditions = ia
                .preconditions
                .iter()
                .map(|&c| denegate(c, &mut new_problem.context, &shadow))
                .collect::<Result<Vec<_>, _>>()?;
            new_action.waitfor = ia
                .waitfor
                .iter()
                .map(|&c| denegate(c, &mut new_problem.context, &shadow))
                .collect::<Result<Vec<_>, _>>()?;

            let mut mirrored_effects = Vec::new();
            for eff in &ia.effects {
                let f = eff.fluent(&new_problem.context);
                if let Some(&shadow_f) = shadow.get(&f) {
                    let args = match new_problem.context.expr(eff.fluent_application).clone() {
                        Expr::FluentApp(_, args) => args,
                        _ => unreachable!(),
                    };
                    let target = expressions::fluent_app(shadow_f, args, &mut new_problem.context)?;
                    let value = expressions::not(eff.value, &mut new_problem.context)?;
                    let condition = eff
                        .condition
                        .map(|c| denegate(c, &mut new_problem.context, &shadow))
                        .transpose()?;
                    mirrored_effects.push(Effect::new(target, value, condition, &new_problem.context)?);
                }
            }
            new_action.effects.extend(mirrored_effects);
            new_problem.actions.add(crate::Action::Instantaneous(new_action))?;
            action_map.record(ia.name.clone(), ia.name.clone());
        }

        Ok(TransformResult {
            problem: new_problem,
            action_map,
        })
    }
}

fn collect_negated_fluents(problem: &Problem, ctx: &Context) -> Vec<FluentId> {
    let mut found = Vec::new();
    let mut visited = hashbrown::HashSet::new();
    let mut note = |e: ExprId, ctx: &Context| {
        if let Expr::Not(inner) = ctx.expr(e) {
            if let Expr::FluentApp(f, _) = ctx.expr(*inner) {
                if !found.contains(f) {
                    found.push(*f);
                }
            }
        }
    };
    for action in problem.actions.iter() {
        if let Some(ia) = action.as_instantaneous() {
            for &c in ia.preconditions.iter().chain(ia.waitfor.iter()) {
                expressions::walk(c, ctx, &mut visited, &mut note);
            }
            for eff in &ia.effects {
                if let Some(c) = eff.condition {
                    expressions::walk(c, ctx, &mut visited, &mut note);
                }
            }
        }
    }
    for &g in &problem.goals {
        expressions::walk(g, ctx, &mut visited, &mut note);
    }
    found
}

/// Rewrites `Not(f(args))` into `not-f(args)` for every `f` in `shadow`,
/// recursing through every other expression form unchanged.
fn denegate(e: ExprId, ctx: &mut Context, shadow: &HashMap<FluentId, FluentId>) -> Result<ExprId, TypeError> {
    let expr = ctx.expr(e).clone();
    match expr {
        Expr::Not(inner) => {
            if let Expr::FluentApp(f, args) = ctx.expr(inner).clone() {
                if let Some(&shadow_f) = shadow.get(&f) {
                    return expressions::fluent_app(shadow_f, args, ctx);
                }
            }
            let new_inner = denegate(inner, ctx, shadow)?;
            expressions::not(new_inner, ctx)
        }
        Expr::And(args) => {
            let new_args = args.iter().map(|&a| denegate(a, ctx, shadow)).collect::<Result<Vec<_>, _>>()?;
            expressions::and(new_args, ctx)
        }
        Expr::Or(args) => {
            let new_args = args.iter().map(|&a| denegate(a, ctx, shadow)).collect::<Result<Vec<_>, _>>()?;
            expressions::or(new_args, ctx)
        }
        Expr::Iff(a, b) => {
            let na = denegate(a, ctx, shadow)?;
            let nb = denegate(b, ctx, shadow)?;
            expressions::iff(na, nb, ctx)
        }
        Expr::Forall(params, body) => {
            let nb = denegate(body, ctx, shadow)?;
            expressions::forall(params, nb, ctx)
        }
        Expr::Exists(params, body) => {
            let nb = denegate(body, ctx, shadow)?;
            expressions::exists(params, nb, ctx)
        }
        _ => Ok(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{fluent_app, not};
    use crate::{Context, Type};

    #[test]
    fn shadow_fluent_is_declared_and_substituted() {
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("open", vec![], Type::Bool).unwrap();
        let app = fluent_app(f, Default::default(), &mut ctx).unwrap();
        let negated = not(app, &mut ctx).unwrap();
        let mut problem = Problem::new("p", ctx);
        problem.goals.push(negated);

        let remover = NegativeConditionsRemover;
        let result = remover.transform(&problem).unwrap();
        assert!(result.problem.context.fluents.get_by_name("not-open").is_some());
        assert_eq!(result.problem.goals.len(), 1);
    }
}
