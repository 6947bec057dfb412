use hashbrown::{HashMap, HashSet};

use crate::context::{ExprId, SeqExprId};
use crate::errors::{ExpressionDefinitionError, TypeError};
use crate::{Context, FluentId, IntInterval, Object, Param, Sym, Type};

pub type IntValue = i64;

/// A structurally-interned expression node. Children are referred to by
/// `ExprId`, never inline, so that every node lives in exactly one place in
/// a `Context`'s arena.
#[derive(Clone, Debug)]
pub enum Expr {
    BoolConst(bool),
    IntConst(IntValue),
    ObjectRef(Object),
    ParamRef(Param),
    FluentApp(FluentId, SeqExprId),
    Not(ExprId),
    And(SeqExprId),
    Or(SeqExprId),
    Iff(ExprId, ExprId),
    Equals(ExprId, ExprId),
    Gt(ExprId, ExprId),
    Plus(SeqExprId),
    Minus(ExprId, ExprId),
    Times(SeqExprId),
    Forall(Vec<Param>, ExprId),
    Exists(Vec<Param>, ExprId),
}

impl Expr {
    pub fn tpe(&self, ctx: &Context) -> Result<Type, TypeError> {
        match self {
            Expr::BoolConst(_) => Ok(Type::Bool),
            Expr::IntConst(i) => Ok(Type::Int(IntInterval::singleton(*i))),
            Expr::ObjectRef(o) => Ok(o.tpe().clone()),
            Expr::ParamRef(p) => Ok(p.tpe().clone()),
            Expr::FluentApp(f, args) => {
                let fluent = ctx.fluents.get(*f);
                if args.len() != fluent.arity() {
                    return Err(TypeError::MissingParameter(fluent.name().clone()));
                }
                for (&arg, param) in args.iter().zip(fluent.parameters.iter()) {
                    if !ctx.type_of(arg).is_subtype_of(param.tpe()) {
                        return Err(TypeError::IncompatibleType(arg));
                    }
                }
                Ok(fluent.return_type.clone())
            }
            Expr::Not(a) => {
                expect_bool(*a, ctx)?;
                Ok(Type::Bool)
            }
            Expr::And(args) | Expr::Or(args) => {
                for &a in args {
                    expect_bool(a, ctx)?;
                }
                Ok(Type::Bool)
            }
            Expr::Iff(a, b) => {
                expect_bool(*a, ctx)?;
                expect_bool(*b, ctx)?;
                Ok(Type::Bool)
            }
            // Equality does not enforce coherent typing between its operands.
            Expr::Equals(_, _) => Ok(Type::Bool),
            Expr::Gt(a, b) => {
                expect_int(*a, ctx)?;
                expect_int(*b, ctx)?;
                Ok(Type::Bool)
            }
            Expr::Plus(args) | Expr::Times(args) => {
                for &a in args {
                    expect_int(a, ctx)?;
                }
                Ok(Type::INT)
            }
            Expr::Minus(a, b) => {
                expect_int(*a, ctx)?;
                expect_int(*b, ctx)?;
                Ok(Type::INT)
            }
            Expr::Forall(_, body) | Expr::Exists(_, body) => {
                expect_bool(*body, ctx)?;
                Ok(Type::Bool)
            }
        }
    }
}

fn expect_bool(e: ExprId, ctx: &Context) -> Result<(), TypeError> {
    if ctx.type_of(e).is_subtype_of(&Type::Bool) {
        Ok(())
    } else {
        Err(TypeError::IncompatibleType(e))
    }
}

fn expect_int(e: ExprId, ctx: &Context) -> Result<(), TypeError> {
    if ctx.type_of(e).is_subtype_of(&Type::INT) {
        Ok(())
    } else {
        Err(TypeError::IncompatibleType(e))
    }
}

/// Lifts a bare value into an interned expression. Implemented for the
/// handful of things that can appear as a leaf: booleans, integers, objects
/// and parameters.
pub trait AutoPromote {
    fn auto_promote(self, ctx: &mut Context) -> Result<ExprId, TypeError>;
}

impl AutoPromote for ExprId {
    fn auto_promote(self, _ctx: &mut Context) -> Result<ExprId, TypeError> {
        Ok(self)
    }
}
impl AutoPromote for bool {
    fn auto_promote(self, ctx: &mut Context) -> Result<ExprId, TypeError> {
        ctx.intern(Expr::BoolConst(self))
    }
}
impl AutoPromote for IntValue {
    fn auto_promote(self, ctx: &mut Context) -> Result<ExprId, TypeError> {
        ctx.intern(Expr::IntConst(self))
    }
}
impl AutoPromote for &Object {
    fn auto_promote(self, ctx: &mut Context) -> Result<ExprId, TypeError> {
        ctx.intern(Expr::ObjectRef(self.clone()))
    }
}
impl AutoPromote for &Param {
    fn auto_promote(self, ctx: &mut Context) -> Result<ExprId, TypeError> {
        ctx.intern(Expr::ParamRef(self.clone()))
    }
}

pub fn auto_promote<T: AutoPromote>(value: T, ctx: &mut Context) -> Result<ExprId, TypeError> {
    value.auto_promote(ctx)
}

#[allow(non_snake_case)]
pub fn TRUE(ctx: &mut Context) -> ExprId {
    ctx.intern(Expr::BoolConst(true)).expect("bool const is always well-typed")
}
#[allow(non_snake_case)]
pub fn FALSE(ctx: &mut Context) -> ExprId {
    ctx.intern(Expr::BoolConst(false)).expect("bool const is always well-typed")
}

pub fn fluent_app(fluent: FluentId, args: SeqExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::FluentApp(fluent, args))
}

pub fn not(a: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Not(a))
}

pub fn and(args: impl IntoIterator<Item = ExprId>, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::And(args.into_iter().collect()))
}

pub fn or(args: impl IntoIterator<Item = ExprId>, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Or(args.into_iter().collect()))
}

pub fn iff(a: ExprId, b: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Iff(a, b))
}

pub fn equals(a: ExprId, b: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Equals(a, b))
}

pub fn gt(a: ExprId, b: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Gt(a, b))
}

pub fn plus(args: impl IntoIterator<Item = ExprId>, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Plus(args.into_iter().collect()))
}

pub fn minus(a: ExprId, b: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Minus(a, b))
}

pub fn times(args: impl IntoIterator<Item = ExprId>, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Times(args.into_iter().collect()))
}

pub fn forall(params: Vec<Param>, body: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Forall(params, body))
}

pub fn exists(params: Vec<Param>, body: ExprId, ctx: &mut Context) -> Result<ExprId, TypeError> {
    ctx.intern(Expr::Exists(params, body))
}

/// True iff `Not` only ever appears directly above a fluent application.
pub fn is_nnf(e: ExprId, ctx: &Context) -> bool {
    match ctx.expr(e) {
        Expr::Not(inner) => matches!(ctx.expr(*inner), Expr::FluentApp(..)),
        Expr::And(args) | Expr::Or(args) => args.iter().all(|&a| is_nnf(a, ctx)),
        Expr::Iff(a, b) => is_nnf(*a, ctx) && is_nnf(*b, ctx),
        Expr::Forall(_, body) | Expr::Exists(_, body) => is_nnf(*body, ctx),
        Expr::FluentApp(_, args) => args.iter().all(|&a| is_nnf(a, ctx)),
        _ => true,
    }
}

/// Pushes negations down to the leaves using De Morgan's laws, flipping
/// quantifiers along the way. Fails if a negation would have to cross an
/// `Iff`, which has no NNF-preserving expansion here.
pub fn to_nnf(e: ExprId, ctx: &mut Context) -> Result<ExprId, ExpressionDefinitionError> {
    push_not(e, false, ctx)
}

fn push_not(e: ExprId, negate: bool, ctx: &mut Context) -> Result<ExprId, ExpressionDefinitionError> {
    let expr = ctx.expr(e).clone();
    match expr {
        Expr::Not(inner) => push_not(inner, !negate, ctx),
        Expr::And(args) => {
            let new_args = args
                .iter()
                .map(|&a| push_not(a, negate, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            if negate {
                or(new_args, ctx).map_err(to_definition_error)
            } else {
                and(new_args, ctx).map_err(to_definition_error)
            }
        }
        Expr::Or(args) => {
            let new_args = args
                .iter()
                .map(|&a| push_not(a, negate, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            if negate {
                and(new_args, ctx).map_err(to_definition_error)
            } else {
                or(new_args, ctx).map_err(to_definition_error)
            }
        }
        Expr::Iff(a, b) => {
            if negate {
                return Err(ExpressionDefinitionError::NotInNnf(format!(
                    "cannot push a negation through an Iff (expr {e:?})"
                )));
            }
            let na = to_nnf(a, ctx)?;
            let nb = to_nnf(b, ctx)?;
            iff(na, nb, ctx).map_err(to_definition_error)
        }
        Expr::Forall(params, body) => {
            let nb = push_not(body, negate, ctx)?;
            if negate {
                exists(params, nb, ctx).map_err(to_definition_error)
            } else {
                forall(params, nb, ctx).map_err(to_definition_error)
            }
        }
        Expr::Exists(params, body) => {
            let nb = push_not(body, negate, ctx)?;
            if negate {
                forall(params, nb, ctx).map_err(to_definition_error)
            } else {
                exists(params, nb, ctx).map_err(to_definition_error)
            }
        }
        _ => {
            if negate {
                not(e, ctx).map_err(to_definition_error)
            } else {
                Ok(e)
            }
        }
    }
}

fn to_definition_error(e: TypeError) -> ExpressionDefinitionError {
    ExpressionDefinitionError::MalformedQuantifier(e.to_string())
}

/// Capture-free substitution of parameters (looked up by name) by
/// expressions. Parameters shadowed by a `Forall`/`Exists` binder of the
/// same name are left untouched within that binder's body.
pub fn substitute(e: ExprId, map: &HashMap<Sym, ExprId>, ctx: &mut Context) -> Result<ExprId, TypeError> {
    if map.is_empty() {
        return Ok(e);
    }
    let expr = ctx.expr(e).clone();
    match expr {
        Expr::ParamRef(p) => match map.get(p.name()) {
            Some(&replacement) => Ok(replacement),
            None => Ok(e),
        },
        Expr::Not(a) => {
            let na = substitute(a, map, ctx)?;
            not(na, ctx)
        }
        Expr::And(args) => {
            let new_args = args.iter().map(|&a| substitute(a, map, ctx)).collect::<Result<Vec<_>, _>>()?;
            and(new_args, ctx)
        }
        Expr::Or(args) => {
            let new_args = args.iter().map(|&a| substitute(a, map, ctx)).collect::<Result<Vec<_>, _>>()?;
            or(new_args, ctx)
        }
        Expr::Iff(a, b) => {
            let na = substitute(a, map, ctx)?;
            let nb = substitute(b, map, ctx)?;
            iff(na, nb, ctx)
        }
        Expr::Equals(a, b) => {
            let na = substitute(a, map, ctx)?;
            let nb = substitute(b, map, ctx)?;
            equals(na, nb, ctx)
        }
        Expr::Gt(a, b) => {
            let na = substitute(a, map, ctx)?;
            let nb = substitute(b, map, ctx)?;
            gt(na, nb, ctx)
        }
        Expr::Plus(args) => {
            let new_args = args.iter().map(|&a| substitute(a, map, ctx)).collect::<Result<Vec<_>, _>>()?;
            plus(new_args, ctx)
        }
        Expr::Minus(a, b) => {
            let na = substitute(a, map, ctx)?;
            let nb = substitute(b, map, ctx)?;
            minus(na, nb, ctx)
        }
        Expr::Times(args) => {
            let new_args = args.iter().map(|&a| substitute(a, map, ctx)).collect::<Result<Vec<_>, _>>()?;
            times(new_args, ctx)
        }
        Expr::FluentApp(f, args) => {
            let new_args: SeqExprId = args
                .iter()
                .map(|&a| substitute(a, map, ctx))
                .collect::<Result<SeqExprId, _>>()?;
            fluent_app(f, new_args, ctx)
        }
        Expr::Forall(params, body) => {
            let shadowed = shadow(&params, map);
            let nb = substitute(body, &shadowed, ctx)?;
            forall(params, nb, ctx)
        }
        Expr::Exists(params, body) => {
            let shadowed = shadow(&params, map);
            let nb = substitute(body, &shadowed, ctx)?;
            exists(params, nb, ctx)
        }
        Expr::BoolConst(_) | Expr::IntConst(_) | Expr::ObjectRef(_) => Ok(e),
    }
}

/// Rewrites every `FluentApp(f, args)` whose fluent `f` appears in
/// `fluent_map` into `FluentApp(fluent_map[f], prefix_args ++ args)`,
/// recursing through the rest of the expression unchanged. `ParamRef` and
/// `Forall`/`Exists` binders are left untouched (there is no capture concern:
/// `prefix_args` never contains a bound parameter of the body they're spliced
/// into). Generalizes the global/local/waiting mirror-fluent views a
/// robustness-verification compilation needs: mapping to the `g-`/`l-`/`w-`
/// table with an empty or single-agent prefix covers all three.
pub fn remap_fluents(
    e: ExprId,
    fluent_map: &HashMap<FluentId, FluentId>,
    prefix_args: &[ExprId],
    ctx: &mut Context,
) -> Result<ExprId, TypeError> {
    if fluent_map.is_empty() {
        return Ok(e);
    }
    let expr = ctx.expr(e).clone();
    match expr {
        Expr::Not(a) => {
            let na = remap_fluents(a, fluent_map, prefix_args, ctx)?;
            not(na, ctx)
        }
        Expr::And(args) => {
            let new_args = args
                .iter()
                .map(|&a| remap_fluents(a, fluent_map, prefix_args, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            and(new_args, ctx)
        }
        Expr::Or(args) => {
            let new_args = args
                .iter()
                .map(|&a| remap_fluents(a, fluent_map, prefix_args, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            or(new_args, ctx)
        }
        Expr::Iff(a, b) => {
            let na = remap_fluents(a, fluent_map, prefix_args, ctx)?;
            let nb = remap_fluents(b, fluent_map, prefix_args, ctx)?;
            iff(na, nb, ctx)
        }
        Expr::Equals(a, b) => {
            let na = remap_fluents(a, fluent_map, prefix_args, ctx)?;
            let nb = remap_fluents(b, fluent_map, prefix_args, ctx)?;
            equals(na, nb, ctx)
        }
        Expr::Gt(a, b) => {
            let na = remap_fluents(a, fluent_map, prefix_args, ctx)?;
            let nb = remap_fluents(b, fluent_map, prefix_args, ctx)?;
            gt(na, nb, ctx)
        }
        Expr::Plus(args) => {
            let new_args = args
                .iter()
                .map(|&a| remap_fluents(a, fluent_map, prefix_args, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            plus(new_args, ctx)
        }
        Expr::Minus(a, b) => {
            let na = remap_fluents(a, fluent_map, prefix_args, ctx)?;
            let nb = remap_fluents(b, fluent_map, prefix_args, ctx)?;
            minus(na, nb, ctx)
        }
        Expr::Times(args) => {
            let new_args = args
                .iter()
                .map(|&a| remap_fluents(a, fluent_map, prefix_args, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            times(new_args, ctx)
        }
        Expr::FluentApp(f, args) => {
            let new_args: SeqExprId = args
                .iter()
                .map(|&a| remap_fluents(a, fluent_map, prefix_args, ctx))
                .collect::<Result<SeqExprId, _>>()?;
            match fluent_map.get(&f) {
                Some(&mapped) => {
                    let full_args: SeqExprId = prefix_args.iter().copied().chain(new_args.iter().copied()).collect();
                    fluent_app(mapped, full_args, ctx)
                }
                None => fluent_app(f, new_args, ctx),
            }
        }
        Expr::Forall(params, body) => {
            let nb = remap_fluents(body, fluent_map, prefix_args, ctx)?;
            forall(params, nb, ctx)
        }
        Expr::Exists(params, body) => {
            let nb = remap_fluents(body, fluent_map, prefix_args, ctx)?;
            exists(params, nb, ctx)
        }
        Expr::BoolConst(_) | Expr::IntConst(_) | Expr::ObjectRef(_) | Expr::ParamRef(_) => Ok(e),
    }
}

fn shadow(bound: &[Param], map: &HashMap<Sym, ExprId>) -> HashMap<Sym, ExprId> {
    let bound_names: HashSet<&Sym> = bound.iter().map(|p| p.name()).collect();
    map.iter()
        .filter(|(name, _)| !bound_names.contains(name))
        .map(|(name, &id)| (name.clone(), id))
        .collect()
}

/// Visits every node reachable from `e` exactly once, in pre-order; shared
/// sub-expressions (common under interning) are not revisited.
pub fn walk(e: ExprId, ctx: &Context, visited: &mut HashSet<ExprId>, visit: &mut impl FnMut(ExprId, &Context)) {
    if !visited.insert(e) {
        return;
    }
    visit(e, ctx);
    match ctx.expr(e) {
        Expr::Not(a) => walk(*a, ctx, visited, visit),
        Expr::And(args) | Expr::Or(args) | Expr::Plus(args) | Expr::Times(args) => {
            for &a in args {
                walk(a, ctx, visited, visit);
            }
        }
        Expr::Iff(a, b) | Expr::Equals(a, b) | Expr::Gt(a, b) | Expr::Minus(a, b) => {
            walk(*a, ctx, visited, visit);
            walk(*b, ctx, visited, visit);
        }
        Expr::Forall(_, body) | Expr::Exists(_, body) => walk(*body, ctx, visited, visit),
        Expr::FluentApp(_, args) => {
            for &a in args {
                walk(a, ctx, visited, visit);
            }
        }
        Expr::BoolConst(_) | Expr::IntConst(_) | Expr::ObjectRef(_) | Expr::ParamRef(_) => {}
    }
}

/// Renders an expression to a human-readable string; used by `Display` impls
/// elsewhere and by diagnostics, not by any pass that inspects structure.
pub fn display(e: ExprId, ctx: &Context) -> String {
    let mut out = String::new();
    write_expr(e, ctx, &mut out);
    out
}

fn write_expr(e: ExprId, ctx: &Context, out: &mut String) {
    use std::fmt::Write as _;
    match ctx.expr(e) {
        Expr::BoolConst(b) => {
            let _ = write!(out, "{b}");
        }
        Expr::IntConst(i) => {
            let _ = write!(out, "{i}");
        }
        Expr::ObjectRef(o) => {
            let _ = write!(out, "{}", o.name());
        }
        Expr::ParamRef(p) => {
            let _ = write!(out, "?{}", p.name());
        }
        Expr::FluentApp(f, args) => {
            let _ = write!(out, "{}(", ctx.fluents.get(*f).name());
            write_args(args, ctx, out);
            out.push(')');
        }
        Expr::Not(a) => {
            out.push_str("not(");
            write_expr(*a, ctx, out);
            out.push(')');
        }
        Expr::And(args) => write_variadic("and", args, ctx, out),
        Expr::Or(args) => write_variadic("or", args, ctx, out),
        Expr::Plus(args) => write_variadic("+", args, ctx, out),
        Expr::Times(args) => write_variadic("*", args, ctx, out),
        Expr::Iff(a, b) => write_binary("iff", *a, *b, ctx, out),
        Expr::Equals(a, b) => write_binary("=", *a, *b, ctx, out),
        Expr::Gt(a, b) => write_binary(">", *a, *b, ctx, out),
        Expr::Minus(a, b) => write_binary("-", *a, *b, ctx, out),
        Expr::Forall(params, body) => write_quantifier("forall", params, *body, ctx, out),
        Expr::Exists(params, body) => write_quantifier("exists", params, *body, ctx, out),
    }
}

fn write_args(args: &SeqExprId, ctx: &Context, out: &mut String) {
    for (i, &a) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(a, ctx, out);
    }
}

fn write_variadic(op: &str, args: &SeqExprId, ctx: &Context, out: &mut String) {
    out.push_str(op);
    out.push('(');
    write_args(args, ctx, out);
    out.push(')');
}

fn write_binary(op: &str, a: ExprId, b: ExprId, ctx: &Context, out: &mut String) {
    out.push_str(op);
    out.push('(');
    write_expr(a, ctx, out);
    out.push_str(", ");
    write_expr(b, ctx, out);
    out.push(')');
}

fn write_quantifier(kw: &str, params: &[Param], body: ExprId, ctx: &Context, out: &mut String) {
    use std::fmt::Write as _;
    let _ = write!(out, "{kw} ");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "?{}", p.name());
    }
    out.push_str(". ");
    write_expr(body, ctx, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ctx() -> (Context, FluentId) {
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("free", vec![], Type::Bool).unwrap();
        (ctx, f)
    }

    #[test]
    fn not_over_fluent_app_is_nnf() {
        let (mut ctx, f) = make_ctx();
        let app = fluent_app(f, SeqExprId::new(), &mut ctx).unwrap();
        let negated = not(app, &mut ctx).unwrap();
        assert!(is_nnf(negated, &ctx));
    }

    #[test]
    fn not_over_and_is_not_nnf() {
        let (mut ctx, f) = make_ctx();
        let app = fluent_app(f, SeqExprId::new(), &mut ctx).unwrap();
        let conj = and([app, app], &mut ctx).unwrap();
        let negated = not(conj, &mut ctx).unwrap();
        assert!(!is_nnf(negated, &ctx));
    }

    #[test]
    fn to_nnf_pushes_negation_through_and() {
        let (mut ctx, f) = make_ctx();
        let app = fluent_app(f, SeqExprId::new(), &mut ctx).unwrap();
        let conj = and([app, app], &mut ctx).unwrap();
        let negated = not(conj, &mut ctx).unwrap();
        let nnf = to_nnf(negated, &mut ctx).unwrap();
        assert!(is_nnf(nnf, &ctx));
        assert!(matches!(ctx.expr(nnf), Expr::Or(_)));
    }

    #[test]
    fn to_nnf_fails_on_negated_iff() {
        let (mut ctx, f) = make_ctx();
        let app = fluent_app(f, SeqExprId::new(), &mut ctx).unwrap();
        let iff_expr = iff(app, app, &mut ctx).unwrap();
        let negated = not(iff_expr, &mut ctx).unwrap();
        assert!(to_nnf(negated, &mut ctx).is_err());
    }

    #[test]
    fn substitute_replaces_bound_parameter() {
        let (mut ctx, _f) = make_ctx();
        let p = Param::new("x", Type::Bool);
        let p_ref = auto_promote(&p, &mut ctx).unwrap();
        let replacement = TRUE(&mut ctx);
        let mut map = HashMap::new();
        map.insert(p.name().clone(), replacement);
        let result = substitute(p_ref, &map, &mut ctx).unwrap();
        assert_eq!(result, replacement);
    }

    #[test]
    fn walk_visits_shared_children_once() {
        let (mut ctx, f) = make_ctx();
        let app = fluent_app(f, SeqExprId::new(), &mut ctx).unwrap();
        let conj = and([app, app], &mut ctx).unwrap();
        let mut visited = HashSet::new();
        let mut count = 0;
        walk(conj, &ctx, &mut visited, &mut |_, _| count += 1);
        assert_eq!(count, 2); // the conjunction plus the single deduped child
    }
}
