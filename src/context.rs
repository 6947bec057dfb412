//! The expression interning arena.
//!
//! Every constructor takes an explicit `Context` rather than reaching into
//! thread-local or process-wide state. It owns the type/object/fluent
//! registries plus the expression arena, and performs real structural
//! interning: building the same expression twice (same variant, same
//! already-interned children) returns the same `ExprId`.

use hashbrown::HashMap;
use idmap::DirectIdMap;
use smallvec::SmallVec;

use crate::errors::TypeError;
use crate::{Expr, Fluents, IntValue, Objects, Param, Sym, Type, Types, UserTypes};

#[derive(Debug, PartialEq, PartialOrd, Ord, Eq, Hash, Clone, Copy)]
pub struct ExprId(pub(crate) u32);

impl idmap::intid::IntegerId for ExprId {
    idmap::intid::impl_newtype_id_body!(for ExprId(u32));
}

/// Small vector of expression children; most operators are unary/binary, a
/// handful (`And`, `Or`, `Plus`, `Times`) are variadic.
pub type SeqExprId = SmallVec<[ExprId; 3]>;

#[derive(Clone)]
pub(crate) struct ExprNode {
    pub(crate) expr: Expr,
    pub(crate) tpe: Type,
}

/// Structural key used to deduplicate expressions on intern. Object/param
/// references are keyed by name rather than by their `Object`/`Param`
/// value, since names are unique within a problem.
#[derive(Clone, PartialEq, Eq, Hash)]
enum ExprKey {
    Bool(bool),
    Int(IntValue),
    Object(Sym),
    Param(Sym),
    FluentApp(crate::FluentId, SeqExprId),
    Not(ExprId),
    And(SeqExprId),
    Or(SeqExprId),
    Iff(ExprId, ExprId),
    Equals(ExprId, ExprId),
    Gt(ExprId, ExprId),
    Plus(SeqExprId),
    Minus(ExprId, ExprId),
    Times(SeqExprId),
    Forall(Vec<Sym>, ExprId),
    Exists(Vec<Sym>, ExprId),
}

fn key_of(e: &Expr) -> ExprKey {
    match e {
        Expr::BoolConst(b) => ExprKey::Bool(*b),
        Expr::IntConst(i) => ExprKey::Int(*i),
        Expr::ObjectRef(o) => ExprKey::Object(o.name().clone()),
        Expr::ParamRef(p) => ExprKey::Param(p.name().clone()),
        Expr::FluentApp(f, args) => ExprKey::FluentApp(*f, args.clone()),
        Expr::Not(a) => ExprKey::Not(*a),
        Expr::And(args) => ExprKey::And(args.clone()),
        Expr::Or(args) => ExprKey::Or(args.clone()),
        Expr::Iff(a, b) => ExprKey::Iff(*a, *b),
        Expr::Equals(a, b) => ExprKey::Equals(*a, *b),
        Expr::Gt(a, b) => ExprKey::Gt(*a, *b),
        Expr::Plus(args) => ExprKey::Plus(args.clone()),
        Expr::Minus(a, b) => ExprKey::Minus(*a, *b),
        Expr::Times(args) => ExprKey::Times(args.clone()),
        Expr::Forall(params, body) => ExprKey::Forall(params.iter().map(|p| p.name().clone()).collect(), *body),
        Expr::Exists(params, body) => ExprKey::Exists(params.iter().map(|p| p.name().clone()).collect(), *body),
    }
}

#[derive(Clone)]
pub struct Context {
    pub types: Types,
    pub objects: Objects,
    pub fluents: Fluents,
    exprs: DirectIdMap<ExprId, ExprNode>,
    interned: HashMap<ExprKey, ExprId>,
    next_expr_id: u32,
}

impl Context {
    pub fn new() -> Self {
        Self {
            types: Types::new(UserTypes::new()),
            objects: Objects::new(),
            fluents: Fluents::new(),
            exprs: Default::default(),
            interned: Default::default(),
            next_expr_id: 0,
        }
    }

    pub(crate) fn node(&self, id: ExprId) -> &ExprNode {
        self.exprs.get(id).expect("dangling ExprId")
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.node(id).expr
    }

    pub fn type_of(&self, id: ExprId) -> &Type {
        &self.node(id).tpe
    }

    /// Interns `expr`, returning the existing id if an identical expression
    /// (same variant, same already-interned children) was interned before.
    pub fn intern(&mut self, expr: Expr) -> Result<ExprId, TypeError> {
        let key = key_of(&expr);
        if let Some(&id) = self.interned.get(&key) {
            return Ok(id);
        }
        let tpe = expr.tpe(self)?;
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        self.interned.insert(key, id);
        let prev = self.exprs.insert(id, ExprNode { expr, tpe });
        debug_assert!(prev.is_none());
        Ok(id)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::TRUE;

    #[test]
    fn structural_interning_dedups() {
        let mut ctx = Context::new();
        let a = ctx.intern(Expr::BoolConst(true)).unwrap();
        let b = ctx.intern(Expr::BoolConst(true)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_values_get_distinct_ids() {
        let mut ctx = Context::new();
        let t = ctx.intern(Expr::BoolConst(true)).unwrap();
        let f = ctx.intern(Expr::BoolConst(false)).unwrap();
        assert_ne!(t, f);
        assert_eq!(TRUE(&mut ctx), t);
    }
}
