//! Error kinds surfaced by the core, as tagged variants with no recovery
//! attempted inside any pass: a transformer either produces a complete,
//! well-typed problem or fails fast.

use thiserror::Error;

use crate::{ExprId, Sym};

/// An expression's inferred type mismatches the context it is used in.
#[derive(Error, Debug, Clone)]
pub enum TypeError {
    #[error("unknown type `{0}`")]
    UnknownType(Sym),
    #[error("expression has an incompatible type, expected a subtype of the declared one")]
    IncompatibleType(ExprId),
    #[error("missing argument for parameter `{0}`")]
    MissingParameter(Sym),
    #[error("unexpected extra argument")]
    UnexpectedArgument(ExprId),
}

/// An expression is not in NNF where NNF was required, or a quantifier body
/// is malformed.
#[derive(Error, Debug, Clone)]
pub enum ExpressionDefinitionError {
    #[error("expression `{0}` is not in NNF")]
    NotInNnf(String),
    #[error("malformed quantifier body: {0}")]
    MalformedQuantifier(String),
}

/// The problem itself is inconsistent: duplicate declarations, dangling
/// references, or a multi-agent invariant that does not hold.
#[derive(Error, Debug, Clone)]
pub enum ProblemDefinitionError {
    #[error("duplicate fluent declaration: `{0}`")]
    DuplicateFluent(Sym),
    #[error("duplicate object declaration: `{0}`")]
    DuplicateObject(Sym),
    #[error("duplicate action declaration: `{0}`")]
    DuplicateAction(Sym),
    #[error("unknown fluent `{0}`")]
    UnknownFluent(Sym),
    #[error("unknown object `{0}`")]
    UnknownObject(Sym),
    #[error("unknown type `{0}`")]
    UnknownType(Sym),
    #[error("action `{0}` has no agent binding")]
    MissingAgentBinding(Sym),
    #[error("goal references undeclared fluent `{0}`")]
    UndeclaredFluentInGoal(Sym),
    #[error("agents are bound to objects of more than one type: `{0}` and `{1}`")]
    HeterogeneousAgentTypes(Sym, Sym),
}

/// A pass reached a feature it is not configured to handle: a durative
/// action in a classical-only compiler stage, a quantifier, or a numeric
/// effect in a classical-only variant.
#[derive(Error, Debug, Clone)]
pub enum UnsupportedFeatureError {
    #[error("durative actions are not supported by `{0}`")]
    DurativeActionsUnsupported(&'static str),
    #[error("quantifiers are not supported by `{0}`")]
    QuantifiersUnsupported(&'static str),
    #[error("numeric effects are not supported by `{0}`")]
    NumericEffectsUnsupported(&'static str),
}

/// The external planner process returned `ERROR` or could not be invoked.
#[derive(Error, Debug, Clone)]
pub enum PlannerError {
    #[error("planner process failed: {0}")]
    ProcessFailed(String),
    #[error("planner reported an internal error: {0}")]
    Reported(String),
}

/// Aggregate error type returned by every fallible operation in the core.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    ExpressionDefinition(#[from] ExpressionDefinitionError),
    #[error(transparent)]
    ProblemDefinition(#[from] ProblemDefinitionError),
    #[error(transparent)]
    UnsupportedFeature(#[from] UnsupportedFeatureError),
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

pub type Res<T> = Result<T, CoreError>;
