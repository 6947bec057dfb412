//! Problem-to-problem compilers. Each transformer consumes a `Problem` and
//! produces a new one plus an `ActionMap` recording which new actions came
//! from which original action, so that a plan found in the compiled problem
//! can be read back in terms of the original.

pub mod negative_conditions_remover;
pub mod robustness;
pub mod single_agent_projection;

use hashbrown::HashMap;

use crate::errors::CoreError;
use crate::{Problem, Sym};

/// Bidirectional map between an original action's name and the name(s) of
/// the action(s) it was compiled into. A single original action may be
/// split into several (e.g. the `_s`/`_f_i`/`_w_i` family produced by
/// robustness-verification compilation), so the forward direction is
/// one-to-many; the reverse direction is always one-to-one since every
/// compiled action descends from exactly one original.
#[derive(Default, Clone, Debug)]
pub struct ActionMap {
    forward: HashMap<Sym, Vec<Sym>>,
    backward: HashMap<Sym, Sym>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, old: Sym, new: Sym) {
        self.forward.entry(old.clone()).or_default().push(new.clone());
        self.backward.insert(new, old);
    }

    pub fn new_actions_for(&self, old: &Sym) -> &[Sym] {
        self.forward.get(old).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn original_action_of(&self, new: &Sym) -> Option<&Sym> {
        self.backward.get(new)
    }
}

/// The output of running a transformer: the compiled problem plus the
/// action correspondence needed to interpret plans found in it.
pub struct TransformResult {
    pub problem: Problem,
    pub action_map: ActionMap,
}

/// A problem-to-problem compiler. Implementations are expected to be pure
/// functions of their input: calling `transform` twice on the same problem
/// produces equal results, and no transformer mutates the problem it is
/// given.
pub trait Transformer {
    /// A short, human-readable name used in logging and error messages.
    fn name(&self) -> &'static str;

    fn transform(&self, problem: &Problem) -> Result<TransformResult, CoreError>;
}
