use derive_more::derive::Display;

use crate::errors::ProblemDefinitionError;
use crate::{Param, Sym, Type};

/// Opaque handle to a declared fluent, stable for the lifetime of the
/// `Fluents` registry that produced it.
#[derive(Debug, PartialEq, PartialOrd, Ord, Eq, Clone, Copy, Hash)]
pub struct FluentId(pub(crate) u32);

impl idmap::intid::IntegerId for FluentId {
    idmap::intid::impl_newtype_id_body!(for FluentId(u32));
}

/// A named, typed predicate or function whose value depends on the state.
#[derive(Clone, Debug, Display)]
#[display("{}{:?} -> {}", name, parameters, return_type)]
pub struct Fluent {
    pub name: Sym,
    pub parameters: Vec<Param>,
    pub return_type: Type,
}

impl Fluent {
    pub fn name(&self) -> &Sym {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Insertion-ordered registry of the fluents declared by a problem.
#[derive(Clone, Default)]
pub struct Fluents {
    fluents: idmap::DirectIdMap<FluentId, Fluent>,
    order: Vec<FluentId>,
    by_name: hashbrown::HashMap<Sym, FluentId>,
    next_id: u32,
}

impl Fluents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: FluentId) -> &Fluent {
        self.fluents.get(id).expect("dangling FluentId")
    }

    pub fn get_by_name(&self, name: &str) -> Option<FluentId> {
        self.by_name.get(name).copied()
    }

    pub fn add_fluent(
        &mut self,
        name: impl Into<Sym>,
        parameters: Vec<Param>,
        return_type: Type,
    ) -> Result<FluentId, ProblemDefinitionError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ProblemDefinitionError::DuplicateFluent(name));
        }
        let id = FluentId(self.next_id);
        self.next_id += 1;
        self.by_name.insert(name.clone(), id);
        self.order.push(id);
        self.fluents.insert(
            id,
            Fluent {
                name,
                parameters,
                return_type,
            },
        );
        Ok(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FluentId, &Fluent)> + '_ {
        self.order.iter().map(move |&id| (id, self.get(id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntInterval;

    #[test]
    fn duplicate_name_rejected() {
        let mut fs = Fluents::new();
        fs.add_fluent("at", vec![], Type::Bool).unwrap();
        assert!(fs.add_fluent("at", vec![], Type::Int(IntInterval::FULL)).is_err());
    }

    #[test]
    fn lookup_by_name() {
        let mut fs = Fluents::new();
        let id = fs.add_fluent("free", vec![], Type::Bool).unwrap();
        assert_eq!(fs.get_by_name("free"), Some(id));
        assert_eq!(fs.get_by_name("other"), None);
    }
}
