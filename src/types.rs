use std::fmt::{Debug, Display};
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::errors::{ProblemDefinitionError, TypeError};
use crate::{IntValue, Sym};

/// Single-parent hierarchy of user types declared by a problem.
///
/// Shared via `Arc` so that a `Type::User` value can be compared and walked
/// without borrowing the owning `Types` registry.
#[derive(Clone)]
pub struct UserTypes {
    top_type: Sym,
    parents: hashbrown::HashMap<Sym, Option<Sym>>,
}

impl Default for UserTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl UserTypes {
    pub fn new() -> Self {
        let top_type: Sym = "object".into();
        let mut parents = hashbrown::HashMap::new();
        parents.insert(top_type.clone(), None);
        Self { top_type, parents }
    }

    pub fn is_subtype_of(&self, a: &Sym, b: &Sym) -> bool {
        if a == b {
            return true;
        }
        match self.parents.get(a) {
            Some(Some(parent)) => self.is_subtype_of(parent, b),
            _ => false,
        }
    }

    pub fn contains(&self, name: &Sym) -> bool {
        self.parents.contains_key(name)
    }

    /// Declares a new user type with an optional parent. The parent, if
    /// given, must already be declared (or be the implicit top type).
    pub fn add_type(&mut self, tpe: impl Into<Sym>, parent: Option<Sym>) -> Result<(), ProblemDefinitionError> {
        let tpe = tpe.into();
        if self.parents.contains_key(&tpe) {
            return Err(ProblemDefinitionError::DuplicateObject(tpe));
        }
        if let Some(parent) = &parent {
            if !self.parents.contains_key(parent) {
                return Err(ProblemDefinitionError::UnknownType(parent.clone()));
            }
        }
        self.parents.insert(tpe, parent.or_else(|| Some(self.top_type.clone())));
        Ok(())
    }
}

/// Registry of user types declared by a problem, plus lookup helpers.
#[derive(Clone)]
pub struct Types {
    user_types: Arc<UserTypes>,
}

impl Types {
    pub fn new(types: UserTypes) -> Self {
        Self {
            user_types: Arc::new(types),
        }
    }

    pub fn top_user_type(&self) -> Type {
        Type::User(self.user_types_top_name(), self.user_types.clone())
    }

    fn user_types_top_name(&self) -> Sym {
        // The top type is always present, inserted by `UserTypes::new`.
        self.user_types
            .parents
            .keys()
            .find(|t| self.user_types.parents.get(*t) == Some(&None))
            .cloned()
            .unwrap_or_else(|| "object".into())
    }

    pub fn get_user_type(&self, name: impl Into<Sym>) -> Result<Type, TypeError> {
        let name = name.into();
        if self.user_types.contains(&name) {
            Ok(Type::User(name, self.user_types.clone()))
        } else {
            Err(TypeError::UnknownType(name))
        }
    }
}

/// Closed interval of possible integer values, used to refine `Type::Int`.
#[derive(Clone, Copy)]
pub struct IntInterval(Option<IntValue>, Option<IntValue>);

impl IntInterval {
    pub const FULL: IntInterval = IntInterval(None, None);

    pub fn singleton(value: IntValue) -> Self {
        Self(Some(value), Some(value))
    }

    pub fn is_subset_of(&self, other: &IntInterval) -> bool {
        other.is_superset_of(self)
    }

    pub fn is_superset_of(&self, other: &IntInterval) -> bool {
        let left_ok = match (self.0, other.0) {
            (None, _) => true,
            (Some(l), Some(r)) => l <= r,
            _ => false,
        };
        let right_ok = match (self.1, other.1) {
            (None, _) => true,
            (Some(l), Some(r)) => l >= r,
            _ => false,
        };
        left_ok && right_ok
    }
}

impl From<RangeInclusive<IntValue>> for IntInterval {
    fn from(value: RangeInclusive<IntValue>) -> Self {
        IntInterval(Some(*value.start()), Some(*value.end()))
    }
}

/// The value-type of a fluent, parameter, or expression: Boolean, a
/// (possibly bounded) integer, or a user type.
#[derive(Clone)]
pub enum Type {
    Bool,
    Int(IntInterval),
    User(Sym, Arc<UserTypes>),
}

impl Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int(_) => write!(f, "int"),
            Type::User(name, _) => write!(f, "{name}"),
        }
    }
}
impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Type {
    pub const INT: Type = Type::Int(IntInterval::FULL);

    pub fn is_subtype_of(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Bool, Type::Bool) => true,
            (Type::Int(bounds1), Type::Int(bounds2)) => bounds1.is_subset_of(bounds2),
            (Type::User(left, types), Type::User(right, _)) => types.is_subtype_of(left, right),
            _ => false,
        }
    }

    pub fn accepts(&self, other: &Type) -> bool {
        other.is_subtype_of(self)
    }

    /// Returns true if two types overlap (one is a subtype of the other).
    pub fn overlaps(&self, other: &Type) -> bool {
        self.is_subtype_of(other) || other.is_subtype_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_parent_hierarchy() {
        let mut ut = UserTypes::new();
        ut.add_type("vehicle", None).unwrap();
        ut.add_type("car", Some("vehicle".into())).unwrap();
        assert!(ut.is_subtype_of(&"car".into(), &"vehicle".into()));
        assert!(!ut.is_subtype_of(&"vehicle".into(), &"car".into()));
        assert!(ut.is_subtype_of(&"car".into(), &"car".into()));
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut ut = UserTypes::new();
        assert!(ut.add_type("car", Some("vehicle".into())).is_err());
    }

    #[test]
    fn int_interval_subset() {
        let narrow: IntInterval = (0..=3).into();
        let wide: IntInterval = (0..=10).into();
        assert!(narrow.is_subset_of(&wide));
        assert!(!wide.is_subset_of(&narrow));
    }
}
