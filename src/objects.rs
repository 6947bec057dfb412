use derive_more::derive::Display;

use crate::errors::ProblemDefinitionError;
use crate::{Sym, Type};

/// A named constant of a declared user type.
#[derive(Clone, Display, Debug)]
#[display("{}", name)]
pub struct Object {
    name: Sym,
    tpe: Type,
}

impl Object {
    /// `tpe` must be a `Type::User`; objects of `Bool`/`Int` type do not exist
    /// in this model.
    pub fn new(name: impl Into<Sym>, tpe: Type) -> Self {
        Self { name: name.into(), tpe }
    }

    pub fn name(&self) -> &Sym {
        &self.name
    }

    pub fn tpe(&self) -> &Type {
        &self.tpe
    }
}

/// Insertion-ordered registry of the objects declared by a problem.
///
/// Ordering is preserved so that grounding and writer output are
/// deterministic given identical inputs.
#[derive(Clone, Default)]
pub struct Objects {
    by_name: hashbrown::HashMap<Sym, usize>,
    objects: Vec<Object>,
}

impl Objects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, name: impl Into<Sym>, tpe: Type) -> Result<(), ProblemDefinitionError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ProblemDefinitionError::DuplicateObject(name));
        }
        self.by_name.insert(name.clone(), self.objects.len());
        self.objects.push(Object::new(name, tpe));
        Ok(())
    }

    pub fn get(&self, name: impl Into<Sym>) -> Result<&Object, ProblemDefinitionError> {
        let name = name.into();
        match self.by_name.get(&name) {
            Some(&idx) => Ok(&self.objects[idx]),
            None => Err(ProblemDefinitionError::UnknownObject(name)),
        }
    }

    pub fn contains(&self, name: &Sym) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> + '_ {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects whose declared type is `tpe` or a subtype of it.
    pub fn of_type<'a>(&'a self, tpe: &'a Type) -> impl Iterator<Item = &'a Object> + 'a {
        self.objects.iter().filter(move |o| o.tpe().is_subtype_of(tpe))
    }
}

impl std::fmt::Display for Objects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Objects:")?;
        for o in self.iter() {
            writeln!(f, "  {}: {}", o.name, o.tpe)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserTypes;

    fn car_type() -> Type {
        Type::User("car".into(), std::sync::Arc::new(UserTypes::new()))
    }

    #[test]
    fn duplicate_object_rejected() {
        let mut objs = Objects::new();
        objs.add_object("c1", car_type()).unwrap();
        assert!(objs.add_object("c1", car_type()).is_err());
    }

    #[test]
    fn lookup_roundtrips() {
        let mut objs = Objects::new();
        objs.add_object("c1", car_type()).unwrap();
        assert_eq!(objs.get("c1").unwrap().name().as_str(), "c1");
        assert!(objs.get("missing").is_err());
    }
}
