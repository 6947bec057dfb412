use crate::context::ExprId;
use crate::errors::TypeError;
use crate::expressions::Expr;
use crate::timing::TimeInterval;
use crate::{Context, FluentId, Type};

/// An assignment of `value` to the fluent application `fluent_application`,
/// applied unconditionally or only when `condition` holds in the state the
/// effect is evaluated against.
#[derive(Clone, Debug)]
pub struct Effect {
    pub fluent_application: ExprId,
    pub value: ExprId,
    pub condition: Option<ExprId>,
}

impl Effect {
    /// Builds an effect, checking that `fluent_application` is indeed a
    /// fluent application and that `value` is compatible with its declared
    /// return type.
    pub fn new(
        fluent_application: ExprId,
        value: ExprId,
        condition: Option<ExprId>,
        ctx: &Context,
    ) -> Result<Self, TypeError> {
        let target_fluent = match ctx.expr(fluent_application) {
            Expr::FluentApp(f, _) => *f,
            _ => return Err(TypeError::IncompatibleType(fluent_application)),
        };
        let return_type = ctx.fluents.get(target_fluent).return_type.clone();
        if !ctx.type_of(value).is_subtype_of(&return_type) {
            return Err(TypeError::IncompatibleType(value));
        }
        if let Some(c) = condition {
            if !ctx.type_of(c).is_subtype_of(&Type::Bool) {
                return Err(TypeError::IncompatibleType(c));
            }
        }
        Ok(Self {
            fluent_application,
            value,
            condition,
        })
    }

    pub fn unconditional(fluent_application: ExprId, value: ExprId, ctx: &Context) -> Result<Self, TypeError> {
        Self::new(fluent_application, value, None, ctx)
    }

    pub fn fluent(&self, ctx: &Context) -> FluentId {
        match ctx.expr(self.fluent_application) {
            Expr::FluentApp(f, _) => *f,
            _ => unreachable!("Effect::fluent_application is always a FluentApp"),
        }
    }
}

/// A timed effect attached to a durative action: the assignment described by
/// `effect` takes place at `timing`, which for a durative action is
/// `start`, `end`, or `start + delay`/`end - delay`.
#[derive(Clone, Debug)]
pub struct TimedEffect {
    pub timing: crate::timing::Timepoint,
    pub effect: Effect,
}

/// A condition that a durative action requires to hold over `interval`.
#[derive(Clone, Debug)]
pub struct DurativeCondition {
    pub interval: TimeInterval,
    pub condition: ExprId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::{self, TRUE};

    #[test]
    fn effect_requires_a_fluent_application_target() {
        let mut ctx = Context::new();
        let t = TRUE(&mut ctx);
        assert!(Effect::unconditional(t, t, &ctx).is_err());
    }

    #[test]
    fn effect_accepts_matching_value_type() {
        let mut ctx = Context::new();
        let f = ctx.fluents.add_fluent("free", vec![], Type::Bool).unwrap();
        let app = expressions::fluent_app(f, Default::default(), &mut ctx).unwrap();
        let value = TRUE(&mut ctx);
        assert!(Effect::unconditional(app, value, &ctx).is_ok());
    }
}
