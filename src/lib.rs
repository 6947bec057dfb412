mod actions;
mod agents;
pub mod context;
mod effects;
pub mod errors;
pub mod expressions;
mod fluents;
mod model;
mod objects;
mod params;
pub mod planner;
mod sym;
mod timing;
pub mod transform;
mod types;
pub(crate) mod utils;

pub use actions::*;
pub use agents::*;
pub use context::{Context, ExprId, SeqExprId};
pub use effects::*;
pub use expressions::{Expr, IntValue};
pub use fluents::*;
pub use model::*;
pub use objects::*;
pub use params::*;
pub use sym::*;
pub use timing::*;
pub use types::*;

pub use errors::Res;

pub mod orchestrator;
