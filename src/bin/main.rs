use clap::Parser;

use slrob::errors::Res;
use slrob::expressions::{self, fluent_app, TRUE};
use slrob::orchestrator::SocialLaw;
use slrob::planner::{BoundedBfsPlanner, PlannerConfig};
use slrob::{Action, Agent, AgentBinding, Context, Effect, InstantaneousAction, Object, Problem, Type, UserTypes};

/// Checks whether a toy two-car bridge-crossing social law is robust:
/// nothing coordinates the two agents' access to the shared bridge, so the
/// expected answer is "no".
#[derive(Debug, Parser)]
#[command(name = "slrob-demo", rename_all = "kebab-case")]
struct Args {
    /// Upper bound on the number of states the reference planner explores.
    #[arg(long, default_value_t = 10_000)]
    step_bound: usize,
}

fn main() -> Res<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let problem = bridge_crossing_problem()?;
    let law = SocialLaw::new(problem);
    let config = PlannerConfig {
        step_bound: args.step_bound,
        ..PlannerConfig::default()
    };
    let status = law.verify(&BoundedBfsPlanner, config)?;
    println!("robustness status: {status:?}");
    Ok(())
}

fn bridge_crossing_problem() -> Result<Problem, slrob::errors::TypeError> {
    let ut = std::sync::Arc::new(UserTypes::new());
    let car_type = Type::User("car".into(), ut);
    let mut ctx = Context::new();
    let bridge_free = ctx.fluents.add_fluent("bridge_free", vec![], Type::Bool)?;
    let bridge_free_app = fluent_app(bridge_free, Default::default(), &mut ctx)?;

    let mut problem = Problem::new("bridge-crossing", ctx);
    let car1 = Object::new("car1", car_type.clone());
    let car2 = Object::new("car2", car_type.clone());
    problem.agents.add(Agent::Fresh(car1.clone(), Vec::new()));
    problem.agents.add(Agent::Fresh(car2.clone(), Vec::new()));

    for car in [&car1, &car2] {
        let mut cross = InstantaneousAction::new(format!("cross_{}", car.name()), vec![], AgentBinding::Fixed(car.clone()));
        cross.preconditions.push(bridge_free_app);
        let false_expr = expressions::FALSE(&mut problem.context);
        cross.effects.push(Effect::unconditional(bridge_free_app, false_expr, &problem.context)?);
        problem.actions.add(Action::Instantaneous(cross)).expect("action names are distinct");
    }

    let true_expr = expressions::TRUE(&mut problem.context);
    problem.init.push(Effect::unconditional(bridge_free_app, true_expr, &problem.context)?);
    let goal = TRUE(&mut problem.context);
    problem.goals.push(goal);

    Ok(problem)
}
