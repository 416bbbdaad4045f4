//! Runs the workload as a goose attack whose test plan follows the
//! configured stages.

use std::sync::Arc;

use goose::{config::GooseConfiguration, metrics::GooseMetrics, prelude::*};

use crate::{
    prelude::*,
    target::{Endpoints, GooseTransport, TargetConfig},
    workload::{Checks, Outcome, Workload},
};

mod config;

pub use self::config::{RampConfig, Stage};


/// Iteration counter of one goose user, kept in its session data.
struct Iterations(u64);

/// Runs the whole schedule and returns goose's metrics once the last stage is
/// over. Ctrl+C stops the run early and is handled by goose.
pub async fn run(
    workload: Arc<Workload>,
    target: &TargetConfig,
    ramp: &RampConfig,
) -> Result<GooseMetrics> {
    let endpoints = Arc::new(Endpoints::new(&target.base_url)?);
    let transaction: TransactionFunction = Arc::new(move |user| {
        let workload = Arc::clone(&workload);
        let endpoints = Arc::clone(&endpoints);
        Box::pin(async move { iteration(&workload, &endpoints, user).await })
    });

    let test_plan = ramp.test_plan();
    info!(%test_plan, "Starting goose attack against {}", target.base_url);

    let metrics = GooseAttack::initialize_with_config(GooseConfiguration::default())?
        .register_scenario(scenario!("Booking")
            .register_transaction(Transaction::new(transaction).set_name("iteration"))
        )
        .set_default(GooseDefault::Host, target.base_url.as_str())?
        .set_default(GooseDefault::TestPlan, test_plan.as_str())?
        .set_default(GooseDefault::Timeout, target.timeout.as_secs_f64().to_string().as_str())?
        .set_default(GooseDefault::NoStatusCodes, false)?
        .set_default(GooseDefault::NoTelnet, true)?
        .set_default(GooseDefault::NoWebSocket, true)?
        .execute()
        .await
        .context("goose attack failed")?;

    Ok(metrics)
}

/// One goose transaction: a single workload iteration. The outcome of the
/// booking request in goose's metrics is replaced by the integrity check.
async fn iteration(
    workload: &Workload,
    endpoints: &Endpoints,
    user: &mut GooseUser,
) -> TransactionResult {
    let vu = user.weighted_users_index as u64 + 1;
    let iteration = next_iteration(user);

    let mut transport = GooseTransport::new(user, endpoints);
    let outcome = workload.iteration(&mut transport, vu, iteration).await;
    let (user, booking) = transport.finish();

    match (outcome, booking) {
        (Outcome::Attempted(attempt), Some(mut metric)) => {
            if attempt.checks.system_integrity {
                user.set_success(&mut metric)
            } else {
                user.set_failure(Checks::SYSTEM_INTEGRITY, &mut metric, None, None)
            }
        }
        _ => Ok(()),
    }
}

/// Returns the index of the iteration `user` is about to run, starting at 0.
fn next_iteration(user: &mut GooseUser) -> u64 {
    if let Some(Iterations(n)) = user.get_session_data_mut::<Iterations>() {
        *n += 1;
        return *n;
    }

    user.set_session_data(Iterations(0));
    0
}
