//! The body of a single iteration: register, log in, try to book a seat.

use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;

use crate::{
    prelude::*,
    report::Stats,
    target::{Call, Endpoint, Reply, Transport},
};
use self::api::{BookingRequest, Credentials, LoginResponse};

mod api;
mod checks;
mod config;
mod identity;

pub use self::{checks::Checks, config::WorkloadConfig, identity::Identity};


/// What happened in one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Login did not answer 200 (`None`: no answer at all), so no booking was
    /// attempted.
    LoginRejected { status: Option<StatusCode> },

    /// A booking was attempted.
    Attempted(Attempt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub seat_id: u32,
    pub status: Option<StatusCode>,
    pub checks: Checks,
}

/// Everything an iteration needs apart from the transport. Shared by all
/// virtual users.
pub struct Workload {
    config: WorkloadConfig,
    stats: Arc<Stats>,
}

impl Workload {
    pub fn new(config: WorkloadConfig, stats: Arc<Stats>) -> Self {
        Self { config, stats }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Runs one iteration for virtual user `vu` over `transport`, including
    /// the pacing sleep at the end. Nothing in here fails: every problem is
    /// recorded in the stats and shows up in the returned outcome.
    pub async fn iteration<T: Transport>(
        &self,
        transport: &mut T,
        vu: u64,
        iteration: u64,
    ) -> Outcome {
        self.stats.iteration_started();

        let identity = Identity::now(vu, iteration);
        let email = identity.email(&self.config.email_domain);
        let credentials = Credentials { email: &email, password: &self.config.password };

        // Registration failures are deliberately ignored: accounts might
        // exist already, the run goes on either way.
        self.post(transport, Endpoint::Register, &credentials, None).await;

        let login = self.post(transport, Endpoint::Login, &credentials, None).await;
        let token = match login {
            Some(reply) if reply.status == StatusCode::OK => LoginResponse::token_from(&reply.body),
            other => {
                let status = other.map(|r| r.status);
                debug!(vu, iteration, ?status, "login failed -> skipping booking");
                self.stats.booking_skipped();
                self.stats.iteration_completed();
                return Outcome::LoginRejected { status };
            }
        };
        if token.is_none() {
            trace!(vu, iteration, "no token in login response, booking without one");
        }

        let seat_id = self.config.draw_seat(&mut rand::rng());
        let booking = BookingRequest { seat_id };
        let bearer = Some(token.unwrap_or_default());
        let status = self.post(transport, Endpoint::Bookings, &booking, bearer).await
            .map(|r| r.status);

        let checks = Checks::evaluate(status);
        self.stats.checks(checks);
        if !checks.system_integrity {
            debug!(vu, iteration, seat_id, ?status, "integrity check failed for booking");
        }

        let pacing = self.config.draw_pacing(&mut rand::rng());
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        self.stats.iteration_completed();
        Outcome::Attempted(Attempt { seat_id, status, checks })
    }

    /// Sends `body` to `endpoint` and records the response. Transport errors
    /// are logged and turned into `None`.
    async fn post<T: Transport>(
        &self,
        transport: &mut T,
        endpoint: Endpoint,
        body: &(impl Serialize + Sync),
        bearer: Option<String>,
    ) -> Option<Reply> {
        let result = match Call::json(endpoint, body) {
            Ok(call) => match bearer {
                Some(token) => transport.send(call.with_bearer(token)).await,
                None => transport.send(call).await,
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => {
                trace!(%endpoint, status = reply.status.as_u16(), "response");
                self.stats.response(endpoint, Some(reply.status));
                Some(reply)
            }
            Err(e) => {
                debug!(%endpoint, "request failed: {e}");
                self.stats.response(endpoint, None);
                None
            }
        }
    }
}
