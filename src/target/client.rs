use std::fmt;

use goose::{metrics::GooseRequestMetric, prelude::*};
use http::StatusCode;

use super::{BaseUrl, Call, Endpoint, Reply, Transport, TransportError};
use crate::prelude::*;


/// Absolute URLs of all endpoints below the configured base URL.
///
/// Passing full URLs to goose keeps a path prefix of the base URL intact;
/// relative paths would be resolved against the host only.
#[derive(Debug, Clone)]
pub struct Endpoints {
    register: String,
    login: String,
    bookings: String,
}

impl Endpoints {
    pub fn new(base_url: &BaseUrl) -> Result<Self> {
        let url = |endpoint: Endpoint| base_url.join(endpoint.path())
            .map(|uri| uri.to_string())
            .with_context(|| format!("cannot build URL for {endpoint} below '{base_url}'"));

        Ok(Self {
            register: url(Endpoint::Register)?,
            login: url(Endpoint::Login)?,
            bookings: url(Endpoint::Bookings)?,
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Register => &self.register,
            Endpoint::Login => &self.login,
            Endpoint::Bookings => &self.bookings,
        }
    }
}

/// Sends calls through the HTTP client of one goose user, so that every
/// request shows up in goose's metrics.
pub struct GooseTransport<'a> {
    user: &'a mut GooseUser,
    endpoints: &'a Endpoints,

    /// Metric of the last booking request, so that its outcome can be
    /// corrected once the checks are evaluated.
    booking: Option<GooseRequestMetric>,
}

impl<'a> GooseTransport<'a> {
    pub fn new(user: &'a mut GooseUser, endpoints: &'a Endpoints) -> Self {
        Self { user, endpoints, booking: None }
    }

    /// Gives back the user, together with the metric of the last booking
    /// request, if one was sent.
    pub fn finish(self) -> (&'a mut GooseUser, Option<GooseRequestMetric>) {
        (self.user, self.booking)
    }
}

impl Transport for GooseTransport<'_> {
    async fn send(&mut self, call: Call) -> Result<Reply, TransportError> {
        let mut builder = self.user
            .get_request_builder(&GooseMethod::Post, self.endpoints.url(call.endpoint))
            .map_err(invalid)?
            .header("Content-Type", "application/json")
            .body(call.body);
        if let Some(token) = &call.bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = GooseRequest::builder()
            .set_request_builder(builder)
            .name(call.endpoint.path())
            .build();

        let goose = self.user.request(request).await.map_err(invalid)?;
        if call.endpoint == Endpoint::Bookings {
            self.booking = Some(goose.request);
        }

        let response = goose.response.map_err(|e| {
            if e.is_timeout() { TransportError::Timeout } else { TransportError::Request(e.into()) }
        })?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| TransportError::Request(e.into()))?;
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() { TransportError::Timeout } else { TransportError::Body(e.into()) }
        })?;

        trace!(endpoint = %call.endpoint, status = status.as_u16(), "received response");
        Ok(Reply { status, body })
    }
}

/// Goose refused to even build the request.
fn invalid(e: impl fmt::Display) -> TransportError {
    TransportError::InvalidRequest(e.to_string())
}
