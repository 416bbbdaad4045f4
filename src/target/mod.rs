//! The system under test, as seen from the load generator: its endpoints
//! and the transport used to talk to it.

use std::{fmt, future::Future};

use bytes::Bytes;
use http::StatusCode;

mod client;
mod config;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
pub(crate) mod test_server;

pub use self::{
    client::{Endpoints, GooseTransport},
    config::{BaseUrl, TargetConfig},
};


/// The endpoints of the booking service that are exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Register,
    Login,
    Bookings,
}

impl Endpoint {
    pub const ALL: [Self; 3] = [Self::Register, Self::Login, Self::Bookings];

    pub fn path(self) -> &'static str {
        match self {
            Self::Register => "/register",
            Self::Login => "/login",
            Self::Bookings => "/bookings",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A single `POST` with JSON body to one of the endpoints.
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: Endpoint,
    pub body: Bytes,

    /// If set, sent as `Authorization: Bearer <token>`. An empty string still
    /// results in the header being sent.
    pub bearer: Option<String>,
}

impl Call {
    pub fn json<T: serde::Serialize + ?Sized>(
        endpoint: Endpoint,
        body: &T,
    ) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(body)
            .map_err(|e| TransportError::InvalidRequest(format!("unserializable body: {e}")))?;
        Ok(Self { endpoint, body: body.into(), bearer: None })
    }

    pub fn with_bearer(self, token: impl Into<String>) -> Self {
        Self { bearer: Some(token.into()), ..self }
    }
}

/// Response to a `Call`.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reasons a `Call` did not produce a `Reply`.
#[derive(Debug)]
pub enum TransportError {
    /// No complete response within `target.timeout`.
    Timeout,

    /// The request could not be built, e.g. because the token contains
    /// characters not allowed in headers. Nothing was sent.
    InvalidRequest(String),

    /// Connecting, sending or receiving the response head failed.
    Request(BoxError),

    /// Reading the response body failed.
    Body(BoxError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Body(e) => write!(f, "failed to read response body: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout | Self::InvalidRequest(_) => None,
            Self::Request(e) | Self::Body(e) => Some(&**e),
        }
    }
}

/// Something that can deliver `Call`s to the system under test. Each virtual
/// user drives its own transport, one call at a time.
pub trait Transport: Send {
    fn send(&mut self, call: Call) -> impl Future<Output = Result<Reply, TransportError>> + Send;
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{Call, Endpoint, TransportError};


    #[test]
    fn json_call() {
        let call = Call::json(Endpoint::Login, &serde_json::json!({ "a": 1 })).unwrap();
        assert_eq!(call.endpoint, Endpoint::Login);
        assert_eq!(call.body, r#"{"a":1}"#);
        assert_eq!(call.bearer, None);
        assert_eq!(call.with_bearer("t").bearer.as_deref(), Some("t"));
    }

    #[test]
    fn unserializable_body_is_invalid_request() {
        // JSON object keys have to be strings.
        let body = HashMap::from([((1u8, 2u8), 3u8)]);
        let res = Call::json(Endpoint::Bookings, &body);
        assert!(matches!(res, Err(TransportError::InvalidRequest(_))));
    }
}
