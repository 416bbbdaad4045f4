//! In-memory stand-in for the booking service, used in tests.

use std::{collections::HashSet, sync::Mutex};

use bytes::Bytes;
use http::StatusCode;

use super::{Call, Endpoint, Reply, Transport, TransportError};


/// Canned answer for an endpoint.
#[derive(Debug, Clone)]
pub(crate) enum Canned {
    Reply(StatusCode, &'static str),
    Timeout,
}

/// Records every call and answers like a booking service that lets exactly
/// one booking per seat succeed, unless told otherwise.
pub(crate) struct MockTarget {
    register: Canned,
    login: Canned,
    bookings: Option<Canned>,
    booked_seats: Mutex<HashSet<u64>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTarget {
    pub(crate) fn new() -> Self {
        Self {
            register: Canned::Reply(StatusCode::CREATED, "{}"),
            login: Canned::Reply(StatusCode::OK, r#"{"token":"mock-token"}"#),
            bookings: None,
            booked_seats: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(self, answer: Canned) -> Self {
        Self { register: answer, ..self }
    }

    pub(crate) fn login(self, answer: Canned) -> Self {
        Self { login: answer, ..self }
    }

    /// Answers all booking attempts with `answer` instead of tracking seats.
    pub(crate) fn bookings(self, answer: Canned) -> Self {
        Self { bookings: Some(answer), ..self }
    }

    pub(crate) fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls.lock().unwrap().iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub(crate) fn booked_seats(&self) -> usize {
        self.booked_seats.lock().unwrap().len()
    }

    fn book(&self, body: &[u8]) -> Reply {
        let body: serde_json::Value = serde_json::from_slice(body).unwrap();
        let Some(seat) = body["seat_id"].as_u64() else {
            return reply(StatusCode::BAD_REQUEST, "");
        };

        if self.booked_seats.lock().unwrap().insert(seat) {
            reply(StatusCode::CREATED, "{}")
        } else {
            reply(StatusCode::CONFLICT, r#"{"error":"seat already booked"}"#)
        }
    }
}

fn reply(status: StatusCode, body: &'static str) -> Reply {
    Reply { status, body: Bytes::from_static(body.as_bytes()) }
}

fn answer(canned: &Canned) -> Result<Reply, TransportError> {
    match canned {
        Canned::Reply(status, body) => Ok(reply(*status, body)),
        Canned::Timeout => Err(TransportError::Timeout),
    }
}

/// Any number of virtual users can share one `MockTarget` through a
/// reference.
impl Transport for &MockTarget {
    async fn send(&mut self, call: Call) -> Result<Reply, TransportError> {
        self.calls.lock().unwrap().push(call.clone());

        // Give other tasks a chance to run, so that concurrent iterations
        // actually interleave.
        tokio::task::yield_now().await;

        match call.endpoint {
            Endpoint::Register => answer(&self.register),
            Endpoint::Login => answer(&self.login),
            Endpoint::Bookings => match &self.bookings {
                Some(canned) => answer(canned),
                None => Ok(self.book(&call.body)),
            },
        }
    }
}
