//! JSON bodies exchanged with the booking service.

use serde::{Deserialize, Serialize};


/// Body of `/register` and `/login`.
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a `200` login response. Everything except `token` is ignored.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

impl LoginResponse {
    /// Extracts the token from a raw login response body. Invalid JSON, a
    /// missing field or a non-string value all result in `None`.
    pub fn token_from(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<Self>(body).ok()?.token
    }
}

/// Body of `/bookings`.
#[derive(Debug, Serialize)]
pub struct BookingRequest {
    pub seat_id: u32,
}
