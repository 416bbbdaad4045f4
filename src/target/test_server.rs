//! A tiny booking service on a local port, used in tests that go over real
//! HTTP.

use std::{
    collections::HashSet,
    convert::Infallible,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use http::{Request, Response, StatusCode, header};
use http_body_util::{BodyExt as _, Full};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;


/// What the server saw of a single request.
#[derive(Debug, Clone)]
pub(crate) struct Seen {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) content_type: Option<String>,
    pub(crate) authorization: Option<String>,
    pub(crate) body: Bytes,
}

#[derive(Default)]
struct State {
    seen: Mutex<Vec<Seen>>,
    booking_delay: Duration,
    booked_seats: Mutex<HashSet<u64>>,
    bookings_in_flight: AtomicUsize,
    max_bookings_in_flight: AtomicUsize,
}

/// Accepts any registration, logs everyone in with the token `server-token`
/// and lets exactly one booking per seat succeed. Paths are matched by their
/// last segment, so any prefix works.
pub(crate) struct TestServer {
    addr: SocketAddr,
    state: Arc<State>,
}

impl TestServer {
    pub(crate) async fn start() -> Self {
        Self::with_booking_delay(Duration::ZERO).await
    }

    /// Like `start`, but every booking takes `delay` to be answered.
    pub(crate) async fn with_booking_delay(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State { booking_delay: delay, ..State::default() });

        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                let state = Arc::clone(&shared);
                let service = service_fn(move |req| handle(Arc::clone(&state), req));
                tokio::spawn(http1::Builder::new().serve_connection(TokioIo::new(stream), service));
            }
        });

        Self { addr, state }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.state.seen.lock().unwrap().clone()
    }

    /// Highest number of booking requests that were being processed at the
    /// same time.
    pub(crate) fn max_bookings_in_flight(&self) -> usize {
        self.state.max_bookings_in_flight.load(Ordering::SeqCst)
    }
}

async fn handle(
    state: Arc<State>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let mut seen = {
        let get = |name: header::HeaderName| req.headers().get(name)
            .map(|v| v.to_str().unwrap().to_owned());
        Seen {
            method: req.method().to_string(),
            path: req.uri().path().to_owned(),
            content_type: get(header::CONTENT_TYPE),
            authorization: get(header::AUTHORIZATION),
            body: Bytes::new(),
        }
    };
    seen.body = req.into_body().collect().await.unwrap().to_bytes();
    state.seen.lock().unwrap().push(seen.clone());

    let (status, body) = match seen.path.rsplit('/').next() {
        Some("register") => (StatusCode::CREATED, "{}"),
        Some("login") => (StatusCode::OK, r#"{"token":"server-token"}"#),
        Some("bookings") => book(&state, &seen.body).await,
        _ => (StatusCode::NOT_FOUND, ""),
    };

    let response = Response::builder()
        .status(status)
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap();
    Ok(response)
}

async fn book(state: &State, body: &[u8]) -> (StatusCode, &'static str) {
    let in_flight = state.bookings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_bookings_in_flight.fetch_max(in_flight, Ordering::SeqCst);
    tokio::time::sleep(state.booking_delay).await;
    state.bookings_in_flight.fetch_sub(1, Ordering::SeqCst);

    let body: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();
    let Some(seat) = body["seat_id"].as_u64() else {
        return (StatusCode::BAD_REQUEST, "");
    };
    if state.booked_seats.lock().unwrap().insert(seat) {
        (StatusCode::CREATED, "{}")
    } else {
        (StatusCode::CONFLICT, r#"{"error":"seat already booked"}"#)
    }
}
