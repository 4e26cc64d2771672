//! Shared utilities for balancer integration tests.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use bucket_balancer::{Balancer, Clock, Handler, HandlerFn};

/// Install a subscriber so `RUST_LOG=debug cargo test` shows the
/// per-candidate admission and propagation decisions.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic clock advanced manually by tests.
#[derive(Clone)]
pub struct MockClock {
    start: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().expect("clock mutex poisoned") += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().expect("clock mutex poisoned")
    }
}

/// Backend answering 200 with its name in a `server` response header.
pub fn named_backend(name: &'static str) -> Arc<dyn Handler> {
    Arc::new(HandlerFn::new(move |_req: Request<Body>| async move {
        Response::builder()
            .status(StatusCode::OK)
            .header("server", name)
            .body(Body::empty())
            .expect("static response")
    }))
}

pub fn request() -> Request<Body> {
    Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("static request")
}

/// Dispatch one request, returning the status and the name of the
/// backend that served it (from the `server` header).
pub async fn dispatch_once<C: Clock>(balancer: &Balancer<C>) -> (StatusCode, Option<String>) {
    let response = balancer.dispatch(request()).await;
    let server = response
        .headers()
        .get("server")
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    (response.status(), server)
}
