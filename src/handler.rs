//! Request-handling capability.
//!
//! A balancer only needs one thing from a backend once it has been
//! selected: the ability to serve a request. Backends are therefore
//! registered as `Arc<dyn Handler>` — a concrete upstream client, a
//! test stub, or another `Balancer` (which implements [`Handler`]
//! itself, so balancers compose into trees).

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use std::future::Future;

/// An opaque request-handling capability.
///
/// Response production belongs entirely to the implementation; the
/// balancer forwards the request and returns whatever comes back.
pub trait Handler: Send + Sync {
    fn call(&self, req: Request<Body>) -> BoxFuture<'_, Response<Body>>;
}

/// Adapter turning an async closure into a [`Handler`].
pub struct HandlerFn<F>(F);

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync,
    Fut: Future<Output = Response<Body>> + Send + 'static,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'_, Response<Body>> {
        Box::pin((self.0)(req))
    }
}
