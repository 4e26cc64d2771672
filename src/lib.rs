//! Priority-ordered, token-bucket load balancer core.
//!
//! For each inbound request, a [`Balancer`] picks one of its
//! registered backends by combining three signals: a static per-backend
//! priority (poll order), a per-backend token bucket (instantaneous
//! admission control), and a dynamic up/down health state. Balancers
//! implement [`Handler`], so a balancer can be registered as a backend
//! of another balancer; aggregate-health changes cascade up such trees
//! through status-updater callbacks.

pub mod balancer;
pub mod clock;
pub mod error;
pub mod handler;
pub mod health;

pub use balancer::{BackendLimits, Balancer, StickyCookie};
pub use clock::{Clock, SystemClock};
pub use error::BalancerError;
pub use handler::{Handler, HandlerFn};
pub use health::StatusUpdater;
