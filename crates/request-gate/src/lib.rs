//! Request gating: asynchronously-satisfied preconditions that hold
//! requests back until an external condition becomes true.
//!
//! A [`Gate`] supplies two operations: a fast synchronous predicate and an
//! asynchronous satisfaction routine. The [`GateRunner`] owns everything
//! else: the waiter queue, the idle/executing transition, and the finish
//! step that releases (or fails) every queued waiter when a satisfaction
//! attempt resolves.

pub mod runner;

pub use runner::{GateRunner, SharedRequest, Waiter};

use async_trait::async_trait;

use courier_core_types::CourierError;
use courier_request::RequestDescriptor;

/// An asynchronous precondition for gated requests.
///
/// Implementations are long-lived and shared across many requests; the
/// runner serializes all bookkeeping, so neither method needs its own
/// locking for the runner's sake.
#[async_trait]
pub trait Gate: Send + Sync {
    /// Decides whether `request` may proceed without waiting.
    ///
    /// Called once per waiting request per evaluation attempt, under the
    /// runner's lock: keep it fast, synchronous and side-effect free. Side
    /// effects belong in [`Gate::satisfy`].
    fn is_satisfied(&self, request: &RequestDescriptor) -> bool;

    /// Performs whatever work makes the gate satisfied.
    ///
    /// Invoked at most once per idle→executing transition, no matter how
    /// many requests are waiting, with a snapshot of the request that
    /// triggered the transition. Resolving the returned future is the
    /// finish signal: `Ok(())` releases every waiter, `Err(error)` fails
    /// them all with that error before releasing them.
    async fn satisfy(&self, request: RequestDescriptor) -> Result<(), CourierError>;
}
