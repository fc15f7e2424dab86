//! The gate state machine: waiter queue, idle/executing transitions, and
//! the finish step.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use courier_core_types::CourierError;
use courier_request::RequestDescriptor;

use crate::Gate;

/// Shared handle to a descriptor while it waits on gates. The engine keeps
/// the same handle; a failing gate writes the error into the descriptor's
/// creation-error slot through it.
pub type SharedRequest = Arc<Mutex<RequestDescriptor>>;

/// One queued request waiting for a gate to finish.
pub struct Waiter {
    pub request: SharedRequest,
    /// Release permit: one precondition of the waiting task.
    pub permit: oneshot::Sender<()>,
}

impl Waiter {
    fn release(self) {
        // The receiver may be gone if the task was dropped; nothing to do.
        let _ = self.permit.send(());
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Activity {
    Idle,
    Executing,
}

struct RunnerState {
    activity: Activity,
    waiters: Vec<Waiter>,
}

/// Owns one gate's queue and state transitions.
///
/// All bookkeeping happens under a private lock, so predicate checks and
/// queue mutations never race; the satisfaction routine itself runs
/// outside the lock on the runtime's worker pool.
pub struct GateRunner {
    gate: Arc<dyn Gate>,
    state: Mutex<RunnerState>,
}

impl GateRunner {
    pub fn new(gate: Arc<dyn Gate>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            state: Mutex::new(RunnerState {
                activity: Activity::Idle,
                waiters: Vec::new(),
            }),
        })
    }

    /// Evaluate-and-enqueue: releases the waiter immediately when the gate
    /// is already satisfied for it, otherwise queues it and kicks off a
    /// satisfaction attempt if none is in flight.
    pub fn evaluate(self: &Arc<Self>, waiter: Waiter) {
        let snapshot = waiter.request.lock().clone();

        let mut state = self.state.lock();
        if self.gate.is_satisfied(&snapshot) {
            drop(state);
            waiter.release();
            return;
        }

        state.waiters.push(waiter);
        if state.activity == Activity::Idle {
            state.activity = Activity::Executing;
            drop(state);

            debug!("gate unsatisfied, starting satisfaction attempt");
            let runner = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = runner.gate.satisfy(snapshot).await;
                if let Err(error) = &outcome {
                    warn!(%error, "gate satisfaction failed, failing waiters");
                }
                runner.finish(outcome.err());
            });
        }
        // Already executing: the waiter sits in the queue until the
        // in-flight attempt finishes.
    }

    /// Back to idle; releases every queued waiter, stamping `error` into
    /// each waiting descriptor first when the attempt failed.
    fn finish(&self, error: Option<CourierError>) {
        let drained = {
            let mut state = self.state.lock();
            state.activity = Activity::Idle;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = drained.len(), failed = error.is_some(), "gate finished");
        for waiter in drained {
            if let Some(error) = &error {
                waiter.request.lock().creation_error = Some(error.clone());
            }
            waiter.release();
        }
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_core_types::error::courier;
    use courier_core_types::Method;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct TestGate {
        satisfied: AtomicBool,
        satisfy_calls: AtomicUsize,
        release: Arc<Notify>,
        fail_with: Option<CourierError>,
    }

    impl TestGate {
        fn new(satisfied: bool) -> Arc<Self> {
            Arc::new(Self {
                satisfied: AtomicBool::new(satisfied),
                satisfy_calls: AtomicUsize::new(0),
                release: Arc::new(Notify::new()),
                fail_with: None,
            })
        }

        fn failing(error: CourierError) -> Arc<Self> {
            Arc::new(Self {
                satisfied: AtomicBool::new(false),
                satisfy_calls: AtomicUsize::new(0),
                release: Arc::new(Notify::new()),
                fail_with: Some(error),
            })
        }
    }

    #[async_trait]
    impl Gate for TestGate {
        fn is_satisfied(&self, _request: &RequestDescriptor) -> bool {
            self.satisfied.load(Ordering::SeqCst)
        }

        async fn satisfy(&self, _request: RequestDescriptor) -> Result<(), CourierError> {
            self.satisfy_calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => {
                    self.satisfied.store(true, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
    }

    fn waiter() -> (Waiter, SharedRequest, oneshot::Receiver<()>) {
        let request: SharedRequest = Arc::new(Mutex::new(RequestDescriptor::new(
            "https://example.com/ping",
            Method::Get,
        )));
        let (permit, released) = oneshot::channel();
        (
            Waiter {
                request: Arc::clone(&request),
                permit,
            },
            request,
            released,
        )
    }

    #[tokio::test]
    async fn satisfied_gate_releases_immediately() {
        let gate = TestGate::new(true);
        let runner = GateRunner::new(gate.clone());

        let (entry, _request, released) = waiter();
        runner.evaluate(entry);
        released.await.unwrap();
        assert_eq!(gate.satisfy_calls.load(Ordering::SeqCst), 0);
        assert_eq!(runner.queued(), 0);
    }

    #[tokio::test]
    async fn one_satisfy_for_many_waiters() {
        let gate = TestGate::new(false);
        let runner = GateRunner::new(gate.clone());

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (entry, _request, released) = waiter();
            runner.evaluate(entry);
            receivers.push(released);
        }

        tokio::task::yield_now().await;
        assert_eq!(runner.queued(), 3);

        gate.release.notify_one();
        for released in receivers {
            released.await.unwrap();
        }
        assert_eq!(gate.satisfy_calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.queued(), 0);
    }

    #[tokio::test]
    async fn failed_satisfaction_marks_every_waiting_descriptor() {
        let gate = TestGate::failing(courier::response_validation("offline"));
        let runner = GateRunner::new(gate.clone());

        let (first, first_request, first_released) = waiter();
        let (second, second_request, second_released) = waiter();
        runner.evaluate(first);
        runner.evaluate(second);

        gate.release.notify_one();
        first_released.await.unwrap();
        second_released.await.unwrap();

        for request in [first_request, second_request] {
            let error = request.lock().creation_error.clone().unwrap();
            assert_eq!(error.code, courier::RESPONSE_VALIDATION);
        }
    }

    #[tokio::test]
    async fn gate_goes_idle_again_after_finishing() {
        let gate = TestGate::new(false);
        let runner = GateRunner::new(gate.clone());

        let (entry, _request, released) = waiter();
        runner.evaluate(entry);
        gate.release.notify_one();
        released.await.unwrap();

        // The gate flipped itself satisfied, so a fresh waiter sails through.
        let (entry, _request, released) = waiter();
        runner.evaluate(entry);
        released.await.unwrap();
        assert_eq!(gate.satisfy_calls.load(Ordering::SeqCst), 1);
    }
}
