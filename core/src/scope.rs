//! Per-view request cancellation.
//!
//! A view owns one [`RequestScope`] and runs its requests through it. When
//! the view goes away it calls [`RequestScope::cancel`]; outstanding futures
//! are aborted at their next poll and never reach their state updates.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};

#[derive(Debug, Default)]
struct ScopeState {
    cancelled: bool,
    next_id: u64,
    live: BTreeMap<u64, AbortHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    state: Rc<RefCell<ScopeState>>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `future` so it resolves to `None` once the scope is cancelled.
    pub fn run<F: Future>(&self, future: F) -> impl Future<Output = Option<F::Output>> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = {
            let mut state = self.state.borrow_mut();
            if state.cancelled {
                handle.abort();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.live.insert(id, handle);
            id
        };

        let state = self.state.clone();
        async move {
            let output = Abortable::new(future, registration).await.ok();
            state.borrow_mut().live.remove(&id);
            output
        }
    }

    pub fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        state.cancelled = true;
        let live = std::mem::take(&mut state.live);
        if !live.is_empty() {
            tracing::debug!(count = live.len(), "aborting outstanding requests");
        }
        for handle in live.into_values() {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    pub fn outstanding(&self) -> usize {
        self.state.borrow().live.len()
    }
}
