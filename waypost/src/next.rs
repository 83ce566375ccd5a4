//! Continuation handle passed through route chains.

use crate::error::ErrorPtr;
use parking_lot::Mutex;
use std::sync::Arc;

/// What a handler asked the chain to do after it finished.
#[derive(Clone, Debug, Default)]
pub enum NextState {
    /// The handler did not call the continuation - the chain stops here.
    #[default]
    Pending,
    /// Proceed to the next handler of the chain, or to the next matching route.
    Proceed,
    /// Abort the chain with an error.
    Failed(ErrorPtr),
}

/// The "proceed to next handler" callback. Every handler of a chain gets a fresh instance; the
/// chain inspects it after the handler completes.
#[derive(Clone, Debug, Default)]
pub struct Next {
    state: Arc<Mutex<NextState>>,
}

impl Next {
    /// Passes control to the next handler.
    pub fn call(&self) {
        *self.state.lock() = NextState::Proceed;
    }

    /// Passes an error down the chain, skipping remaining handlers.
    pub fn fail(&self, error: ErrorPtr) {
        *self.state.lock() = NextState::Failed(error);
    }

    pub fn state(&self) -> NextState {
        self.state.lock().clone()
    }

    #[inline]
    pub fn was_called(&self) -> bool {
        !matches!(*self.state.lock(), NextState::Pending)
    }
}
