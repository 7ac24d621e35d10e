//! One-shot asynchronous results.
//!
//! A `Promise` is fulfilled exactly once by its `Resolver`. Continuations
//! registered while pending are queued and run in registration order on
//! the fulfilling task; continuations registered afterwards run at once.
//! A promise is also a `Future`, so handler code can simply `.await` it.
//!
//! There is no rejected state: failures travel inside the value
//! (`Promise<Result<A, E>>`).

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

type Continuation<A> = Box<dyn FnOnce(A) + Send>;

enum State<A> {
    Pending {
        continuations: Vec<Continuation<A>>,
        wakers: Vec<Waker>,
    },
    Fulfilled(A),
}

struct Shared<A> {
    state: Mutex<State<A>>,
}

impl<A> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, State<A>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The read side of a one-shot result.
pub struct Promise<A> {
    shared: Arc<Shared<A>>,
}

/// The write side. Consumed by `fulfill`.
pub struct Resolver<A> {
    shared: Option<Arc<Shared<A>>>,
}

impl<A> Clone for Promise<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Clone + Send + 'static> Promise<A> {
    /// A pending promise and the resolver that fulfills it.
    pub fn pending() -> (Promise<A>, Resolver<A>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Pending {
                continuations: Vec::new(),
                wakers: Vec::new(),
            }),
        });
        (
            Promise {
                shared: Arc::clone(&shared),
            },
            Resolver { shared: Some(shared) },
        )
    }

    /// An already fulfilled promise.
    pub fn fulfilled(value: A) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Fulfilled(value)),
            }),
        }
    }

    /// Run `future` on the runtime and fulfill with its output.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        let (promise, resolver) = Self::pending();
        tokio::spawn(async move {
            resolver.fulfill(future.await);
        });
        promise
    }

    /// Register a continuation.
    pub fn on_complete<F>(&self, continuation: F)
    where
        F: FnOnce(A) + Send + 'static,
    {
        let mut state = self.shared.lock();
        match &mut *state {
            State::Pending { continuations, .. } => continuations.push(Box::new(continuation)),
            State::Fulfilled(value) => {
                let value = value.clone();
                drop(state);
                continuation(value);
            }
        }
    }

    /// A promise of `f` applied to this one's value.
    pub fn map<B, F>(&self, f: F) -> Promise<B>
    where
        B: Clone + Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        let (promise, resolver) = Promise::pending();
        self.on_complete(move |value| resolver.fulfill(f(value)));
        promise
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(*self.shared.lock(), State::Fulfilled(_))
    }

    /// The value, if fulfilled.
    pub fn peek(&self) -> Option<A> {
        match &*self.shared.lock() {
            State::Fulfilled(value) => Some(value.clone()),
            State::Pending { .. } => None,
        }
    }
}

impl<A: Clone + Send + 'static> Resolver<A> {
    /// Fulfill the promise and run every queued continuation in order.
    pub fn fulfill(mut self, value: A) {
        let Some(shared) = self.shared.take() else {
            return;
        };

        let previous = std::mem::replace(&mut *shared.lock(), State::Fulfilled(value.clone()));
        let State::Pending { continuations, wakers } = previous else {
            return;
        };

        for continuation in continuations {
            continuation(value.clone());
        }
        for waker in wakers {
            waker.wake();
        }
    }
}

impl<A> Drop for Resolver<A> {
    fn drop(&mut self) {
        if self.shared.is_some() {
            tracing::warn!("Promise resolver dropped without fulfilling; waiters will never resume");
        }
    }
}

impl<A: Clone> Future for Promise<A> {
    type Output = A;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<A> {
        let mut state = self.shared.lock();
        match &mut *state {
            State::Fulfilled(value) => Poll::Ready(value.clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<A> std::fmt::Debug for Promise<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fulfilled = matches!(*self.shared.lock(), State::Fulfilled(_));
        f.debug_struct("Promise").field("fulfilled", &fulfilled).finish()
    }
}
