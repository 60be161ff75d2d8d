//! Deferred continuations returned by state mutators.
//!
//! A [`Task`] is an ordered batch of futures, each resolving to exactly one
//! message. The owner of the state runs them however it likes (one at a
//! time, all at once, in any order) and feeds every message back through
//! its `update` function.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// A batch of pending continuations producing messages of type `M`.
#[must_use = "tasks do nothing unless their futures are awaited"]
pub struct Task<M> {
    futures: Vec<BoxFuture<'static, M>>,
}

impl<M> std::fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("pending", &self.futures.len())
            .finish()
    }
}

impl<M: Send + 'static> Task<M> {
    /// A task that produces nothing.
    pub fn none() -> Self {
        Self {
            futures: Vec::new(),
        }
    }

    /// A task that yields `message` immediately.
    pub fn done(message: M) -> Self {
        Self::perform(std::future::ready(message), std::convert::identity)
    }

    /// Run `future` and map its output into a message.
    pub fn perform<T, F>(future: F, f: impl FnOnce(T) -> M + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            futures: vec![future.map(f).boxed()],
        }
    }

    /// Combine several tasks, keeping their order.
    pub fn batch(tasks: impl IntoIterator<Item = Task<M>>) -> Self {
        Self {
            futures: tasks.into_iter().flat_map(|task| task.futures).collect(),
        }
    }

    /// Convert every produced message.
    pub fn map<N: Send + 'static>(self, f: impl Fn(M) -> N + Send + Sync + 'static) -> Task<N> {
        let f = Arc::new(f);
        Task {
            futures: self
                .futures
                .into_iter()
                .map(|future| {
                    let f = Arc::clone(&f);
                    future.map(move |message| f(message)).boxed()
                })
                .collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    /// Number of pending continuations.
    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_none()
    }

    /// Take the individual futures, e.g. to resolve them out of order.
    pub fn into_futures(self) -> Vec<BoxFuture<'static, M>> {
        self.futures
    }

    /// Await every continuation in order and return the messages.
    pub async fn collect(self) -> Vec<M> {
        let mut messages = Vec::with_capacity(self.futures.len());
        for future in self.futures {
            messages.push(future.await);
        }
        messages
    }
}
