//! Copy-on-write publication of matcher state.
//!
//! Request threads take a snapshot with [`SharedSnapshot::load`] and match
//! against it without locking. The expectation store never mutates a
//! published instance: it builds a new one and swaps it in, so in-flight
//! matches keep the instance they started with.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::attributes::AttributesMatcher;
use crate::container::MultiValueContainer;

/// An atomically replaceable, immutable value.
pub struct SharedSnapshot<T> {
    inner: Arc<ArcSwap<T>>,
}

/// A published matcher-side container.
pub type SharedContainer = SharedSnapshot<MultiValueContainer>;

/// A published set of attribute-group matchers for one expectation.
pub type SharedAttributes = SharedSnapshot<AttributesMatcher>;

impl<T> SharedSnapshot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace the current value, returning the previous snapshot.
    pub fn publish(&self, next: T) -> Arc<T> {
        self.inner.swap(Arc::new(next))
    }

    /// Build a new value from the current one and publish it.
    ///
    /// `f` may run more than once if another writer publishes concurrently.
    pub fn update<F>(&self, mut f: F)
    where
        F: FnMut(&T) -> T,
    {
        self.inner.rcu(|current| Arc::new(f(current)));
    }
}

impl<T> Clone for SharedSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedSnapshot").field(&self.load()).finish()
    }
}
