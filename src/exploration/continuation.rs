//! Type-erased continuations
//!
//! Continuations are ordinary closures, and nesting them gives every level its
//! own closure type. That is free for straight-line programs but a recursive
//! CPS function would need infinitely many types. [`Cont`] erases the type
//! behind a shared pointer so recursion stays finite.

use std::fmt;
use std::rc::Rc;

use super::runtime::{Runtime, Step};

/// A cloneable, type-erased continuation taking a `T`.
///
/// Every clone is a separate handle that is consumed by [`Cont::resume`];
/// forking at a `sample` clones the handle once per extra branch.
pub struct Cont<'a, T, R> {
    inner: Rc<dyn Fn(&mut Runtime<'a, R>, T) -> Step + 'a>,
}

impl<'a, T: 'a, R: 'a> Cont<'a, T, R> {
    /// Erase a continuation closure
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut Runtime<'a, R>, T) -> Step + Clone + 'a,
    {
        let inner: Rc<dyn Fn(&mut Runtime<'a, R>, T) -> Step + 'a> =
            Rc::new(move |rt: &mut Runtime<'a, R>, value: T| (f.clone())(rt, value));
        Self { inner }
    }

    /// Invoke the continuation with `value`
    pub fn resume(self, rt: &mut Runtime<'a, R>, value: T) -> Step {
        (self.inner)(rt, value)
    }

    /// Turn the handle back into a closure accepted by the effect primitives
    pub fn into_fn(self) -> impl FnOnce(&mut Runtime<'a, R>, T) -> Step + Clone + 'a {
        move |rt: &mut Runtime<'a, R>, value: T| self.resume(rt, value)
    }
}

impl<T, R> Clone for Cont<'_, T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, R> fmt::Debug for Cont<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cont")
    }
}
