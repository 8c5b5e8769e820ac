// vim: tw=80
use std::{
    fmt,
    sync::{
        Mutex,
        PoisonError,
        atomic::{AtomicUsize, Ordering}
    }
};

use fragile::Fragile;
use predicates::prelude::Predicate;

use crate::{
    lock,
    params::{Params, format_values},
    reporter::Reporter
};

/// Return functions for setups
enum Rfunc<I, O> {
    Default,
    // Indicates that a `return_once` setup has already returned
    Expired,
    Mut(Box<dyn FnMut(I) -> O + Send>),
    Once(Box<dyn FnOnce(I) -> O + Send>),
}

impl<I, O: Default> Rfunc<I, O> {
    fn call_mut(&mut self, args: I) -> O {
        match self {
            Rfunc::Default => O::default(),
            Rfunc::Expired => {
                panic!("Called a method twice that was expected only once")
            },
            Rfunc::Mut(f) => f(args),
            Rfunc::Once(_) => {
                match std::mem::replace(self, Rfunc::Expired) {
                    Rfunc::Once(f) => f(args),
                    _ => unreachable!()
                }
            },
        }
    }
}

/// How a setup decides whether it applies to a call.
enum Matcher<I> {
    Any,
    Exact(I),
    Pred(Box<dyn Predicate<I> + Send>),
}

impl<I: Params> Matcher<I> {
    fn matches(&self, i: &I) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Exact(pattern) => pattern.matches(i),
            Matcher::Pred(p) => p.eval(i),
        }
    }

    /// Completes the sentence "... calls with"
    fn describe(&self) -> String {
        match self {
            Matcher::Any => " any arguments".to_owned(),
            Matcher::Exact(pattern) =>
                format!(": {}", format_values(&pattern.values())),
            Matcher::Pred(p) => format!(": {p}"),
        }
    }
}

#[derive(Debug, Default)]
struct Times {
    /// How many times has the setup already matched?
    count: AtomicUsize,
    /// The ceiling, if any
    max: Option<usize>,
}

impl Times {
    fn call(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Has the setup already matched as many times as it may?
    fn is_done(&self) -> bool {
        self.max.is_some_and(|max| self.count() >= max)
    }

    fn is_satisfied(&self) -> bool {
        match self.max {
            Some(max) => self.count() >= max,
            None => self.count() > 0
        }
    }

    fn n(&mut self, n: usize) {
        assert!(n > 0, "A setup must be allowed to match at least once");
        self.max = Some(n);
    }
}

/// One declared expectation of a [`Method`](crate::Method).
///
/// Setups are created by [`Method::on`](crate::Method::on),
/// [`Method::on_any`](crate::Method::on_any) and
/// [`Method::on_matching`](crate::Method::on_matching), and configured
/// through the [`SetupGuard`](crate::SetupGuard) those return.  Without a
/// ceiling a setup matches an unlimited number of calls.  Without a return
/// value it returns `O::default()`.
pub struct Setup<I, O> {
    matcher: Matcher<I>,
    times: Times,
    rfunc: Mutex<Rfunc<I, O>>,
}

impl<I, O> Setup<I, O> {
    fn new(matcher: Matcher<I>) -> Self {
        Setup {
            matcher,
            times: Times::default(),
            rfunc: Mutex::new(Rfunc::Default),
        }
    }

    pub(crate) fn any() -> Self {
        Self::new(Matcher::Any)
    }

    pub(crate) fn exact(pattern: I) -> Self {
        Self::new(Matcher::Exact(pattern))
    }

    pub(crate) fn pred<P>(p: P) -> Self
        where P: Predicate<I> + Send + 'static
    {
        Self::new(Matcher::Pred(Box::new(p)))
    }

    fn set_rfunc(&mut self, rfunc: Rfunc<I, O>) {
        *self.rfunc.get_mut().unwrap_or_else(PoisonError::into_inner) = rfunc;
    }

    /// How many calls has this setup matched so far?
    pub fn call_count(&self) -> usize {
        self.times.count()
    }

    /// Has this setup reached its ceiling?  Always false for setups without
    /// one.
    pub fn is_done(&self) -> bool {
        self.times.is_done()
    }

    /// Would strict-mode verification accept this setup as it stands?
    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied()
    }

    /// Allow this setup to match exactly once.  Shortcut for
    /// [`times(1)`](#method.times).
    pub fn once(&mut self) -> &mut Self {
        self.times(1)
    }

    /// Allow this setup to match at most `n` calls.  Further calls fall
    /// through to later setups.  In strict mode, the setup must match exactly
    /// `n` calls.
    ///
    /// # Panics
    ///
    /// If `n` is zero.
    pub fn times(&mut self, n: usize) -> &mut Self {
        self.times.n(n);
        self
    }

    /// Supply a closure that will compute the return value from the call's
    /// arguments, which are passed by value.
    ///
    /// # Examples
    /// ```
    /// # use doublet::*;
    /// let add = Method::<(u32, u32), u32>::new();
    /// add.on_any().returning(|(x, y)| x + y);
    /// assert_eq!(5, add.receive((2, 3)));
    /// ```
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(I) -> O + Send + 'static
    {
        self.set_rfunc(Rfunc::Mut(Box::new(f)));
        self
    }

    /// Supply an `FnOnce` closure that will provide the return value.  This
    /// is useful when the closure consumes something it captured, like a
    /// channel receiver or a file handle.  It also limits the setup to a
    /// single match.
    ///
    /// The return type itself must still be `Clone` to be dispatched, since
    /// every [`Call`](crate::Call) records a copy of its output.
    pub fn return_once<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(I) -> O + Send + 'static
    {
        self.set_rfunc(Rfunc::Once(Box::new(f)));
        self.once()
    }

    /// Single-threaded version of [`returning`](#method.returning).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the faked method from a different
    /// thread than the one that originally called this method.
    pub fn returning_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(I) -> O + 'static, I: 'static, O: 'static
    {
        let mut fragile = Fragile::new(f);
        let fmut = move |i: I| {
            (fragile.get_mut())(i)
        };
        self.set_rfunc(Rfunc::Mut(Box::new(fmut)));
        self
    }

    /// Return a constant value.  The output type must be `Clone`.
    pub fn return_const(&mut self, c: O) -> &mut Self
        where O: Clone + Send + 'static
    {
        self.returning(move |_| c.clone())
    }
}

impl<I: Params, O> Setup<I, O> {
    /// Does this setup currently apply to `i`?  A setup at its ceiling never
    /// does, whatever its pattern.
    pub fn matches(&self, i: &I) -> bool {
        !self.times.is_done() && self.matcher.matches(i)
    }

    /// Report this setup through `r` if it hasn't matched as often as it
    /// should have.
    pub fn verify(&self, r: &dyn Reporter) {
        r.helper();
        let count = self.times.count();
        match self.times.max {
            Some(max) if count < max => {
                r.error(format!("Expected {max}, but got {count} calls with{}",
                                self.matcher.describe()));
            },
            None if count == 0 => {
                r.error(format!("Expected some, but got 0 calls with{}",
                                self.matcher.describe()));
            },
            _ => ()
        }
    }
}

impl<I, O: Default> Setup<I, O> {
    /// Produce the return value and record a match.  Only to be called once
    /// [`matches`](#method.matches) has selected this setup.
    ///
    /// The match is counted only after the return function succeeds, so a
    /// panicking closure leaves the setup as it was.
    pub(crate) fn call(&self, i: I) -> O {
        let o = lock(&self.rfunc).call_mut(i);
        self.times.call();
        o
    }
}

impl<I: Params, O> fmt::Debug for Setup<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Setup")
            .field("input", &self.matcher.describe().trim_start())
            .field("max", &self.times.max)
            .field("count", &self.times.count())
            .finish()
    }
}
