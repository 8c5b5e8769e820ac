// vim: tw=80
use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, MutexGuard}
};

use predicates::prelude::Predicate;
use tracing::{debug, trace};

use crate::{
    lock,
    params::{Params, format_values},
    reporter::Reporter,
    setup::Setup
};

/// One recorded invocation of a [`Method`].
#[derive(Clone, Debug)]
pub struct Call<I, O> {
    input: I,
    output: Option<O>,
    expected: bool,
}

impl<I, O> Call<I, O> {
    /// The arguments the method was called with.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// What the matching setup returned.  `None` for unexpected calls, which
    /// return `O::default()` without recording it.
    pub fn output(&self) -> Option<&O> {
        self.output.as_ref()
    }

    /// Did the call match a setup?
    pub fn is_expected(&self) -> bool {
        self.expected
    }
}

struct Inner<I, O> {
    setups: Vec<Setup<I, O>>,
    calls: Vec<Call<I, O>>,
    strict: bool,
}

impl<I, O> Default for Inner<I, O> {
    fn default() -> Self {
        Inner {
            setups: Vec::new(),
            calls: Vec::new(),
            strict: false,
        }
    }
}

impl<I: Params, O> Inner<I, O> {
    fn verify(&self, r: &dyn Reporter) {
        r.helper();
        let unexpected = self.calls.iter()
            .filter(|c| !c.expected)
            .map(|c| format!("\t- {}", format_values(&c.input.values())))
            .collect::<Vec<_>>();
        if !unexpected.is_empty() {
            r.error(format!("Received {} unexpected calls:\n{}\n",
                            unexpected.len(), unexpected.join("\n")));
        }
        for setup in self.setups.iter() {
            setup.verify(r);
        }
    }
}

/// Records the calls to one faked method and matches them against the
/// method's [`Setup`]s.
///
/// `I` is the method's argument list, usually a tuple, and `O` is its return
/// type.  A `Method` is meant to be embedded in a hand-written fake, whose
/// method bodies forward to [`receive`](#method.receive).
///
/// # Examples
/// ```
/// # use doublet::*;
/// #[derive(Default)]
/// struct FakeStock {
///     reserve: Method<(String, u32), bool>,
/// }
///
/// impl FakeStock {
///     fn reserve(&self, sku: &str, qty: u32) -> bool {
///         self.reserve.receive((sku.to_owned(), qty))
///     }
/// }
///
/// let stock = FakeStock::default();
/// stock.reserve.on(("widget".to_owned(), 2)).return_const(true);
/// assert!(stock.reserve("widget", 2));
/// assert!(!stock.reserve("gadget", 2));
/// assert_eq!(2, stock.reserve.call_count());
/// ```
pub struct Method<I, O> {
    inner: Arc<Mutex<Inner<I, O>>>,
}

impl<I, O> Method<I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, setup: Setup<I, O>) -> SetupGuard<'_, I, O> {
        let mut guard = lock(&self.inner);
        guard.setups.push(setup);
        let i = guard.setups.len() - 1;
        SetupGuard { guard, i }
    }

    /// Declare a setup that matches calls whose arguments match `pattern`
    /// according to [`Params::matches`].
    pub fn on(&self, pattern: I) -> SetupGuard<'_, I, O> {
        self.push(Setup::exact(pattern))
    }

    /// Declare a setup that matches any arguments.
    pub fn on_any(&self) -> SetupGuard<'_, I, O> {
        self.push(Setup::any())
    }

    /// Declare a setup that matches calls whose arguments satisfy `p`.
    ///
    /// # Examples
    /// ```
    /// # use doublet::*;
    /// let scale = Method::<(i32,), i32>::new();
    /// scale.on_matching(predicate::function(|(x,): &(i32,)| *x < 0))
    ///     .return_const(-1);
    /// scale.on_any().returning(|(x,)| x * 10);
    /// assert_eq!(-1, scale.receive((-4,)));
    /// assert_eq!(40, scale.receive((4,)));
    /// ```
    pub fn on_matching<P>(&self, p: P) -> SetupGuard<'_, I, O>
        where P: Predicate<I> + Send + 'static
    {
        self.push(Setup::pred(p))
    }

    /// How many times has the method been called?
    pub fn call_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    /// Has [`strict`](#method.strict) been enabled?
    pub fn is_strict(&self) -> bool {
        lock(&self.inner).strict
    }

    /// Forget every setup and every recorded call, so the fake can be reused
    /// for another scenario.  Strict mode, once enabled, stays enabled.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        inner.setups.clear();
        inner.calls.clear();
        trace!("reset method recorder");
    }
}

impl<I: Clone, O: Clone> Method<I, O> {
    /// Every recorded call, oldest first.
    pub fn calls(&self) -> Vec<Call<I, O>> {
        lock(&self.inner).calls.clone()
    }

    /// The `n`th recorded call, counting from zero.
    ///
    /// # Panics
    ///
    /// If fewer than `n + 1` calls have been recorded.
    pub fn call(&self, n: usize) -> Call<I, O> {
        let inner = lock(&self.inner);
        if let Some(call) = inner.calls.get(n) {
            return call.clone();
        }
        let len = inner.calls.len();
        // Don't poison the lock; strict verification still needs it
        drop(inner);
        panic!("expected at least {} calls, but got {}", n + 1, len)
    }
}

impl<I: Clone, O> Method<I, O> {
    /// The arguments of every recorded call, oldest first.
    pub fn call_history(&self) -> Vec<I> {
        lock(&self.inner).calls.iter()
            .map(|c| c.input.clone())
            .collect()
    }

    /// The arguments of the first recorded call, if there was one.
    pub fn first_call(&self) -> Option<I> {
        lock(&self.inner).calls.first()
            .map(|c| c.input.clone())
    }

    /// The arguments of every call that matched no setup, oldest first.
    pub fn unexpected_calls(&self) -> Vec<I> {
        lock(&self.inner).calls.iter()
            .filter(|c| !c.expected)
            .map(|c| c.input.clone())
            .collect()
    }
}

impl<I: Params, O> Method<I, O> {
    /// Report every unexpected call and every unsatisfied setup through `r`.
    ///
    /// Strict recorders do this automatically when their scope ends.  Calling
    /// it directly works for any recorder.
    pub fn verify(&self, r: &dyn Reporter) {
        lock(&self.inner).verify(r);
    }
}

impl<I, O> Method<I, O>
    where I: Params + Send + 'static, O: Send + 'static
{
    /// Fail the test if, by the end of `r`'s scope, any call went unmatched
    /// or any setup was not matched as often as declared.
    ///
    /// Enabling strict mode more than once has no further effect.
    ///
    /// # Examples
    /// ```
    /// # use doublet::*;
    /// let t = TestScope::new();
    /// let send = Method::<(&str,), ()>::new();
    /// send.strict(&t).on(("hello",)).once();
    /// send.receive(("goodbye",));
    /// assert_eq!(t.finish(), vec![
    ///     "Received 1 unexpected calls:\n\t- goodbye (&str)\n",
    ///     "Expected 1, but got 0 calls with: hello (&str)",
    /// ]);
    /// ```
    pub fn strict(&self, r: &dyn Reporter) -> &Self {
        r.helper();
        {
            let mut inner = lock(&self.inner);
            if inner.strict {
                return self;
            }
            inner.strict = true;
        }
        let inner = Arc::clone(&self.inner);
        r.cleanup(Box::new(move |r: &dyn Reporter| lock(&inner).verify(r)));
        trace!("registered strict verification");
        self
    }
}

impl<I, O> Method<I, O>
    where I: Params + Clone, O: Clone + Default
{
    /// Dispatch a call to the faked method.
    ///
    /// Setups are tried in the order they were declared, and the first one
    /// that matches `input` and hasn't reached its ceiling produces the
    /// result.  If none does, the call is recorded as unexpected and
    /// `O::default()` is returned.
    ///
    /// The result is computed while the recorder is locked, so a `returning`
    /// closure must not call back into the same `Method`.
    pub fn receive(&self, input: I) -> O {
        let mut inner = lock(&self.inner);
        let selected = inner.setups.iter()
            .position(|s| s.matches(&input));
        match selected {
            Some(i) => {
                trace!(setup = i, "matched call");
                let output = inner.setups[i].call(input.clone());
                inner.calls.push(Call {
                    input,
                    output: Some(output.clone()),
                    expected: true
                });
                output
            },
            None => {
                debug!(args = %format_values(&input.values()),
                       "unexpected call");
                inner.calls.push(Call { input, output: None, expected: false });
                O::default()
            }
        }
    }
}

impl<I, O> Default for Method<I, O> {
    fn default() -> Self {
        Method { inner: Arc::new(Mutex::new(Inner::default())) }
    }
}

impl<I, O> fmt::Debug for Method<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("Method")
            .field("setups", &inner.setups.len())
            .field("calls", &inner.calls.len())
            .field("strict", &inner.strict)
            .finish()
    }
}

/// A freshly declared [`Setup`], still attached to its [`Method`].
///
/// The guard keeps the method locked, so it should be used only to chain
/// configuration calls in the declaring statement.  Calling the method while
/// the guard is alive will deadlock.
// The guard can't simply hand out a `&mut Setup`, because the setup lives
// behind the method's Mutex.  Instead it records the setup's position and
// dereferences to it.
pub struct SetupGuard<'guard, I, O> {
    guard: MutexGuard<'guard, Inner<I, O>>,
    i: usize,
}

impl<I, O> Deref for SetupGuard<'_, I, O> {
    type Target = Setup<I, O>;

    fn deref(&self) -> &Setup<I, O> {
        &self.guard.setups[self.i]
    }
}

impl<I, O> DerefMut for SetupGuard<'_, I, O> {
    fn deref_mut(&mut self) -> &mut Setup<I, O> {
        &mut self.guard.setups[self.i]
    }
}
