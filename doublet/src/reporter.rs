// vim: tw=80
//! The test-reporting capability that strict recorders report through.
use std::{
    mem,
    sync::Mutex,
    thread
};

use crate::lock;

/// A function registered with [`Reporter::cleanup`].  It is handed the
/// reporter it was registered on when it finally runs.
pub type Cleanup = Box<dyn FnOnce(&dyn Reporter) + Send>;

/// Whatever hosts the test: something that can run code when the test's
/// scope ends and can collect failures without aborting.
///
/// [`TestScope`] is the implementation most tests will want.  Test harnesses
/// with their own notion of a test context can implement it directly.
pub trait Reporter {
    /// Mark the caller as a helper function.  Harnesses that track source
    /// locations may use this to attribute failures to the test body.
    fn helper(&self) {}

    /// Register `f` to run when the scope ends.  Cleanups must run in the
    /// reverse order of their registration.
    fn cleanup(&self, f: Cleanup);

    /// Record a failure and keep going.
    fn error(&self, msg: String);
}

/// A scoped [`Reporter`].
///
/// Cleanups run in LIFO order, either explicitly through
/// [`finish`](TestScope::finish) or when the `TestScope` is dropped.  Any
/// failures still uncollected at drop time fail the test with a panic.
///
/// # Examples
/// ```should_panic
/// # use doublet::*;
/// let t = TestScope::new();
/// let ping = Method::<(), ()>::new();
/// ping.strict(&t).on_any();
/// // ping is never called, so dropping `t` panics
/// ```
#[derive(Default)]
pub struct TestScope {
    cleanups: Mutex<Vec<Cleanup>>,
    errors: Mutex<Vec<String>>,
}

impl TestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered cleanup, newest first.  Cleanups that register
    /// further cleanups have those run too.
    pub fn run_cleanups(&self) {
        loop {
            // Don't hold the lock while the cleanup runs
            let next = lock(&self.cleanups).pop();
            match next {
                Some(f) => f(self),
                None => break
            }
        }
    }

    /// End the scope: run the cleanups, then take every failure reported so
    /// far.  Dropping the `TestScope` afterwards will not panic.
    pub fn finish(&self) -> Vec<String> {
        self.run_cleanups();
        mem::take(&mut *lock(&self.errors))
    }

    /// The failures reported so far, without ending the scope.
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }
}

impl Reporter for TestScope {
    fn cleanup(&self, f: Cleanup) {
        lock(&self.cleanups).push(f);
    }

    fn error(&self, msg: String) {
        lock(&self.errors).push(msg);
    }
}

impl Drop for TestScope {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        let errors = self.finish();
        if !errors.is_empty() {
            panic!("{}", errors.join("\n"));
        }
    }
}
