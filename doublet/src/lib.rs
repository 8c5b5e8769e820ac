// vim: tw=80
//! Call recording and expectation matching for hand-written test doubles.
//!
//! Doublet does not generate fakes.  It provides the runtime piece that a
//! fake is built around: a [`Method`] recorder per faked method, which
//! matches each call against the setups declared by the test, returns the
//! configured result, and remembers the call for later inspection.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Inspecting calls`](#inspecting-calls)
//! * [`Strict mode`](#strict-mode)
//! * [`Threads`](#threads)
//!
//! ## Getting Started
//!
//! Embed one [`Method`] per method in the fake, and forward the method's
//! arguments to [`Method::receive`] as a tuple.
//! ```
//! use doublet::*;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Item {
//!     name: String,
//!     quantity: u32,
//! }
//!
//! trait ShoppingList {
//!     fn add(&self, name: &str, quantity: u32) -> Option<Item>;
//! }
//!
//! #[derive(Default)]
//! struct FakeShoppingList {
//!     add: Method<(String, u32), Option<Item>>,
//! }
//!
//! impl ShoppingList for FakeShoppingList {
//!     fn add(&self, name: &str, quantity: u32) -> Option<Item> {
//!         self.add.receive((name.to_owned(), quantity))
//!     }
//! }
//!
//! let list = FakeShoppingList::default();
//! list.add.on_any()
//!     .returning(|(name, quantity)| Some(Item { name, quantity }));
//! assert_eq!(4, list.add("apples", 4).unwrap().quantity);
//! ```
//!
//! ## Return values
//!
//! A setup can return a constant with [`return_const`], compute its result
//! from the arguments with [`returning`], or move a captured value into a
//! single result with [`return_once`].  Calls keep a copy of what they
//! returned, so the return type must be `Clone`.  A setup with no return
//! value configured returns `O::default()`, and so does any call that matches
//! no setup at all.
//!
//! ```
//! # use doublet::*;
//! let len = Method::<(String,), usize>::new();
//! assert_eq!(0, len.receive(("abc".to_owned(),)));
//!
//! len.on_any().returning(|(s,)| s.len());
//! assert_eq!(3, len.receive(("abc".to_owned(),)));
//! ```
//!
//! ## Matching arguments
//!
//! [`Method::on`] declares a setup for one particular argument list,
//! compared with [`Params::matches`].  [`Method::on_any`] matches everything,
//! and [`Method::on_matching`] accepts any [`Predicate`] over the argument
//! tuple.
//!
//! Setups are tried in the order they were declared, and the first one that
//! matches is used.  Declaring a catch-all first therefore shadows every
//! later setup.
//!
//! ```
//! # use doublet::*;
//! let price = Method::<(&str,), u32>::new();
//! price.on(("apples",)).return_const(3);
//! price.on_any().return_const(10);
//! price.on(("pears",)).return_const(5);   // never used
//!
//! assert_eq!(3, price.receive(("apples",)));
//! assert_eq!(10, price.receive(("pears",)));
//! ```
//!
//! ## Call counts
//!
//! A setup may be given a ceiling with [`times`] or [`once`].  After
//! matching that many calls it is skipped, and later calls fall through to
//! the next matching setup.
//!
//! ```
//! # use doublet::*;
//! let next_id = Method::<(), u64>::new();
//! next_id.on_any().once().return_const(1);
//! next_id.on_any().times(2).return_const(2);
//!
//! assert_eq!(1, next_id.receive(()));
//! assert_eq!(2, next_id.receive(()));
//! assert_eq!(2, next_id.receive(()));
//! assert_eq!(0, next_id.receive(()));
//! ```
//!
//! ## Inspecting calls
//!
//! Every call is recorded, matched or not.
//!
//! ```
//! # use doublet::*;
//! let log = Method::<(&str, u8), ()>::new();
//! log.on(("boot", 1));
//! log.receive(("boot", 1));
//! log.receive(("halt", 0));
//!
//! assert_eq!(vec![("boot", 1), ("halt", 0)], log.call_history());
//! assert!(log.call(0).is_expected());
//! assert_eq!(vec![("halt", 0)], log.unexpected_calls());
//! ```
//!
//! [`Method::reset`] clears both the setups and the recorded calls.
//!
//! ## Strict mode
//!
//! An unexpected call is silent where it happens.  To turn unexpected calls,
//! and setups that were never satisfied, into test failures, enable strict
//! mode with a [`Reporter`].  Verification runs when the reporter's scope
//! ends; with [`TestScope`] that is when it is dropped.
//!
//! ```should_panic
//! # use doublet::*;
//! let t = TestScope::new();
//! let save = Method::<(u32,), bool>::new();
//! save.strict(&t).on((1,)).once().return_const(true);
//! save.receive((1,));
//! save.receive((2,));
//! // Panics when `t` goes out of scope:
//! // Received 1 unexpected calls:
//! //     - 2 (u32)
//! ```
//!
//! [`TestScope::finish`] ends the scope early and returns the failures
//! instead of panicking, which is mostly useful for testing fakes
//! themselves.
//!
//! ## Threads
//!
//! A `Method` is `Send` and `Sync` whenever its argument and return types
//! are `Send`, and may be called from many threads at once.  Selecting a
//! setup and recording the call happen atomically, so a setup never matches
//! more calls than its ceiling allows.  Closures that aren't `Send` can be
//! supplied with [`returning_st`], at the cost of only being callable on
//! the thread that supplied them.
//!
//! [`once`]: Setup::once
//! [`return_const`]: Setup::return_const
//! [`return_once`]: Setup::return_once
//! [`returning_st`]: Setup::returning_st
//! [`returning`]: Setup::returning
//! [`times`]: Setup::times

use std::sync::{Mutex, MutexGuard, PoisonError};

mod method;
mod params;
mod reporter;
mod setup;

pub use method::{Call, Method, SetupGuard};
pub use params::{Arg, Params, format_values};
pub use predicates::prelude::{Predicate, predicate};
pub use reporter::{Cleanup, Reporter, TestScope};
pub use setup::Setup;

// A test that already failed may have poisoned the lock.  The data is still
// fine for recording and reporting purposes.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
