// vim: tw=80
//! Calling a `Method` from several threads at once
use std::{rc::Rc, thread};

use doublet::*;
use static_assertions::assert_impl_all;

assert_impl_all!(Method<(String, u32), Option<String>>: Send, Sync);
assert_impl_all!(TestScope: Send, Sync);

#[test]
fn ceiling_holds_under_contention() {
    let m = Method::<(u32,), u32>::new();
    m.on_any().times(50).return_const(1);

    thread::scope(|s| {
        for t in 0..8 {
            let m = &m;
            s.spawn(move || {
                for i in 0..20 {
                    m.receive((t * 100 + i,));
                }
            });
        }
    });

    let calls = m.calls();
    assert_eq!(160, calls.len());
    assert_eq!(50, calls.iter().filter(|c| c.is_expected()).count());
    assert_eq!(50, calls.iter().filter(|c| c.output() == Some(&1)).count());
    assert_eq!(110, m.unexpected_calls().len());
}

#[test]
fn no_lost_calls() {
    let m = Method::<(usize,), ()>::new();
    thread::scope(|s| {
        for t in 0..4 {
            let m = &m;
            s.spawn(move || {
                for i in 0..250 {
                    m.receive((t * 1000 + i,));
                }
            });
        }
    });

    let mut history = m.call_history();
    assert_eq!(1000, history.len());
    history.sort_unstable();
    history.dedup();
    assert_eq!(1000, history.len());
}

#[test]
fn strict_from_threads() {
    let t = TestScope::new();
    let m = Method::<(u32,), ()>::new();
    m.strict(&t).on_any().times(4);

    thread::scope(|s| {
        for i in 0..4 {
            let m = &m;
            s.spawn(move || m.receive((i,)));
        }
    });
    assert!(t.finish().is_empty());
}

#[test]
fn returning_st() {
    let m = Method::<(u32,), u32>::new();
    let offset = Rc::new(10);
    m.on_any().returning_st(move |(x,)| x + *offset);
    assert_eq!(15, m.receive((5,)));
}

#[test]
fn returning_st_on_wrong_thread() {
    let m = Method::<(), u32>::new();
    let value = Rc::new(5);
    m.on_any().returning_st(move |_| *value);

    let r = thread::scope(|s| s.spawn(|| m.receive(())).join());
    assert!(r.is_err());
}

#[test]
fn failed_call_does_not_spend_the_setup() {
    let t = TestScope::new();
    let m = Method::<(), u32>::new();
    let value = Rc::new(5);
    m.strict(&t).on_any().once().returning_st(move |_| *value);

    let r = thread::scope(|s| s.spawn(|| m.receive(())).join());
    assert!(r.is_err());

    assert_eq!(5, m.receive(()));
    let calls = m.calls();
    assert_eq!(1, calls.len());
    assert_eq!(Some(&5), calls[0].output());
    assert!(m.unexpected_calls().is_empty());
    assert!(t.finish().is_empty());
}
