// vim: tw=80
//! Which setup a call is dispatched to
use doublet::*;

#[test]
fn first_declared_wins() {
    let m = Method::<(u32,), &'static str>::new();
    m.on((1,)).return_const("first");
    m.on((1,)).return_const("second");

    assert_eq!("first", m.receive((1,)));
    assert_eq!("first", m.receive((1,)));
}

#[test]
fn later_setups_dont_affect_earlier_matches() {
    let m = Method::<(u32,), &'static str>::new();
    m.on((1,)).return_const("one");
    assert_eq!("one", m.receive((1,)));

    m.on_any().return_const("any");
    assert_eq!("one", m.receive((1,)));
    assert_eq!("any", m.receive((2,)));
}

#[test]
fn catch_all_shadows_later_setups() {
    let m = Method::<(u32,), u32>::new();
    m.on_any().return_const(0xff);
    m.on((1,)).return_const(1);

    assert_eq!(0xff, m.receive((1,)));
    assert_eq!(0xff, m.receive((2,)));
    assert!(m.unexpected_calls().is_empty());
}

#[test]
fn exhausted_setup_falls_through() {
    let m = Method::<(u32,), u32>::new();
    m.on((1,)).times(2).return_const(10);
    m.on_any().once().return_const(20);

    assert_eq!(10, m.receive((1,)));
    assert_eq!(10, m.receive((1,)));
    assert_eq!(20, m.receive((1,)));
    assert_eq!(0, m.receive((1,)));
    assert_eq!(4, m.call_count());
    assert_eq!(vec![(1,)], m.unexpected_calls());
}

#[test]
fn ceiling_ignores_pattern() {
    let m = Method::<(u32,), u32>::new();
    m.on((7,)).once().return_const(7);

    assert_eq!(0, m.receive((8,)));
    assert_eq!(7, m.receive((7,)));
    assert_eq!(0, m.receive((7,)));
}

#[test]
fn predicate_setup() {
    let m = Method::<(u32, u32), bool>::new();
    m.on_matching(predicate::function(|(a, b): &(u32, u32)| a > b))
        .return_const(true);

    assert!(m.receive((3, 2)));
    assert!(!m.receive((2, 3)));
    assert_eq!(vec![(2, 3)], m.unexpected_calls());
}

#[test]
fn predicate_eq() {
    let m = Method::<(u32,), u32>::new();
    m.on_matching(predicate::eq((5,))).return_const(50);

    assert_eq!(50, m.receive((5,)));
    assert_eq!(0, m.receive((6,)));
}

#[test]
fn unbounded_catch_all() {
    let m = Method::<(), u32>::new();
    m.on_any().return_const(42);
    for _ in 0..1000 {
        assert_eq!(42, m.receive(()));
    }
    assert!(m.unexpected_calls().is_empty());
}

#[test]
fn unmatched_calls_accumulate() {
    let m = Method::<(i64,), i64>::new();
    for i in 0..5 {
        assert_eq!(0, m.receive((i,)));
    }
    assert_eq!(5, m.call_count());
    assert_eq!(m.call_history(), m.unexpected_calls());
    assert!(m.calls().iter().all(|c| !c.is_expected()));
}

#[test]
fn return_once() {
    let m = Method::<(), String>::new();
    let token = String::from("token");
    m.on_any().return_once(move |_| token);

    assert_eq!("token", m.receive(()));
    assert_eq!("", m.receive(()));
    assert_eq!(Some(&"token".to_owned()), m.call(0).output());
    assert_eq!(None, m.call(1).output());
}

#[test]
fn return_once_consumes_capture() {
    let (tx, rx) = std::sync::mpsc::channel();
    tx.send(7u32).unwrap();
    let m = Method::<(), u32>::new();
    m.on_any().return_once(move |_| rx.recv().unwrap());

    assert_eq!(7, m.receive(()));
    assert_eq!(0, m.receive(()));
    assert_eq!(vec![()], m.unexpected_calls());
}

#[test]
fn default_when_no_return_configured() {
    let m = Method::<(), Vec<u8>>::new();
    m.on_any();
    assert!(m.receive(()).is_empty());
    assert!(m.call(0).is_expected());
}

#[test]
fn custom_params() {
    #[derive(Clone)]
    struct Range(u32, u32);

    // A pattern Range(lo, hi) matches any Range within it
    impl Params for Range {
        fn matches(&self, actual: &Self) -> bool {
            self.0 <= actual.0 && actual.1 <= self.1
        }

        fn values(&self) -> Vec<Arg> {
            vec![Arg::new(&self.0), Arg::new(&self.1)]
        }
    }

    let m = Method::<Range, bool>::new();
    m.on(Range(10, 20)).return_const(true);
    assert!(m.receive(Range(12, 18)));
    assert!(!m.receive(Range(5, 18)));
}
