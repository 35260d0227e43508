//! Property-based invariant tests for the binding lifecycle.
//!
//! For any sequence of lifecycle calls over any combination of present or
//! absent endpoints:
//!
//! 1. Endpoints exist only while the binding is enabled.
//! 2. The medium holds exactly the endpoints the binding holds (no leaks).
//! 3. The subscriber is created with an exclusion naming the publisher iff
//!    a publisher exists.
//! 4. The binding never observes its own writes.
//! 5. `disable()` twice is the same as once.
//! 6. A closed binding stays closed.

use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use topic_binding::{
    Binding, BindingError, BindingState, Endpoint, MemoryMedium, MemoryPublisher, MemorySubscriber,
    MemoryTopic, PubSubOption, PublishEndpoint, UpdateResult,
};

#[derive(Clone, Copy, Debug)]
enum Op {
    Enable,
    Update,
    Disable,
    Close,
    RemoteWrite(i32),
}

// ── Strategies ────────────────────────────────────────────────────────────

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Enable),
        4 => Just(Op::Update),
        2 => Just(Op::Disable),
        1 => Just(Op::Close),
        2 => (-1000i32..1000).prop_map(Op::RemoteWrite),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op_strategy(), 1..=max_len)
}

// ── Harness ───────────────────────────────────────────────────────────────

type Full = Binding<MemoryTopic<i32>, MemoryPublisher<i32>, MemorySubscriber<i32>>;

struct Harness {
    medium: MemoryMedium<i32>,
    binding: Full,
    options_seen: Rc<RefCell<Vec<Vec<PubSubOption>>>>,
    received: Rc<RefCell<Vec<i32>>>,
}

/// Local writes are all >= OWN_BASE; remote writes are all below it.
const OWN_BASE: i32 = 1_000_000;

fn harness(with_publisher: bool, with_subscriber: bool) -> Harness {
    let medium = MemoryMedium::new();
    let options_seen = Rc::new(RefCell::new(Vec::new()));
    let received = Rc::new(RefCell::new(Vec::new()));

    let seen = Rc::clone(&options_seen);
    let sink = Rc::clone(&received);
    let mut counter = OWN_BASE;

    let binding = Binding::builder(medium.topic("prop"))
        .publisher(move |t: &MemoryTopic<i32>| with_publisher.then(|| t.publish()))
        .on_publish(move |p: &mut MemoryPublisher<i32>| -> UpdateResult {
            counter += 1;
            p.set(counter);
            Ok(())
        })
        .subscriber(move |t: &MemoryTopic<i32>, options: &[PubSubOption]| {
            seen.borrow_mut().push(options.to_vec());
            with_subscriber.then(|| {
                let mut options = options.to_vec();
                options.push(PubSubOption::PollStorage(64));
                t.subscribe(&options)
            })
        })
        .on_subscribe(move |s: &mut MemorySubscriber<i32>| -> UpdateResult {
            sink.borrow_mut().extend(s.read_queue());
            Ok(())
        })
        .build();

    Harness {
        medium,
        binding,
        options_seen,
        received,
    }
}

fn apply(h: &mut Harness, op: Op) {
    match op {
        Op::Enable => {
            let closed = h.binding.state() == BindingState::Closed;
            let result = h.binding.enable();
            if closed {
                assert!(matches!(result, Err(BindingError::Closed { .. })));
            } else {
                assert!(result.is_ok());
            }
        }
        Op::Update => h.binding.update().unwrap(),
        Op::Disable => h.binding.disable().unwrap(),
        Op::Close => h.binding.close().unwrap(),
        Op::RemoteWrite(v) => {
            let topic = h.medium.topic("prop");
            let mut remote = topic.publish();
            remote.set(v);
            remote.close().unwrap();
        }
    }
}

fn check_invariants(h: &Harness) {
    let enabled = h.binding.state() == BindingState::Enabled;
    let topic = h.medium.topic("prop");

    if !enabled {
        assert!(h.binding.publisher().is_none());
        assert!(h.binding.subscriber().is_none());
    }

    assert_eq!(
        topic.publisher_count(),
        usize::from(h.binding.publisher().is_some())
    );
    assert_eq!(
        topic.subscriber_count(),
        usize::from(h.binding.subscriber().is_some())
    );

    assert!(h.received.borrow().iter().all(|v| *v < OWN_BASE));
}

// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn endpoints_track_lifecycle(
        with_publisher in any::<bool>(),
        with_subscriber in any::<bool>(),
        ops in ops_strategy(40),
    ) {
        let mut h = harness(with_publisher, with_subscriber);
        check_invariants(&h);

        for op in ops {
            apply(&mut h, op);
            check_invariants(&h);
        }

        h.binding.close().unwrap();
        check_invariants(&h);
        prop_assert_eq!(h.binding.state(), BindingState::Closed);
    }

    #[test]
    fn exclusion_names_own_publisher(
        with_publisher in any::<bool>(),
        with_subscriber in any::<bool>(),
    ) {
        let mut h = harness(with_publisher, with_subscriber);
        h.binding.enable().unwrap();

        let seen = h.options_seen.borrow();
        prop_assert_eq!(seen.len(), 1);
        match h.binding.publisher() {
            Some(p) => prop_assert_eq!(&seen[0], &vec![PubSubOption::ExcludePublisher(p.id())]),
            None => prop_assert!(seen[0].is_empty()),
        }
    }

    #[test]
    fn double_disable_matches_single(
        ops in ops_strategy(20),
    ) {
        let mut once = harness(true, true);
        let mut twice = harness(true, true);

        for op in &ops {
            apply(&mut once, *op);
            apply(&mut twice, *op);
        }

        once.binding.disable().unwrap();
        twice.binding.disable().unwrap();
        twice.binding.disable().unwrap();

        prop_assert_eq!(format!("{:?}", once.binding), format!("{:?}", twice.binding));
        check_invariants(&once);
        check_invariants(&twice);
    }

    #[test]
    fn remote_values_arrive_in_order(
        values in proptest::collection::vec(-1000i32..1000, 1..20),
    ) {
        let mut h = harness(true, true);
        h.binding.enable().unwrap();

        for v in &values {
            apply(&mut h, Op::RemoteWrite(*v));
        }
        h.binding.update().unwrap();

        prop_assert_eq!(&*h.received.borrow(), &values);
    }
}
