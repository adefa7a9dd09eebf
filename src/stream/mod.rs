//! Push-based event streams.
//!
//! A [`Stream`] is a single-threaded broadcast node. Its producer runs once,
//! at construction, and keeps an [`Emitter`] to push values whenever the
//! underlying source fires. Operators (`map`, `filter`, `fold`, `merge`,
//! `combine`, `debounce`) are streams whose producer subscribes to the
//! parent, so a pipeline is a static push topology built once at startup.
//!
//! Delivery rules:
//! - Subscribers run synchronously, in registration order.
//! - The subscriber set is snapshotted before each fan-out. A callback added
//!   during an emission first sees the next one; a callback removed during an
//!   emission still receives the current one.
//! - A panicking subscriber is logged and skipped; the rest of the fan-out
//!   still happens.

pub mod clock;
pub mod sources;

pub use clock::{Clock, ManualClock, SystemClock};

use log::{error, warn};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::Duration;

type Callback<T> = Rc<dyn Fn(&T)>;

struct Node<T> {
    label: RefCell<String>,
    /// Slot index is the subscription id. Slots are filled in registration
    /// order and emptied in place on unsubscribe.
    subscribers: RefCell<Vec<Option<Callback<T>>>>,
    active: Cell<usize>,
    /// Subscriptions this node holds on its parents.
    upstream: RefCell<Vec<Subscription>>,
}

impl<T> Node<T> {
    fn label(&self) -> String {
        self.label.borrow().clone()
    }

    /// O(1) apart from trimming empty slots at the tail.
    fn remove(&self, id: usize) {
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            let removed = subscribers.get_mut(id).and_then(Option::take);
            // Trailing empty slots have no live handle, so they can be reused.
            while matches!(subscribers.last(), Some(None)) {
                subscribers.pop();
            }
            removed
        };
        if removed.is_some() {
            self.active.set(self.active.get() - 1);
        }
    }

    fn publish(&self, value: &T) {
        let snapshot: Vec<(usize, Callback<T>)> = self
            .subscribers
            .borrow()
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|callback| (id, Rc::clone(callback))))
            .collect();

        for (id, callback) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(value)));
            if let Err(payload) = outcome {
                error!(
                    "subscriber {} of stream '{}' panicked: {}",
                    id,
                    self.label.borrow(),
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Handle returned by [`Stream::subscribe`].
///
/// Dropping it leaves the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// The producer side of a stream.
pub struct Emitter<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> Emitter<T> {
    /// Deliver `value` to every current subscriber.
    pub fn emit(&self, value: T) {
        self.node.publish(&value);
    }

    pub fn emit_ref(&self, value: &T) {
        self.node.publish(value);
    }

    /// Keep an upstream subscription alive with this stream, so
    /// [`Stream::detach`] can release it later.
    pub fn hold(&self, subscription: Subscription) {
        self.node.upstream.borrow_mut().push(subscription);
    }

    pub fn label(&self) -> String {
        self.node.label()
    }
}

/// A push-based, multi-subscriber stream of `T`.
///
/// Cloning a `Stream` clones the handle, not the node.
pub struct Stream<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("label", &*self.node.label.borrow())
            .field("subscribers", &self.node.active.get())
            .finish()
    }
}

impl<T: 'static> Stream<T> {
    /// Create a stream bound to `producer`, which runs exactly once, now.
    pub fn new<P>(producer: P) -> Self
    where
        P: FnOnce(Emitter<T>),
    {
        let node = Rc::new(Node {
            label: RefCell::new("stream".to_string()),
            subscribers: RefCell::new(Vec::new()),
            active: Cell::new(0),
            upstream: RefCell::new(Vec::new()),
        });
        producer(Emitter {
            node: Rc::clone(&node),
        });
        Self { node }
    }

    /// Name used in log lines.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        *self.node.label.borrow_mut() = label.into();
        self
    }

    pub fn label(&self) -> String {
        self.node.label()
    }

    pub fn subscriber_count(&self) -> usize {
        self.node.active.get()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut subscribers = self.node.subscribers.borrow_mut();
            subscribers.push(Some(Rc::new(callback) as Callback<T>));
            subscribers.len() - 1
        };
        self.node.active.set(self.node.active.get() + 1);

        let node: Weak<Node<T>> = Rc::downgrade(&self.node);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(node) = node.upgrade() {
                    node.remove(id);
                }
            })),
        }
    }

    /// Release every subscription this stream holds on its parents.
    pub fn detach(&self) {
        let upstream = std::mem::take(&mut *self.node.upstream.borrow_mut());
        for subscription in upstream {
            subscription.unsubscribe();
        }
    }

    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        let parent = self.clone();
        Stream::new(move |emitter: Emitter<U>| {
            let downstream = emitter.clone();
            let subscription = parent.subscribe(move |value| downstream.emit(f(value)));
            emitter.hold(subscription);
        })
        .with_label(format!("{}.map", self.label()))
    }

    /// Pass through only the values `predicate` accepts.
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let parent = self.clone();
        Stream::new(move |emitter: Emitter<T>| {
            let downstream = emitter.clone();
            let subscription = parent.subscribe(move |value| {
                if predicate(value) {
                    downstream.emit_ref(value);
                }
            });
            emitter.hold(subscription);
        })
        .with_label(format!("{}.filter", self.label()))
    }

    /// Running left fold: every parent value produces `state = f(value, state)`
    /// and the new state is emitted.
    ///
    /// The accumulator lives in this node only. If `f` panics the
    /// accumulator is lost and later values are dropped.
    pub fn fold<S, F>(&self, f: F, initial: S) -> Stream<S>
    where
        S: 'static,
        F: Fn(&T, S) -> S + 'static,
    {
        let parent = self.clone();
        let label = format!("{}.fold", self.label());
        Stream::new(move |emitter: Emitter<S>| {
            let accumulator = Accumulator::new(initial);
            let downstream = emitter.clone();
            let subscription =
                parent.subscribe(move |value| accumulator.step(value, &f, &downstream));
            emitter.hold(subscription);
        })
        .with_label(label)
    }

    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        Stream::combine([self, other])
    }

    /// Re-emit every value of every input, in arrival order.
    pub fn combine<'a, I>(streams: I) -> Stream<T>
    where
        I: IntoIterator<Item = &'a Stream<T>>,
    {
        let parents: Vec<Stream<T>> = streams.into_iter().cloned().collect();
        let label = format!(
            "combine({})",
            parents
                .iter()
                .map(Stream::label)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Stream::new(move |emitter: Emitter<T>| {
            for parent in &parents {
                let downstream = emitter.clone();
                let subscription = parent.subscribe(move |value| downstream.emit_ref(value));
                emitter.hold(subscription);
            }
        })
        .with_label(label)
    }

    /// Leading-edge rate limit using the system clock.
    pub fn debounce(&self, window: Duration) -> Stream<T> {
        self.debounce_with_clock(window, Rc::new(SystemClock::new()))
    }

    /// Pass a value only if more than `window` has elapsed since the last
    /// value that passed. The first value always passes; dropped values are
    /// gone.
    pub fn debounce_with_clock(&self, window: Duration, clock: Rc<dyn Clock>) -> Stream<T> {
        let parent = self.clone();
        Stream::new(move |emitter: Emitter<T>| {
            let last_passed: Cell<Option<Duration>> = Cell::new(None);
            let downstream = emitter.clone();
            let subscription = parent.subscribe(move |value| {
                let now = clock.now();
                let due = match last_passed.get() {
                    None => true,
                    Some(last) => now.saturating_sub(last) > window,
                };
                if due {
                    last_passed.set(Some(now));
                    downstream.emit_ref(value);
                }
            });
            emitter.hold(subscription);
        })
        .with_label(format!("{}.debounce", self.label()))
    }
}

struct Accumulator<S> {
    state: RefCell<Option<S>>,
}

impl<S> Accumulator<S> {
    fn new(initial: S) -> Self {
        Self {
            state: RefCell::new(Some(initial)),
        }
    }

    fn step<T, F>(&self, value: &T, f: &F, emitter: &Emitter<S>)
    where
        F: Fn(&T, S) -> S,
    {
        {
            let Ok(mut slot) = self.state.try_borrow_mut() else {
                warn!(
                    "re-entrant emission into '{}' dropped",
                    emitter.node.label.borrow()
                );
                return;
            };
            let Some(current) = slot.take() else {
                warn!(
                    "'{}' lost its accumulator to a panic; dropping emission",
                    emitter.node.label.borrow()
                );
                return;
            };
            *slot = Some(f(value, current));
        }

        let slot = self.state.borrow();
        if let Some(state) = slot.as_ref() {
            emitter.emit_ref(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A stream whose emitter is handed back to the test.
    fn source<T: 'static>() -> (Stream<T>, Emitter<T>) {
        let slot: RefCell<Option<Emitter<T>>> = RefCell::new(None);
        let stream = Stream::new(|emitter| *slot.borrow_mut() = Some(emitter));
        let emitter = slot.into_inner().unwrap();
        (stream, emitter)
    }

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> Rc<RefCell<Vec<T>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _ = stream.subscribe(move |v: &T| sink.borrow_mut().push(v.clone()));
        seen
    }

    #[test]
    fn test_producer_runs_once_at_construction() {
        let calls = Cell::new(0);
        let _stream: Stream<i32> = Stream::new(|_| calls.set(calls.get() + 1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_subscribers_called_in_registration_order() {
        let (stream, emitter) = source::<i32>();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            let _ = stream.subscribe(move |v| order.borrow_mut().push(format!("{tag}{v}")));
        }
        emitter.emit(1);
        assert_eq!(*order.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (stream, emitter) = source::<i32>();
        let seen = collect(&stream);
        let other = Rc::new(Cell::new(0));
        let counter = Rc::clone(&other);
        let sub = stream.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(stream.subscriber_count(), 2);

        emitter.emit(1);
        sub.unsubscribe();
        emitter.emit(2);

        assert_eq!(other.get(), 1);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(stream.subscriber_count(), 1);
    }

    #[test]
    fn test_subscriber_added_during_fanout_sees_next_emission() {
        let (stream, emitter) = source::<i32>();
        let late = Rc::new(RefCell::new(Vec::new()));
        let handle = stream.clone();
        let late_sink = Rc::clone(&late);
        let added = Cell::new(false);
        let _ = stream.subscribe(move |_| {
            if !added.replace(true) {
                let sink = Rc::clone(&late_sink);
                let _ = handle.subscribe(move |v| sink.borrow_mut().push(*v));
            }
        });

        emitter.emit(1);
        assert!(late.borrow().is_empty());
        emitter.emit(2);
        assert_eq!(*late.borrow(), vec![2]);
    }

    #[test]
    fn test_subscriber_removed_during_fanout_still_gets_current_value() {
        let (stream, emitter) = source::<i32>();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&victim);
        let _ = stream.subscribe(move |_| {
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        *victim.borrow_mut() = Some(stream.subscribe(move |v: &i32| sink.borrow_mut().push(*v)));

        emitter.emit(1);
        emitter.emit(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(stream.subscriber_count(), 1);
    }

    #[test]
    fn test_removed_slots_keep_order_and_are_reused_at_the_tail() {
        let (stream, emitter) = source::<i32>();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for tag in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            subs.push(stream.subscribe(move |_| order.borrow_mut().push(tag)));
        }
        let c = subs.pop().unwrap();
        let b = subs.pop().unwrap();
        b.unsubscribe();
        emitter.emit(0);
        assert_eq!(*order.borrow(), vec!["a", "c"]);

        c.unsubscribe();
        assert_eq!(stream.subscriber_count(), 1);
        assert_eq!(stream.node.subscribers.borrow().len(), 1);

        let late = Rc::clone(&order);
        let _ = stream.subscribe(move |_| late.borrow_mut().push("d"));
        order.borrow_mut().clear();
        emitter.emit(0);
        assert_eq!(*order.borrow(), vec!["a", "d"]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_break_fanout() {
        let (stream, emitter) = source::<i32>();
        let _ = stream.subscribe(|v| {
            if *v == 2 {
                panic!("bad consumer");
            }
        });
        let seen = collect(&stream);

        emitter.emit(1);
        emitter.emit(2);
        emitter.emit(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_map_transforms_values() {
        let (stream, emitter) = source::<i32>();
        let doubled = stream.map(|v| v * 2);
        let seen = collect(&doubled);
        emitter.emit(3);
        emitter.emit(4);
        assert_eq!(*seen.borrow(), vec![6, 8]);
        assert_eq!(doubled.label(), "stream.map");
    }

    #[test]
    fn test_filter_drops_rejected_values() {
        let (stream, emitter) = source::<i32>();
        let evens = stream.filter(|v| v % 2 == 0);
        let seen = collect(&evens);
        for v in 1..=6 {
            emitter.emit(v);
        }
        assert_eq!(*seen.borrow(), vec![2, 4, 6]);
    }

    #[test]
    fn test_fold_emits_running_state() {
        let (stream, emitter) = source::<i32>();
        let sums = stream.fold(|v, acc: i32| acc + v, 10);
        let seen = collect(&sums);
        for v in [1, 2, 3] {
            emitter.emit(v);
        }
        assert_eq!(*seen.borrow(), vec![11, 13, 16]);
    }

    #[test]
    fn test_fold_state_is_private_per_operator() {
        let (stream, emitter) = source::<i32>();
        let a = stream.fold(|_, acc: u32| acc + 1, 0);
        let b = stream.fold(|_, acc: u32| acc + 1, 100);
        let seen_a = collect(&a);
        let seen_b = collect(&b);
        emitter.emit(0);
        emitter.emit(0);
        assert_eq!(*seen_a.borrow(), vec![1, 2]);
        assert_eq!(*seen_b.borrow(), vec![101, 102]);
    }

    #[test]
    fn test_fold_is_poisoned_after_panic() {
        let (stream, emitter) = source::<i32>();
        let folded = stream.fold(
            |v, acc: i32| {
                if *v < 0 {
                    panic!("negative");
                }
                acc + v
            },
            0,
        );
        let seen = collect(&folded);
        emitter.emit(1);
        emitter.emit(-1);
        emitter.emit(5);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_reentrant_emission_into_fold_is_dropped() {
        let (stream, emitter) = source::<i32>();
        let sums = stream.fold(|v, acc: i32| acc + v, 0);
        let seen = collect(&sums);
        let again = emitter.clone();
        let _ = sums.subscribe(move |total| {
            if *total == 1 {
                again.emit(100);
            }
        });

        emitter.emit(1);
        emitter.emit(2);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn test_combine_interleaves_in_firing_order() {
        let (a, emit_a) = source::<&'static str>();
        let (b, emit_b) = source::<&'static str>();
        let both = Stream::combine([&a, &b]);
        let seen = collect(&both);

        emit_a.emit("a1");
        emit_b.emit("b1");
        emit_b.emit("b2");
        emit_a.emit("a2");

        assert_eq!(*seen.borrow(), vec!["a1", "b1", "b2", "a2"]);
    }

    #[test]
    fn test_merge_is_combine_of_two() {
        let (a, emit_a) = source::<i32>();
        let (b, emit_b) = source::<i32>();
        let merged = a.merge(&b);
        let seen = collect(&merged);
        emit_b.emit(2);
        emit_a.emit(1);
        assert_eq!(*seen.borrow(), vec![2, 1]);
    }

    #[test]
    fn test_debounce_is_leading_edge() {
        let (stream, emitter) = source::<u64>();
        let clock = Rc::new(ManualClock::new());
        let limited = stream.debounce_with_clock(Duration::from_millis(15), clock.clone());
        let seen = collect(&limited);

        for t in [0, 5, 10, 20, 36] {
            clock.set_millis(t);
            emitter.emit(t);
        }
        assert_eq!(*seen.borrow(), vec![0, 20, 36]);
    }

    #[test]
    fn test_debounce_boundary_is_strict() {
        let (stream, emitter) = source::<u64>();
        let clock = Rc::new(ManualClock::new());
        let limited = stream.debounce_with_clock(Duration::from_millis(15), clock.clone());
        let seen = collect(&limited);

        for t in [100, 115, 116] {
            clock.set_millis(t);
            emitter.emit(t);
        }
        assert_eq!(*seen.borrow(), vec![100, 116]);
    }

    #[test]
    fn test_detach_releases_parent() {
        let (stream, emitter) = source::<i32>();
        let mapped = stream.map(|v| v + 1);
        let seen = collect(&mapped);
        assert_eq!(stream.subscriber_count(), 1);

        emitter.emit(1);
        mapped.detach();
        emitter.emit(2);

        assert_eq!(stream.subscriber_count(), 0);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn test_derived_stream_outlives_its_handle() {
        let (stream, emitter) = source::<i32>();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let sink = Rc::clone(&seen);
            let _ = stream.map(|v| v * 10).subscribe(move |v| sink.borrow_mut().push(*v));
        }
        emitter.emit(1);
        assert_eq!(*seen.borrow(), vec![10]);
    }
}
