//! Single-resolution deferred values with subscriber replay.
//!
//! A [`Deferred`] is owned by whoever will eventually complete a piece of
//! asynchronous work. It hands out read-only [`Promise`] views that other
//! parties can subscribe to without being able to forge the outcome.
//!
//! Settlement is exactly-once: the first [`Deferred::fulfill`] or
//! [`Deferred::reject`] wins and every later call is ignored, which makes it
//! safe for racing completions to all try to settle the same value.
//!
//! Subscribers registered while pending fire at transition time, in
//! registration order: first the channel matching the outcome, then the
//! `on_settled` channel. Subscribers registered after settlement are invoked
//! synchronously, on the subscribing thread, with the captured payload.
//!
//! There is deliberately no blocking wait. Code that needs one (a CLI `main`,
//! a test) bridges a subscriber into a channel.
//!
//! ```
//! use arbor::promise::Deferred;
//! use std::sync::{Arc, Mutex};
//!
//! let deferred: Deferred<u32, String> = Deferred::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! deferred.promise().on_fulfilled(move |value| sink.lock().unwrap().push(*value));
//!
//! deferred.fulfill(7);
//! deferred.fulfill(8); // ignored
//! assert_eq!(*seen.lock().unwrap(), vec![7]);
//! ```

/// Fan-in over a known number of steps.
pub mod resolver;
pub(crate) mod trampoline;

pub use resolver::MultiStepResolver;

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle state of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not yet settled.
    Pending,
    /// Settled successfully.
    Fulfilled,
    /// Settled with a failure.
    Rejected,
}

/// Payload captured at the moment of settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The fulfilment value.
    Fulfilled(T),
    /// The rejection reason.
    Rejected(E),
}

impl<T, E> Outcome<T, E> {
    /// The state this outcome represents.
    #[must_use]
    pub const fn state(&self) -> State {
        match self {
            Self::Fulfilled(_) => State::Fulfilled,
            Self::Rejected(_) => State::Rejected,
        }
    }

    /// Borrows the outcome as a `Result`.
    pub const fn as_result(&self) -> Result<&T, &E> {
        match self {
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

type Callback<A> = Box<dyn FnOnce(&A) + Send>;

/// Queued callbacks, one list per channel.
struct Subscribers<T, E> {
    /// Fired on fulfilment.
    fulfilled: Vec<Callback<T>>,
    /// Fired on rejection.
    rejected: Vec<Callback<E>>,
    /// Fired on either outcome, after the matching channel.
    settled: Vec<Callback<Outcome<T, E>>>,
}

impl<T, E> Default for Subscribers<T, E> {
    fn default() -> Self {
        Self {
            fulfilled: Vec::new(),
            rejected: Vec::new(),
            settled: Vec::new(),
        }
    }
}

impl<T, E> Subscribers<T, E> {
    fn dispatch(self, outcome: &Outcome<T, E>) {
        match outcome {
            Outcome::Fulfilled(value) => {
                for callback in self.fulfilled {
                    callback(value);
                }
            }
            Outcome::Rejected(reason) => {
                for callback in self.rejected {
                    callback(reason);
                }
            }
        }
        for callback in self.settled {
            callback(outcome);
        }
    }
}

enum Slot<T, E> {
    Pending(Subscribers<T, E>),
    Settled(Arc<Outcome<T, E>>),
}

struct Shared<T, E> {
    slot: Mutex<Slot<T, E>>,
}

impl<T, E> Shared<T, E> {
    // Callbacks never run while the guard is held, so a poisoned lock only
    // means a panic elsewhere; the slot itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slot<T, E>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: Outcome<T, E>) -> bool {
        let (outcome, subscribers) = {
            let mut slot = self.lock();
            let subscribers = match &mut *slot {
                Slot::Settled(_) => return false,
                Slot::Pending(subscribers) => mem::take(subscribers),
            };
            let outcome = Arc::new(outcome);
            *slot = Slot::Settled(Arc::clone(&outcome));
            (outcome, subscribers)
        };
        subscribers.dispatch(&outcome);
        true
    }

    fn state(&self) -> State {
        match &*self.lock() {
            Slot::Pending(_) => State::Pending,
            Slot::Settled(outcome) => outcome.state(),
        }
    }

    fn outcome(&self) -> Option<Arc<Outcome<T, E>>> {
        match &*self.lock() {
            Slot::Pending(_) => None,
            Slot::Settled(outcome) => Some(Arc::clone(outcome)),
        }
    }
}

/// Read-only view onto a settlement.
///
/// Cloning is cheap; every clone observes the same state.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Registers a callback for fulfilment.
    ///
    /// Runs immediately if the settlement is already fulfilled, never if it
    /// was rejected.
    pub fn on_fulfilled<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let outcome = {
            let mut slot = self.shared.lock();
            match &mut *slot {
                Slot::Pending(subscribers) => {
                    subscribers.fulfilled.push(Box::new(callback));
                    return self;
                }
                Slot::Settled(outcome) => Arc::clone(outcome),
            }
        };
        if let Outcome::Fulfilled(value) = &*outcome {
            callback(value);
        }
        self
    }

    /// Registers a callback for rejection.
    ///
    /// Runs immediately if the settlement is already rejected, never if it
    /// was fulfilled.
    pub fn on_rejected<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let outcome = {
            let mut slot = self.shared.lock();
            match &mut *slot {
                Slot::Pending(subscribers) => {
                    subscribers.rejected.push(Box::new(callback));
                    return self;
                }
                Slot::Settled(outcome) => Arc::clone(outcome),
            }
        };
        if let Outcome::Rejected(reason) = &*outcome {
            callback(reason);
        }
        self
    }

    /// Registers a callback for either outcome.
    pub fn on_settled<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(&Outcome<T, E>) + Send + 'static,
    {
        let outcome = {
            let mut slot = self.shared.lock();
            match &mut *slot {
                Slot::Pending(subscribers) => {
                    subscribers.settled.push(Box::new(callback));
                    return self;
                }
                Slot::Settled(outcome) => Arc::clone(outcome),
            }
        };
        callback(&outcome);
        self
    }
}

impl<T, E> Promise<T, E> {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// The captured payload, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Arc<Outcome<T, E>>> {
        self.shared.outcome()
    }

    /// Whether both handles refer to the same settlement.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// Owning handle of a settlement: everything a [`Promise`] can do, plus the
/// transition operations.
///
/// Clones share the same settlement. Hand clones only to code that is meant
/// to complete the work; give everyone else [`Deferred::promise`].
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a new pending settlement.
#[must_use]
pub fn deferred<T, E>() -> Deferred<T, E> {
    Deferred::new()
}

impl<T, E> Deferred<T, E> {
    /// Creates a new pending settlement with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::Pending(Subscribers::default())),
            }),
        }
    }

    /// Returns a read-only view of this settlement.
    #[must_use]
    pub fn promise(&self) -> Promise<T, E> {
        Promise {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Fulfils the settlement. Returns `false` if it was already settled.
    pub fn fulfill(&self, value: T) -> bool {
        self.shared.settle(Outcome::Fulfilled(value))
    }

    /// Rejects the settlement. Returns `false` if it was already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.shared.settle(Outcome::Rejected(reason))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// The captured payload, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Arc<Outcome<T, E>>> {
        self.shared.outcome()
    }
}

impl<T, E> Deferred<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// See [`Promise::on_fulfilled`].
    pub fn on_fulfilled<F>(&self, callback: F) -> Promise<T, E>
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let promise = self.promise();
        promise.on_fulfilled(callback);
        promise
    }

    /// See [`Promise::on_rejected`].
    pub fn on_rejected<F>(&self, callback: F) -> Promise<T, E>
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let promise = self.promise();
        promise.on_rejected(callback);
        promise
    }

    /// See [`Promise::on_settled`].
    pub fn on_settled<F>(&self, callback: F) -> Promise<T, E>
    where
        F: FnOnce(&Outcome<T, E>) + Send + 'static,
    {
        let promise = self.promise();
        promise.on_settled(callback);
        promise
    }

    /// Adapts a `Result`-reporting completion into this settlement.
    ///
    /// The returned closure fulfils on `Ok` and rejects on `Err`, converting
    /// the payloads with `Into`. Typical use is handing it to a callback API:
    ///
    /// ```
    /// use arbor::promise::{Deferred, State};
    ///
    /// fn read_later(done: impl FnOnce(std::io::Result<String>)) {
    ///     done(Ok("contents".to_string()));
    /// }
    ///
    /// let read: Deferred<String, std::io::Error> = Deferred::new();
    /// read_later(read.resolver::<String, std::io::Error>());
    /// assert_eq!(read.state(), State::Fulfilled);
    /// ```
    pub fn resolver<A, B>(&self) -> impl FnOnce(Result<A, B>) + Send + 'static
    where
        A: Into<T> + 'static,
        B: Into<E> + 'static,
    {
        let deferred = self.clone();
        move |result| match result {
            Ok(value) => {
                deferred.fulfill(value.into());
            }
            Err(reason) => {
                deferred.reject(reason.into());
            }
        }
    }

    /// Creates a fan-in counter that fulfils this settlement with `context`
    /// after `count` calls to [`MultiStepResolver::step_complete`].
    ///
    /// A `count` of zero fulfils immediately.
    pub fn multi_step_resolver(&self, count: usize, context: T) -> MultiStepResolver<T, E> {
        MultiStepResolver::new(self.clone(), count, context)
    }
}

impl<C, D, X> Deferred<(C, D), (C, X)>
where
    C: Send + Sync + 'static,
    D: Send + Sync + 'static,
    X: Send + Sync + 'static,
{
    /// Like [`Deferred::resolver`], but binds a context value that is paired
    /// with the payload on either outcome: `(context, data)` on success,
    /// `(context, error)` on failure.
    pub fn resolver_with<A, B>(&self, context: C) -> impl FnOnce(Result<A, B>) + Send + 'static
    where
        A: Into<D> + 'static,
        B: Into<X> + 'static,
    {
        let deferred = self.clone();
        move |result| match result {
            Ok(data) => {
                deferred.fulfill((context, data.into()));
            }
            Err(error) => {
                deferred.reject((context, error.into()));
            }
        }
    }
}

/// Partition state accumulated by [`all`].
struct Partition<T, E, F> {
    fulfilled: Vec<Promise<T, E>>,
    rejected: Vec<Promise<T, E>>,
    callback: Option<F>,
    total: usize,
}

/// Waits for every promise to settle, then calls
/// `callback(fulfilled, rejected)` exactly once.
///
/// Each list holds the members that took that outcome, in the order they
/// settled. Individual rejections do not fail the group; the callback decides
/// what a rejection means. An empty input invokes the callback immediately.
pub fn all<T, E, F>(promises: &[Promise<T, E>], callback: F)
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
    F: FnOnce(Vec<Promise<T, E>>, Vec<Promise<T, E>>) + Send + 'static,
{
    if promises.is_empty() {
        callback(Vec::new(), Vec::new());
        return;
    }

    let partition = Arc::new(Mutex::new(Partition {
        fulfilled: Vec::with_capacity(promises.len()),
        rejected: Vec::new(),
        callback: Some(callback),
        total: promises.len(),
    }));

    for promise in promises {
        let member = promise.clone();
        let partition = Arc::clone(&partition);
        promise.on_settled(move |outcome| {
            let ready = {
                let mut partition = partition.lock().unwrap_or_else(PoisonError::into_inner);
                match outcome {
                    Outcome::Fulfilled(_) => partition.fulfilled.push(member),
                    Outcome::Rejected(_) => partition.rejected.push(member),
                }
                if partition.fulfilled.len() + partition.rejected.len() == partition.total {
                    partition.callback.take().map(|callback| {
                        (
                            callback,
                            mem::take(&mut partition.fulfilled),
                            mem::take(&mut partition.rejected),
                        )
                    })
                } else {
                    None
                }
            };
            if let Some((callback, fulfilled, rejected)) = ready {
                callback(fulfilled, rejected);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone + Send + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |entry: &str| sink.lock().unwrap().push(entry.to_string()))
    }

    #[test]
    fn test_fulfill_invokes_success_and_done_callbacks() {
        let deferred: Deferred<&'static str, &'static str> = Deferred::new();
        let (log, record) = recorder();

        let (a, b, c) = (record.clone(), record.clone(), record);
        deferred
            .promise()
            .on_settled(move |_| a("settled"))
            .on_fulfilled(move |v| b(&format!("fulfilled:{v}")))
            .on_rejected(move |_| c("rejected"));

        assert!(deferred.fulfill("ok"));
        // Matching channel first, then on_settled.
        assert_eq!(*log.lock().unwrap(), vec!["fulfilled:ok", "settled"]);
        assert_eq!(deferred.state(), State::Fulfilled);
    }

    #[test]
    fn test_reject_invokes_fail_and_done_callbacks() {
        let deferred: Deferred<(), String> = Deferred::new();
        let (log, record) = recorder();

        let (a, b, c) = (record.clone(), record.clone(), record);
        deferred
            .promise()
            .on_fulfilled(move |()| a("fulfilled"))
            .on_rejected(move |e| b(&format!("rejected:{e}")))
            .on_settled(move |_| c("settled"));

        assert!(deferred.reject("boom".to_string()));
        assert_eq!(*log.lock().unwrap(), vec!["rejected:boom", "settled"]);
    }

    #[test]
    fn test_only_first_settle_counts() {
        let deferred: Deferred<u8, u8> = Deferred::new();
        let (log, record) = recorder();
        deferred.on_settled(move |o| record(&format!("{o:?}")));

        assert!(deferred.fulfill(1));
        assert!(!deferred.fulfill(2));
        assert!(!deferred.reject(3));

        assert_eq!(*log.lock().unwrap(), vec!["Fulfilled(1)"]);
        assert_eq!(deferred.outcome().as_deref(), Some(&Outcome::Fulfilled(1)));
    }

    #[test]
    fn test_late_subscriber_is_replayed_synchronously() {
        let deferred: Deferred<u8, u8> = Deferred::new();
        deferred.reject(9);

        let (log, record) = recorder();
        let (a, b) = (record.clone(), record);
        let promise = deferred.promise();
        promise
            .on_fulfilled(move |_| a("fulfilled"))
            .on_rejected(move |r| b(&format!("rejected:{r}")));

        // No waiting: the callback already ran.
        assert_eq!(*log.lock().unwrap(), vec!["rejected:9"]);
    }

    #[test]
    fn test_callbacks_fire_in_registration_order() {
        let deferred: Deferred<(), ()> = Deferred::new();
        let (log, record) = recorder();
        for i in 0..5 {
            let record = record.clone();
            deferred.on_fulfilled(move |()| record(&i.to_string()));
        }
        deferred.fulfill(());
        assert_eq!(*log.lock().unwrap(), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_callback_may_subscribe_to_its_own_settlement() {
        let deferred: Deferred<u8, ()> = Deferred::new();
        let promise = deferred.promise();
        let (tx, rx) = mpsc::channel();

        let inner = promise.clone();
        promise.on_fulfilled(move |_| {
            let tx = tx.clone();
            inner.on_fulfilled(move |v| tx.send(*v).unwrap());
        });
        deferred.fulfill(4);

        assert_eq!(rx.try_recv(), Ok(4));
    }

    #[test]
    fn test_resolver_adapts_results() {
        let ok: Deferred<String, String> = Deferred::new();
        (ok.resolver::<&str, &str>())(Ok("data"));
        assert_eq!(
            ok.outcome().as_deref(),
            Some(&Outcome::Fulfilled("data".to_string()))
        );

        let err: Deferred<String, String> = Deferred::new();
        (err.resolver::<&str, &str>())(Err("nope"));
        assert_eq!(
            err.outcome().as_deref(),
            Some(&Outcome::Rejected("nope".to_string()))
        );
    }

    #[test]
    fn test_resolver_with_prepends_context() {
        let deferred: Deferred<(&str, u32), (&str, String)> = Deferred::new();
        (deferred.resolver_with::<u32, String>("ctx"))(Err("bad".to_string()));
        assert_eq!(
            deferred.outcome().as_deref(),
            Some(&Outcome::Rejected(("ctx", "bad".to_string())))
        );
    }

    #[test]
    fn test_view_shares_state_with_owner() {
        let deferred: Deferred<(), ()> = Deferred::new();
        let promise = deferred.promise();
        assert_eq!(promise.state(), State::Pending);
        assert!(promise.outcome().is_none());
        deferred.fulfill(());
        assert_eq!(promise.state(), State::Fulfilled);
        assert!(promise.ptr_eq(&deferred.promise()));
    }

    #[test]
    fn test_all_with_no_promises_fires_immediately() {
        let (tx, rx) = mpsc::channel();
        all::<(), (), _>(&[], move |ok, failed| {
            tx.send((ok.len(), failed.len())).unwrap();
        });
        assert_eq!(rx.try_recv(), Ok((0, 0)));
    }

    #[test]
    fn test_all_partitions_in_completion_order() {
        let members: Vec<Deferred<u8, u8>> = (0..3).map(|_| Deferred::new()).collect();
        let promises: Vec<_> = members.iter().map(Deferred::promise).collect();
        let (tx, rx) = mpsc::channel();

        all(&promises, move |ok, failed| {
            tx.send((ok, failed)).unwrap();
        });

        members[2].fulfill(2);
        members[0].reject(0);
        assert!(rx.try_recv().is_err());
        members[1].fulfill(1);

        let (ok, failed) = rx.try_recv().unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok[0].ptr_eq(&promises[2]));
        assert!(ok[1].ptr_eq(&promises[1]));
        assert_eq!(failed.len(), 1);
        assert!(failed[0].ptr_eq(&promises[0]));
        assert!(rx.try_recv().is_err());
    }
}
