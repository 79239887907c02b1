use super::Deferred;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Fan-in counter that settles an owning [`Deferred`] after a fixed number
/// of completion signals.
///
/// Obtained from [`Deferred::multi_step_resolver`]. Clones share the counter,
/// so each concurrent sub-operation can hold its own handle. Once the owner is
/// settled (by the final step or by [`reject`](Self::reject)), further signals
/// are absorbed.
pub struct MultiStepResolver<T, E> {
    /// Settlement completed by this counter.
    owner: Deferred<T, E>,
    /// Steps still outstanding.
    remaining: Arc<AtomicUsize>,
    /// Fulfilment value used when the final step carries none.
    context: Arc<Mutex<Option<T>>>,
}

impl<T, E> Clone for MultiStepResolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            remaining: Arc::clone(&self.remaining),
            context: Arc::clone(&self.context),
        }
    }
}

impl<T, E> MultiStepResolver<T, E> {
    pub(super) fn new(owner: Deferred<T, E>, count: usize, context: T) -> Self {
        if count == 0 {
            owner.fulfill(context);
            return Self {
                owner,
                remaining: Arc::new(AtomicUsize::new(0)),
                context: Arc::new(Mutex::new(None)),
            };
        }

        Self {
            owner,
            remaining: Arc::new(AtomicUsize::new(count)),
            context: Arc::new(Mutex::new(Some(context))),
        }
    }

    /// Marks one step as done. The final step fulfils the owner with the
    /// context value given at creation.
    pub fn step_complete(&self) {
        if self.finish_step() {
            let context = self
                .context
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(context) = context {
                self.owner.fulfill(context);
            }
        }
    }

    /// Marks one step as done. If it is the final step, the owner is
    /// fulfilled with `value` instead of the context; otherwise `value` is
    /// dropped.
    pub fn step_complete_with(&self, value: T) {
        if self.finish_step() {
            self.context
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            self.owner.fulfill(value);
        }
    }

    /// Rejects the owner right away, regardless of the remaining count.
    pub fn reject(&self, reason: E) {
        self.owner.reject(reason);
    }

    /// Steps still outstanding.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Returns `true` when this call took the counter from one to zero.
    /// Calls past zero are ignored.
    fn finish_step(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            == Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::{Outcome, State};

    #[test]
    fn test_zero_steps_fulfil_immediately_with_context() {
        let owner: Deferred<&str, &str> = Deferred::new();
        let resolver = owner.multi_step_resolver(0, "ctx");

        assert_eq!(owner.outcome().as_deref(), Some(&Outcome::Fulfilled("ctx")));
        assert_eq!(resolver.remaining(), 0);
    }

    #[test]
    fn test_fulfils_only_after_last_step() {
        let owner: Deferred<&str, &str> = Deferred::new();
        let resolver = owner.multi_step_resolver(5, "ctx");

        for _ in 0..4 {
            resolver.step_complete();
            assert_eq!(owner.state(), State::Pending);
        }
        resolver.step_complete_with("last");
        assert_eq!(owner.outcome().as_deref(), Some(&Outcome::Fulfilled("last")));
    }

    #[test]
    fn test_reject_short_circuits_remaining_steps() {
        let owner: Deferred<(), &str> = Deferred::new();
        let resolver = owner.multi_step_resolver(3, ());

        resolver.step_complete();
        resolver.reject("broken");
        resolver.step_complete();
        resolver.step_complete();

        assert_eq!(owner.outcome().as_deref(), Some(&Outcome::Rejected("broken")));
    }

    #[test]
    fn test_extra_steps_are_ignored() {
        let owner: Deferred<u8, ()> = Deferred::new();
        let resolver = owner.multi_step_resolver(1, 1);
        let clone = resolver.clone();

        resolver.step_complete();
        clone.step_complete_with(2);

        assert_eq!(owner.outcome().as_deref(), Some(&Outcome::Fulfilled(1)));
        assert_eq!(clone.remaining(), 0);
    }
}
