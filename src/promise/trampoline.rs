//! Per-thread job queue that keeps settlement cascades off the stack.
//!
//! A subscriber that settles another deferred runs that deferred's
//! subscribers on the same stack, so a chain of levels waiting on each other
//! grows the stack once per link. [`schedule`] runs a job directly when the
//! thread is idle and queues it when another scheduled job is already running
//! further up the stack; the outermost call drains the queue before
//! returning.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::mem;

type Job = Box<dyn FnOnce()>;

thread_local! {
    static DRAINING: Cell<bool> = const { Cell::new(false) };
    static QUEUE: RefCell<VecDeque<Job>> = const { RefCell::new(VecDeque::new()) };
}

/// Runs `job` on this thread, after any job already queued here.
///
/// Returns once the queue is empty, unless it was called from inside a
/// scheduled job, in which case it returns immediately and the job runs when
/// the outer call gets to it.
pub(crate) fn schedule<F>(job: F)
where
    F: FnOnce() + 'static,
{
    if DRAINING.with(Cell::get) {
        QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(job)));
        return;
    }

    let _draining = Draining::enter();
    job();
    while let Some(next) = QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
        next();
    }
}

struct Draining;

impl Draining {
    fn enter() -> Self {
        DRAINING.with(|draining| draining.set(true));
        Self
    }
}

impl Drop for Draining {
    fn drop(&mut self) {
        DRAINING.with(|draining| draining.set(false));
        if std::thread::panicking() {
            // dropped outside the borrow
            let stale = QUEUE.with(|queue| mem::take(&mut *queue.borrow_mut()));
            drop(stale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_idle_thread_runs_job_before_returning() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);

        schedule(move || flag.set(true));

        assert!(ran.get());
    }

    #[test]
    fn test_nested_jobs_run_after_the_current_one() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let outer = Rc::clone(&log);

        schedule(move || {
            let inner = Rc::clone(&outer);
            schedule(move || inner.borrow_mut().push("inner"));
            outer.borrow_mut().push("outer");
        });

        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_long_chain_does_not_nest() {
        fn step(remaining: usize, depth: Rc<Cell<usize>>, max: Rc<Cell<usize>>) {
            depth.set(depth.get() + 1);
            max.set(max.get().max(depth.get()));
            if remaining > 0 {
                let (depth, max) = (Rc::clone(&depth), Rc::clone(&max));
                schedule(move || step(remaining - 1, depth, max));
            }
            depth.set(depth.get() - 1);
        }

        let max = Rc::new(Cell::new(0));
        let (depth, seen) = (Rc::new(Cell::new(0)), Rc::clone(&max));
        schedule(move || step(100_000, depth, seen));

        assert_eq!(max.get(), 1);
    }

    #[test]
    fn test_panicking_job_leaves_thread_usable() {
        let result = std::panic::catch_unwind(|| {
            schedule(|| {
                schedule(|| unreachable!("queued behind a panic"));
                panic!("job failed");
            });
        });
        assert!(result.is_err());

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        schedule(move || flag.set(true));
        assert!(ran.get());
    }
}
