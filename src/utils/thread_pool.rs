use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

static THREAD_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Upper bound on the default pool size when nothing is configured.
const DEFAULT_MAX_THREADS: usize = 8;

/// Worker stack size, matching the main thread rather than rayon's 2 MiB.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Build a standalone pool with arbor's worker naming
///
/// # Errors
///
/// Returns an error if rayon cannot spawn the worker threads
pub fn build_thread_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("arbor-worker-{i}"))
        .stack_size(WORKER_STACK_SIZE)
        .build()?)
}

/// Initialize the global thread pool with the specified number of threads
///
/// # Errors
///
/// Returns an error if the thread pool cannot be initialized or already was
pub fn init_thread_pool(num_threads: usize) -> anyhow::Result<()> {
    let pool = build_thread_pool(num_threads)?;

    THREAD_POOL
        .set(Arc::new(pool))
        .map_err(|_| anyhow::anyhow!("Thread pool already initialized"))?;

    tracing::debug!(threads = num_threads, "initialized worker pool");
    Ok(())
}

/// Get the global thread pool, initializing with default settings if needed
///
/// # Panics
///
/// Panics if the thread pool cannot be created
pub fn get_thread_pool() -> Arc<rayon::ThreadPool> {
    THREAD_POOL
        .get_or_init(|| {
            let num_threads = default_threads();
            let pool = build_thread_pool(num_threads).expect("Failed to create thread pool");
            Arc::new(pool)
        })
        .clone()
}

/// Default worker count: available parallelism, capped.
#[must_use]
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(DEFAULT_MAX_THREADS)
}

/// Configure the global pool from config
///
/// # Errors
///
/// Returns an error if the thread pool has already been initialized
pub fn configure_from_config(config: &crate::config::Config) -> anyhow::Result<()> {
    init_thread_pool(config.performance.parallel_threads)
}
