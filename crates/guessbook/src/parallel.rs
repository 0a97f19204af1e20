//! Thread pool for parallel simulation runs

use rayon::ThreadPool;
use std::sync::OnceLock;

/// Crate-local pool; `None` if no pool could be built
static RAYON_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

fn desired_threads() -> usize {
    std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
}

fn build_pool() -> Option<ThreadPool> {
    let requested = desired_threads();
    let try_build = |n| rayon::ThreadPoolBuilder::new().num_threads(n).build();

    match try_build(requested) {
        Ok(pool) => Some(pool),
        Err(e) if requested > 1 => {
            tracing::warn!("Failed to build a {requested}-thread pool ({e}), retrying with one");
            try_build(1).ok()
        }
        Err(e) => {
            tracing::warn!("Failed to build a thread pool ({e}), running sequentially");
            None
        }
    }
}

/// The shared simulation thread pool, if one could be created
pub(crate) fn rayon_pool() -> Option<&'static ThreadPool> {
    RAYON_POOL.get_or_init(build_pool).as_ref()
}
