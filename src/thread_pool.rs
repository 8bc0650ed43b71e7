//! Worker pool for running independent sweep cells concurrently.
//!
//! Results always come back in input order, so callers can emit them exactly
//! as a sequential run would.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use rayon::ThreadPool;

use crate::error::Result;
#[cfg(feature = "parallel")]
use crate::error::HarnessError;

/// Fixed-size pool; a size of one runs everything on the calling thread.
pub struct WorkerPool {
    jobs: usize,
    #[cfg(feature = "parallel")]
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    /// Create a pool with `jobs` workers (zero is treated as one).
    #[cfg(feature = "parallel")]
    pub fn new(jobs: usize) -> Result<Self> {
        let jobs = jobs.max(1);
        let pool = if jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .thread_name(|idx| format!("findsim-sweep-{idx}"))
                .build()
                .map_err(|e| HarnessError::WorkerPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };
        Ok(Self { jobs, pool })
    }

    /// Create a pool; without the `parallel` feature this is always sequential.
    #[cfg(not(feature = "parallel"))]
    pub fn new(jobs: usize) -> Result<Self> {
        if jobs > 1 {
            tracing::warn!(jobs, "built without the `parallel` feature, running sequentially");
        }
        Ok(Self { jobs: 1 })
    }

    /// Effective number of workers.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Apply `f` to every item, preserving order.
    #[cfg(feature = "parallel")]
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.iter().map(f).collect(),
        }
    }

    /// Apply `f` to every item, preserving order.
    #[cfg(not(feature = "parallel"))]
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        F: Fn(&T) -> R,
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_pool() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.jobs(), 1);
        assert_eq!(pool.map(&[1, 2, 3], |x| x * 2), vec![2, 4, 6]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_pool_preserves_order() {
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.jobs(), 4);
        let items: Vec<u64> = (0..200).collect();
        let out = pool.map(&items, |x| {
            // Uneven work so completion order differs from input order
            std::thread::sleep(std::time::Duration::from_micros((200 - x) * 10));
            x + 1
        });
        assert_eq!(out, (1..=200).collect::<Vec<_>>());
    }
}
