//! Bounded-parallelism task runner.
//!
//! Both the per-file analysis loop and the merge-time reconciliation
//! scans run through a [`Limiter`]: at most `bound` items in flight,
//! results in input order, and one item's failure never cancels its
//! siblings.

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::panic::AssertUnwindSafe;

pub struct Limiter {
    pool: rayon::ThreadPool,
}

impl Limiter {
    pub fn new(bound: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(bound.max(1))
            .thread_name(|i| format!("codegate-worker-{i}"))
            .build()
            .map_err(|e| anyhow!("failed to build worker pool: {e}"))?;
        Ok(Self { pool })
    }

    pub fn bound(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` over every item, preserving input order in the returned
    /// vector. A panic inside `f` is caught at the item boundary and
    /// surfaces as that item's `Err`.
    pub fn run<I, T, F>(&self, items: &[I], f: F) -> Vec<Result<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T> + Sync,
    {
        self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    match std::panic::catch_unwind(AssertUnwindSafe(|| f(item))) {
                        Ok(result) => result,
                        Err(payload) => Err(anyhow!("worker panicked: {}", panic_message(&payload))),
                    }
                })
                .collect()
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
