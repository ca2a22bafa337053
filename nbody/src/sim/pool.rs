use rayon::{Scope, ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Fixed-size worker pool running work in waves.
///
/// A wave is a set of independent tasks followed by a barrier: `wave`
/// returns only when every task submitted inside it has finished. Tasks of
/// one wave run in no particular order.
pub struct WorkerPool {
    pool: ThreadPool,
}

/// Handle for submitting tasks to the wave currently running.
pub struct Wave<'a, 'scope> {
    scope: &'a Scope<'scope>,
}

impl<'scope> Wave<'_, 'scope> {
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        self.scope.spawn(move |_| task());
    }
}

impl WorkerPool {
    pub fn new(thread_count: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|idx| format!("nbody-worker-{idx}"))
            .build()?;
        log::debug!("started worker pool with {thread_count} threads");
        Ok(Self { pool })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op`, which submits the tasks of one wave, and wait for all of them.
    pub fn wave<'scope, F>(&self, op: F)
    where
        F: for<'a> FnOnce(&Wave<'a, 'scope>) + Send,
    {
        self.pool.scope(|scope| op(&Wave { scope }));
    }
}
