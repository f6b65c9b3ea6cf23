// Parallel fold
//
// Rows are split into contiguous chunks of `batch_size`, each chunk is
// folded into its own ObjectGraph on a rayon worker, and the partial
// graphs are merged. rayon's reduce combines neighbouring chunks in
// sequence order, so the result matches a sequential fold, including
// first-encounter order. A dedicated pool is built once per loader and
// reused by every later fold.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, trace};

use crate::errors::Result;
use crate::features::entity::Shared;
use crate::features::loader::reducer::Loader;
use crate::features::object_graph::ObjectGraph;
use crate::shared::models::Row;

impl<T: Send + Sync + 'static> Loader<T> {
    /// Fold `rows` in parallel partitions and merge the partial graphs
    ///
    /// Falls back to a sequential fold when rayon is disabled or the rows
    /// fit in a single partition.
    pub fn fold_parallel<R: Row + Sync>(&self, rows: &[R]) -> Result<ObjectGraph> {
        let parallel = &self.config.parallel;
        if !parallel.enable_rayon || rows.len() <= parallel.batch_size {
            return self.fold(rows);
        }

        let batch_size = parallel.batch_size;
        debug!(
            "Folding {} rows of {} in {} partitions",
            rows.len(),
            self.main,
            rows.len().div_ceil(batch_size)
        );

        let fold = || {
            rows.par_chunks(batch_size)
                .map(|chunk| self.fold(chunk))
                .try_reduce(ObjectGraph::new, |left, right| {
                    trace!(
                        "Merging partitions: {} + {} rows",
                        left.rows_absorbed(),
                        right.rows_absorbed()
                    );
                    Ok(left.merged(right))
                })
        };

        if parallel.num_workers > 0 {
            let pool = self.pool.get_or_try_init(|| {
                debug!("Building worker pool of {} threads", parallel.num_workers);
                ThreadPoolBuilder::new()
                    .num_threads(parallel.num_workers)
                    .thread_name(|i| format!("rowgraph-worker-{}", i))
                    .build()
            })?;
            pool.install(fold)
        } else {
            fold()
        }
    }

    /// Parallel load; same result as [`load`](Self::load) on the same rows
    pub fn load_parallel<R: Row + Sync>(&self, rows: &[R]) -> Result<Vec<Shared<T>>> {
        let graph = self.fold_parallel(rows)?;
        self.finish(graph)
    }
}
