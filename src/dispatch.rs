//! The parallel dispatcher: a fixed worker pool claiming tables off a shared
//! counter, stopping on the first failure and surfacing it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

use log::{error, info};
use rayon::ThreadPoolBuilder;

use crate::errors::MigrateError;
use crate::migrate::{migrate_table, PgPool};
use crate::sources::Source;
use crate::types::Table;

/// Migrate every table, `workers` at a time. Returns the first error any
/// worker hit, after all workers have wound down.
pub fn migrate_all<S: Source>(
    source: &S,
    pg: &PgPool,
    tables: &[Table],
    workers: usize,
) -> Result<(), MigrateError> {
    dispatch(tables, workers, |table| migrate_table(source, pg, table))
}

/// Run `job` over every table across a pool of `workers` threads.
///
/// Tables are claimed in declaration order through an atomic counter and
/// complete in arbitrary order. A failing job stores its error (first writer
/// wins) and raises the stop flag; other workers observe the flag between
/// tables, so an in-flight table always runs to its own completion.
pub fn dispatch<F>(tables: &[Table], workers: usize, job: F) -> Result<(), MigrateError>
where
    F: Fn(&Table) -> Result<u64, MigrateError> + Sync,
{
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    info!(
        "dispatching {} tables across {} workers",
        tables.len(),
        pool.current_num_threads()
    );

    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let failure: OnceLock<MigrateError> = OnceLock::new();

    // broadcast blocks until every worker has returned
    pool.broadcast(|_| {
        while !stop.load(Ordering::SeqCst) {
            let at = next.fetch_add(1, Ordering::Relaxed);
            let Some(table) = tables.get(at) else {
                return;
            };
            info!("table {}: starting", table.name);
            if let Err(e) = job(table) {
                error!("table {}: {e}", table.name);
                let _ = failure.set(e);
                stop.store(true, Ordering::SeqCst);
                return;
            }
        }
    });

    match failure.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
