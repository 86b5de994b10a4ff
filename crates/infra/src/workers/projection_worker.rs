use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ingest::SnapshotIngestor;
use crate::projections::invoices_view::{InvoiceQuery, InvoicesPage, InvoicesProjection, ProjectionState};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.join().await;
    }

    /// Wait for the worker to stop on its own (all inputs closed).
    pub async fn join(&mut self) {
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "projection worker task failed");
            }
        }
    }
}

/// Keeps an [`InvoicesPage`] current.
///
/// - recomputes the projection whenever any snapshot stream moves
/// - re-queries (without recomputing) whenever the viewer's query changes
/// - publishes the newest page on a watch channel; readers only ever see the latest
/// - stops on shutdown or once every snapshot stream has closed
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Dropping the returned [`WorkerHandle`] detaches the worker: it keeps publishing until
    /// every snapshot stream closes. Use [`WorkerHandle::shutdown`] to stop it early.
    pub fn spawn(
        name: &'static str,
        projection: InvoicesProjection,
        mut ingestor: SnapshotIngestor,
        queries: watch::Receiver<InvoiceQuery>,
    ) -> (WorkerHandle, watch::Receiver<Arc<InvoicesPage>>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = projection.recompute(&ingestor.current());
        let first = Arc::new(state.query(&queries.borrow()));
        let (pages_tx, pages_rx) = watch::channel(first);

        let join = tokio::spawn(worker_loop(
            name,
            projection,
            ingestor,
            state,
            queries,
            pages_tx,
            shutdown_rx,
        ));

        (
            WorkerHandle {
                shutdown: Some(shutdown_tx),
                join: Some(join),
            },
            pages_rx,
        )
    }
}

async fn worker_loop(
    name: &'static str,
    projection: InvoicesProjection,
    mut ingestor: SnapshotIngestor,
    mut state: ProjectionState,
    mut queries: watch::Receiver<InvoiceQuery>,
    pages: watch::Sender<Arc<InvoicesPage>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut queries_open = true;
    let mut shutdown_open = true;
    info!(worker = name, "projection worker started");

    loop {
        tokio::select! {
            signal = &mut shutdown_rx, if shutdown_open => match signal {
                Ok(()) => break,
                Err(_) => {
                    // Handle dropped: run detached.
                    shutdown_open = false;
                    continue;
                }
            },
            next = ingestor.next() => match next {
                Some(snapshots) => {
                    state = projection.recompute(&snapshots);
                }
                None => break,
            },
            changed = queries.changed(), if queries_open => {
                if changed.is_err() {
                    // Keep serving the last query.
                    queries_open = false;
                    continue;
                }
            }
        }

        let page = state.query(&queries.borrow_and_update());
        debug!(
            worker = name,
            rows = page.rows.len(),
            count = page.summary.count,
            "page published"
        );
        pages.send_replace(Arc::new(page));
    }

    info!(worker = name, "projection worker stopped");
}
