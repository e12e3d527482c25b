//! Request/response client for the query worker
//!
//! Each call takes the next correlation id, parks a oneshot sender in the
//! pending table and posts the request. A router thread settles pending
//! entries as responses arrive.

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use super::protocol::{
    Outcome, RawResultSet, RequestId, RequestKind, Scalar, WorkerRequest, WorkerResponse,
};
use super::worker;
use crate::error::{LexiconError, Result};

/// Outcome of the one `init` request, shared by every caller
type SharedInit = Shared<BoxFuture<'static, Result<()>>>;

/// Outstanding requests keyed by correlation id
#[derive(Default)]
pub(crate) struct PendingTable {
    entries: Mutex<HashMap<RequestId, oneshot::Sender<Outcome>>>,
}

impl PendingTable {
    fn register(&self, id: RequestId) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.entries.lock().unwrap().insert(id, tx);
        rx
    }

    fn remove(&self, id: RequestId) {
        self.entries.lock().unwrap().remove(&id);
    }

    /// Settle the entry for `response.id`; `false` if nobody was waiting
    pub(crate) fn settle(&self, response: WorkerResponse) -> bool {
        let entry = self.entries.lock().unwrap().remove(&response.id);
        match entry {
            // Receiver may have been dropped by a caller that lost interest
            Some(tx) => {
                let _ = tx.send(response.outcome);
                true
            }
            None => false,
        }
    }

    /// Drop every waiter; their receivers observe a closed channel
    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Handle to one query worker
///
/// Dropping the bridge closes the request channel, which stops the worker
/// and then the router.
pub struct Bridge {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    pending: Arc<PendingTable>,
    next_id: AtomicU64,
    init: Mutex<Option<SharedInit>>,
}

impl Bridge {
    /// Spawn a fresh worker and its response router
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingTable::default());

        worker::spawn(request_rx, response_tx)
            .map_err(|e| LexiconError::Transport(format!("failed to spawn worker: {}", e)))?;

        let router_pending = Arc::clone(&pending);
        std::thread::Builder::new()
            .name("mkdict-router".to_string())
            .spawn(move || route_responses(response_rx, router_pending))
            .map_err(|e| LexiconError::Transport(format!("failed to spawn router: {}", e)))?;

        Ok(Self {
            requests: request_tx,
            pending,
            next_id: AtomicU64::new(1),
            init: Mutex::new(None),
        })
    }

    /// Hand the dataset to the worker
    ///
    /// Only the first call posts anything. The reply is held in a shared
    /// future, so concurrent and later callers (including ones arriving after
    /// the first caller gave up) get the outcome of that one request, failure
    /// included.
    pub async fn initialize(&self, dataset: Vec<u8>) -> Result<()> {
        let outcome = {
            let mut init = self.init.lock().unwrap();
            init.get_or_insert_with(|| {
                debug!("[Bridge] Sending dataset ({} bytes) to worker", dataset.len());
                let posted = self.post(RequestKind::Init { dataset });
                async move {
                    let (id, rx) = posted?;
                    await_outcome(id, rx).await.map(|_| ())
                }
                .boxed()
                .shared()
            })
            .clone()
        };
        outcome.await
    }

    /// Whether `initialize` has completed successfully
    pub fn is_initialized(&self) -> bool {
        let init = self.init.lock().unwrap();
        matches!(init.as_ref().and_then(|outcome| outcome.peek()), Some(Ok(())))
    }

    /// Run a query; `None` when it produced no rows
    pub async fn execute(&self, sql: &str, params: Vec<Scalar>) -> Result<Option<RawResultSet>> {
        let (id, rx) = self.post(RequestKind::Query {
            sql: sql.to_string(),
            params,
        })?;
        await_outcome(id, rx).await
    }

    /// Register a waiter and send the request
    fn post(&self, kind: RequestKind) -> Result<(RequestId, oneshot::Receiver<Outcome>)> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rx = self.pending.register(id);

        if self.requests.send(WorkerRequest { id, kind }).is_err() {
            self.pending.remove(id);
            return Err(LexiconError::Transport(
                "worker thread is not running".to_string(),
            ));
        }
        Ok((id, rx))
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

async fn await_outcome(
    id: RequestId,
    rx: oneshot::Receiver<Outcome>,
) -> Result<Option<RawResultSet>> {
    match rx.await {
        Ok(Outcome::Result(rows)) => Ok(rows),
        Ok(Outcome::Error(fault)) => Err(fault.into()),
        Err(_) => Err(LexiconError::Transport(format!(
            "worker stopped before answering request {}",
            id
        ))),
    }
}

fn route_responses(mut responses: mpsc::UnboundedReceiver<WorkerResponse>, pending: Arc<PendingTable>) {
    while let Some(response) = responses.blocking_recv() {
        let id = response.id;
        if !pending.settle(response) {
            debug!("[Bridge] Dropping response for unknown request {}", id);
        }
    }

    warn!("[Bridge] Worker channel closed, failing outstanding requests");
    pending.clear();
}
