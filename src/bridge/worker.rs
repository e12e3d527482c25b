//! Query worker thread
//!
//! Owns the in-memory dataset connection. Requests are handled one at a
//! time in arrival order; every request produces exactly one response.

use log::{debug, info, warn};
use rusqlite::functions::FunctionFlags;
use rusqlite::serialize::OwnedData;
use rusqlite::{ffi, Connection, DatabaseName};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::protocol::{Outcome, RawResultSet, RequestKind, Scalar, WorkerFault, WorkerRequest, WorkerResponse};

/// SQL function lowercasing with full Unicode rules (SQLite's `lower` is ASCII-only)
pub const LOWER_FN: &str = "unicode_lower";
/// Collation comparing Unicode-lowercased strings
pub const NOCASE_COLLATION: &str = "UNICODE_NOCASE";

/// Query engine state owned by the worker thread
#[derive(Default)]
struct Engine {
    db: Option<Connection>,
}

impl Engine {
    fn handle(&mut self, kind: RequestKind) -> Result<Option<RawResultSet>, WorkerFault> {
        match kind {
            RequestKind::Init { dataset } => {
                if self.db.is_some() {
                    return Err(WorkerFault::AlreadyInitialized);
                }
                let conn = load_dataset(&dataset)?;
                info!("[Worker] Dataset loaded ({} bytes)", dataset.len());
                self.db = Some(conn);
                Ok(None)
            }
            RequestKind::Query { sql, params } => {
                let conn = self.db.as_ref().ok_or(WorkerFault::Uninitialized)?;
                run_query(conn, &sql, &params).map_err(WorkerFault::from)
            }
        }
    }
}

/// Spawn the worker thread
pub(crate) fn spawn(
    requests: UnboundedReceiver<WorkerRequest>,
    responses: UnboundedSender<WorkerResponse>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("mkdict-worker".to_string())
        .spawn(move || worker_loop(requests, responses))
}

fn worker_loop(
    mut requests: UnboundedReceiver<WorkerRequest>,
    responses: UnboundedSender<WorkerResponse>,
) {
    let mut engine = Engine::default();

    while let Some(WorkerRequest { id, kind }) = requests.blocking_recv() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.handle(kind)))
            .unwrap_or_else(|_| Err(WorkerFault::Failed("worker panicked".to_string())));

        let outcome = match result {
            Ok(rows) => Outcome::Result(rows),
            Err(fault) => {
                debug!("[Worker] Request {} failed: {:?}", id, fault);
                Outcome::Error(fault)
            }
        };

        if responses.send(WorkerResponse { id, outcome }).is_err() {
            warn!("[Worker] Response channel closed, stopping");
            break;
        }
    }

    debug!("[Worker] Request channel closed, exiting");
}

/// Load raw SQLite bytes into a private, read-only in-memory connection
fn load_dataset(bytes: &[u8]) -> Result<Connection, WorkerFault> {
    let mut conn = Connection::open_in_memory()?;
    conn.deserialize(DatabaseName::Main, sqlite_owned_copy(bytes)?, true)?;
    register_helpers(&conn)?;

    // Reject blobs that load cleanly but are not a readable database
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;

    Ok(conn)
}

/// Copy `bytes` into a buffer from SQLite's allocator, which `deserialize` takes over
fn sqlite_owned_copy(bytes: &[u8]) -> Result<OwnedData, WorkerFault> {
    if bytes.is_empty() {
        return Err(WorkerFault::Failed("dataset is empty".to_string()));
    }

    let size = bytes.len();
    let raw = unsafe { ffi::sqlite3_malloc64(size as u64) }.cast::<u8>();
    let ptr = NonNull::new(raw)
        .ok_or_else(|| WorkerFault::Failed(format!("could not allocate {} bytes", size)))?;

    // SAFETY: `ptr` comes from sqlite3_malloc64 with room for `size` bytes and
    // does not overlap `bytes`.
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), size);
        Ok(OwnedData::from_raw_nonnull(ptr, size))
    }
}

fn register_helpers(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    conn.create_collation(NOCASE_COLLATION, |a, b| {
        a.to_lowercase().cmp(&b.to_lowercase())
    })?;
    Ok(())
}

fn run_query(
    conn: &Connection,
    sql: &str,
    params: &[Scalar],
) -> rusqlite::Result<Option<RawResultSet>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(width);
        for index in 0..width {
            record.push(Scalar::from(row.get_ref(index)?));
        }
        values.push(record);
    }

    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(RawResultSet { columns, values }))
    }
}
