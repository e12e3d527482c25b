//! RPC bridge to the query worker
//!
//! The dataset lives on a dedicated worker thread that owns the only SQLite
//! connection to it. Callers talk to it through request/response messages
//! matched by correlation id; nothing but message payloads crosses the
//! thread boundary.

mod client;
pub mod protocol;
mod worker;

pub use client::Bridge;
pub use protocol::{RawResultSet, RequestId, Scalar, WorkerFault};
pub use worker::{LOWER_FN, NOCASE_COLLATION};
