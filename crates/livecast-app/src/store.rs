//! Store trait for abstracting the remote broadcast-state holder.
//!
//! The [`Store`] trait decouples the runtime from how the slot is reached.
//! Production uses HTTP ([`crate::transport::HttpStore`]); tests use an
//! in-memory simulation with fault injection.

use std::future::Future;

use livecast_core::{RemoteSnapshot, StoreError, StoreRequest, WriteReply};

/// Access to the shared broadcast slot.
///
/// Implementations are cheap to clone: the runtime clones the store into a
/// task per request so a slow response never blocks user input.
///
/// # Implementations
///
/// - **HTTP**: `GET`/`POST` against the stats endpoint
/// - **Simulation**: In-process single-slot state with injectable faults
pub trait Store: Clone + Send + Sync + 'static {
    /// Read the full state blob.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<RemoteSnapshot, StoreError>> + Send;

    /// Send a write and decode its reply.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses and `error` replies all
    /// surface as [`StoreError`].
    fn submit(
        &self,
        request: StoreRequest,
    ) -> impl Future<Output = Result<WriteReply, StoreError>> + Send;
}
