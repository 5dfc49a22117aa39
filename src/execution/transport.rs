// ABOUTME: Transport seam that carries the execute request and returns the response stream.
// ABOUTME: RecordedTransport replays a captured response for tests and offline inspection.

use bytes::Bytes;
use parking_lot::Mutex;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::types::PlanId;

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// Delivers an encoded execute request and yields the response stream.
///
/// `submit` is called on the execution's decode thread and may block.
pub trait Transport: Send + Sync {
    /// Send `request` for `plan_id` and return the response stream.
    fn submit(&self, plan_id: PlanId, request: Bytes)
    -> Result<Box<dyn Read + Send>, TransportError>;

    /// Ask the controller to cancel `plan_id`. Returns `false` if the
    /// transport could not forward the cancellation.
    fn cancel(&self, plan_id: PlanId) -> bool;
}

/// Replays a previously captured response stream.
#[derive(Debug, Default)]
pub struct RecordedTransport {
    response: Bytes,
    requests: Mutex<Vec<Bytes>>,
    cancellations: Mutex<Vec<PlanId>>,
}

impl RecordedTransport {
    pub fn new(response: impl Into<Bytes>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    /// Load a captured response from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(Self::new(bytes))
    }

    /// Requests received so far, in submission order.
    pub fn requests(&self) -> Vec<Bytes> {
        self.requests.lock().clone()
    }

    pub fn cancellations(&self) -> Vec<PlanId> {
        self.cancellations.lock().clone()
    }
}

impl Transport for RecordedTransport {
    fn submit(
        &self,
        plan_id: PlanId,
        request: Bytes,
    ) -> Result<Box<dyn Read + Send>, TransportError> {
        tracing::debug!(plan = %plan_id, bytes = self.response.len(), "replaying recorded response");
        self.requests.lock().push(request);
        Ok(Box::new(Cursor::new(self.response.clone())))
    }

    fn cancel(&self, plan_id: PlanId) -> bool {
        self.cancellations.lock().push(plan_id);
        false
    }
}
