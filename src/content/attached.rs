// ABOUTME: Content streams kept open from builder directive until execution ends.
// ABOUTME: Each slot is closed (dropped) at most once, whichever terminal path gets there first.

use parking_lot::Mutex;
use std::fmt;
use std::io::Read;

use crate::types::ActionId;

/// A content stream handed to the builder for one action.
///
/// The stream stays open while the plan is built and executed and is closed
/// when the execution handle reaches a terminal state. Builder branches that
/// share an action share the slot, so the stream still closes only once.
pub struct AttachedContent {
    action_id: ActionId,
    stream: Mutex<Option<Box<dyn Read + Send>>>,
}

impl AttachedContent {
    pub fn new(action_id: ActionId, stream: Box<dyn Read + Send>) -> Self {
        Self {
            action_id,
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn action_id(&self) -> ActionId {
        self.action_id
    }

    pub fn is_open(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// Close the stream. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let stream = self.stream.lock().take();
        match stream {
            Some(stream) => {
                drop(stream);
                tracing::trace!(action = %self.action_id, "closed deployment content stream");
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for AttachedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedContent")
            .field("action_id", &self.action_id)
            .field("open", &self.is_open())
            .finish()
    }
}
