// ABOUTME: Tag-level writer for the streamed plan response.
// ABOUTME: Writes what it is told without enforcing the grammar, so malformed streams can be produced too.

use bytes::Bytes;

use crate::types::{ActionId, PlanId, ServerIdentity, SetId};

use super::codec::{Marshaller, WireWriter};
use super::error::ProtocolError;
use super::records::{ApplierResponse, RemoteError, UpdateResult};
use super::tags::Tag;

/// Builds a response stream section by section.
///
/// ```
/// use rollplan::protocol::{ApplierResponse, ResponseWriter, UpdateResult};
/// use rollplan::types::{ActionId, PlanId, ServerIdentity, SetId};
///
/// # fn main() -> Result<(), rollplan::protocol::ProtocolError> {
/// let action = ActionId::random();
/// let server = ServerIdentity::new("h1", "main-group", "s1");
/// let bytes = ResponseWriter::new(PlanId::random())
///     .set(SetId::random())
///     .action(action, &ApplierResponse::servers_identified(vec![server.clone()]))?
///     .server(action, &server, &UpdateResult::success(None))?
///     .complete();
/// assert_eq!(bytes.last(), Some(&0x4C));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    writer: WireWriter,
}

impl ResponseWriter {
    /// Start a response for `plan_id`.
    pub fn new(plan_id: PlanId) -> Self {
        let mut writer = WireWriter::new();
        writer.write_tag(Tag::PlanId);
        writer.write_uuid(plan_id.as_uuid());
        Self { writer }
    }

    /// Reject the whole plan. This ends the stream.
    pub fn plan_invalid(mut self, error: &RemoteError) -> Result<Bytes, ProtocolError> {
        self.writer.write_tag(Tag::PlanInvalid);
        self.writer.write_record(error)?;
        Ok(self.writer.into_bytes())
    }

    pub fn set(mut self, set_id: SetId) -> Self {
        self.writer.write_tag(Tag::SetId);
        self.writer.write_uuid(set_id.as_uuid());
        self
    }

    /// Domain-level result of an action. Also used inside rollback sections.
    pub fn action(
        mut self,
        action_id: ActionId,
        response: &ApplierResponse,
    ) -> Result<Self, ProtocolError> {
        self.writer.write_tag(Tag::ActionId);
        self.writer.write_uuid(action_id.as_uuid());
        self.writer.write_tag(Tag::ActionModelResult);
        self.writer.write_record(response)?;
        Ok(self)
    }

    pub fn server(
        self,
        action_id: ActionId,
        server: &ServerIdentity,
        result: &UpdateResult,
    ) -> Result<Self, ProtocolError> {
        self.server_block(Tag::ServerDeployment, action_id, server, result)
    }

    pub fn set_rollback(mut self, set_id: SetId) -> Self {
        self.writer.write_tag(Tag::SetRollback);
        self.writer.write_uuid(set_id.as_uuid());
        self
    }

    pub fn server_rollback(
        self,
        action_id: ActionId,
        server: &ServerIdentity,
        result: &UpdateResult,
    ) -> Result<Self, ProtocolError> {
        self.server_block(Tag::ServerRollback, action_id, server, result)
    }

    /// Append a bare tag with no value.
    pub fn raw_tag(mut self, tag: Tag) -> Self {
        self.writer.write_tag(tag);
        self
    }

    /// Terminate the stream with `PLAN_COMPLETE`.
    pub fn complete(mut self) -> Bytes {
        self.writer.write_tag(Tag::PlanComplete);
        self.writer.into_bytes()
    }

    /// The bytes written so far, without a terminal tag.
    pub fn finish(self) -> Bytes {
        self.writer.into_bytes()
    }

    fn server_block(
        mut self,
        tag: Tag,
        action_id: ActionId,
        server: &ServerIdentity,
        result: &UpdateResult,
    ) -> Result<Self, ProtocolError> {
        self.writer.write_tag(tag);
        self.writer.write_tag(Tag::ActionId);
        self.writer.write_uuid(action_id.as_uuid());
        self.writer.write_tag(Tag::HostName);
        self.writer.write_string(server.host())?;
        self.writer.write_tag(Tag::ServerGroupName);
        self.writer.write_string(server.server_group())?;
        self.writer.write_tag(Tag::ServerName);
        self.writer.write_string(server.server())?;
        self.writer.write_tag(Tag::ServerResult);
        self.writer.write_record(result)?;
        Ok(self)
    }
}
