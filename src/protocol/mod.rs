// ABOUTME: Byte-tagged wire protocol between the client and the domain controller.
// ABOUTME: Covers the execute request, the streamed response grammar, and the decoder for it.

mod codec;
mod decoder;
mod error;
mod records;
mod request;
mod response;
mod tags;

pub use codec::{MAX_RECORD_LEN, Marshaller, Unmarshaller, WireReader, WireWriter};
pub use decoder::{ResultDecoder, decode_response};
pub use error::ProtocolError;
pub use records::{
    ApplierOutcome, ApplierResponse, RemoteError, UpdateKind, UpdateOutcome, UpdateResult,
};
pub use request::{encode_execute_request, read_execute_request};
pub use response::ResponseWriter;
pub use tags::Tag;
