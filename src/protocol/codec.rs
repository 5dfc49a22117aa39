// ABOUTME: Marshaller seam for primitive and structured wire values.
// ABOUTME: UUIDs are 16 raw bytes, strings u16-length-prefixed, records u32-length-prefixed JSON.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use uuid::Uuid;

use super::error::ProtocolError;
use super::tags::Tag;

/// Largest structured record accepted from the wire.
pub const MAX_RECORD_LEN: u32 = 16 * 1024 * 1024;

/// Reads tags and tagged values from a response stream.
pub trait Unmarshaller {
    fn read_tag(&mut self) -> Result<Tag, ProtocolError>;

    fn read_uuid(&mut self) -> Result<Uuid, ProtocolError>;

    fn read_string(&mut self) -> Result<String, ProtocolError>;

    fn read_record<T: DeserializeOwned>(&mut self) -> Result<T, ProtocolError>;

    /// Read a tag and fail unless it is `expected`.
    fn expect_tag(&mut self, expected: Tag) -> Result<(), ProtocolError> {
        let found = self.read_tag()?;
        if found == expected {
            Ok(())
        } else {
            Err(ProtocolError::unexpected(expected.name(), found))
        }
    }
}

/// Writes tags and tagged values.
pub trait Marshaller {
    fn write_tag(&mut self, tag: Tag);

    fn write_uuid(&mut self, value: &Uuid);

    fn write_string(&mut self, value: &str) -> Result<(), ProtocolError>;

    fn write_record<T: Serialize>(&mut self, value: &T) -> Result<(), ProtocolError>;
}

/// [`Unmarshaller`] over any blocking byte stream.
pub struct WireReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        self.position += len as u64;
        Ok(buf)
    }
}

impl<R: Read> Unmarshaller for WireReader<R> {
    fn read_tag(&mut self) -> Result<Tag, ProtocolError> {
        let [byte] = self.read_array::<1>()?;
        let tag = Tag::try_from(byte)?;
        tracing::trace!(%tag, position = self.position, "read tag");
        Ok(tag)
    }

    fn read_uuid(&mut self) -> Result<Uuid, ProtocolError> {
        Ok(Uuid::from_bytes(self.read_array::<16>()?))
    }

    fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = u16::from_be_bytes(self.read_array::<2>()?);
        let bytes = self.read_vec(usize::from(len))?;
        String::from_utf8(bytes).map_err(|e| ProtocolError::malformed("string", e))
    }

    fn read_record<T: DeserializeOwned>(&mut self) -> Result<T, ProtocolError> {
        let len = u32::from_be_bytes(self.read_array::<4>()?);
        if len > MAX_RECORD_LEN {
            return Err(ProtocolError::malformed(
                "record",
                format!("length {len} exceeds {MAX_RECORD_LEN}"),
            ));
        }
        let bytes = self.read_vec(len as usize)?;
        serde_json::from_slice(&bytes).map_err(|e| ProtocolError::malformed("record", e))
    }
}

/// [`Marshaller`] that accumulates into an in-memory buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw byte, bypassing tag validation.
    pub fn write_raw(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Marshaller for WireWriter {
    fn write_tag(&mut self, tag: Tag) {
        self.buf.put_u8(tag.as_u8());
    }

    fn write_uuid(&mut self, value: &Uuid) {
        self.buf.put_slice(value.as_bytes());
    }

    fn write_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        let len = u16::try_from(value.len()).map_err(|_| {
            ProtocolError::malformed("string", format!("{} bytes exceeds u16 length", value.len()))
        })?;
        self.buf.put_u16(len);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    fn write_record<T: Serialize>(&mut self, value: &T) -> Result<(), ProtocolError> {
        let json = serde_json::to_vec(value).map_err(|e| ProtocolError::malformed("record", e))?;
        let len = u32::try_from(json.len())
            .ok()
            .filter(|len| *len <= MAX_RECORD_LEN)
            .ok_or_else(|| {
                ProtocolError::malformed("record", format!("{} bytes is too large", json.len()))
            })?;
        self.buf.put_u32(len);
        self.buf.put_slice(&json);
        Ok(())
    }
}
