//! Consensus-critical serialization for Aureus.
//!
//! Transaction ids are derived from the canonical byte form, so the
//! encoding here is consensus-critical: any two implementations must
//! produce identical bytes for identical transactions.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// A deserialization error.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// An underlying reader failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The bytes to be deserialized were malformed.
    #[error("parse error: {0}")]
    Parse(&'static str),
}

/// Canonical serialization for Aureus.
///
/// The error type is [`std::io::Error`]: serialization must be infallible
/// up to errors in the underlying writer, so types implementing this
/// trait must make illegal states unrepresentable.
pub trait AureusSerialize: Sized {
    /// Write `self` to `writer` in the canonical format.
    fn aureus_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error>;

    /// Serialize `self` into a fresh byte vector.
    fn aureus_serialize_to_vec(&self) -> Result<Vec<u8>, io::Error> {
        let mut data = Vec::new();
        self.aureus_serialize(&mut data)?;
        Ok(data)
    }
}

/// Canonical deserialization for Aureus.
pub trait AureusDeserialize: Sized {
    /// Try to read `Self` from `reader` in the canonical format.
    fn aureus_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError>;
}

/// Helpers for writing length-prefixed fields.
pub trait WriteAureusExt: io::Write {
    /// Write a string with a one-byte length prefix.
    fn write_string8(&mut self, string: &str) -> Result<(), io::Error> {
        let bytes = string.as_bytes();
        if bytes.len() > u8::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "string too long for a one-byte length prefix",
            ));
        }
        self.write_u8(bytes.len() as u8)?;
        self.write_all(bytes)
    }

    /// Write a string with a two-byte length prefix.
    fn write_string16(&mut self, string: &str) -> Result<(), io::Error> {
        let bytes = string.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "string too long for a two-byte length prefix",
            ));
        }
        self.write_u16::<LittleEndian>(bytes.len() as u16)?;
        self.write_all(bytes)
    }
}

impl<W: io::Write> WriteAureusExt for W {}

/// Helpers for reading length-prefixed fields.
pub trait ReadAureusExt: io::Read {
    /// Read a string with a one-byte length prefix.
    fn read_string8(&mut self) -> Result<String, SerializationError> {
        let len = self.read_u8()? as usize;
        read_utf8(self, len)
    }

    /// Read a string with a two-byte length prefix.
    fn read_string16(&mut self) -> Result<String, SerializationError> {
        let len = self.read_u16::<LittleEndian>()? as usize;
        read_utf8(self, len)
    }
}

impl<R: io::Read> ReadAureusExt for R {}

fn read_utf8<R: io::Read + ?Sized>(
    reader: &mut R,
    len: usize,
) -> Result<String, SerializationError> {
    let mut bytes = vec![0; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| SerializationError::Parse("string is not valid UTF-8"))
}
