use std::io;
use std::mem::size_of;

use crate::decode;
use crate::error::Error;
use crate::registry;

/// Size of the fixed header in front of every payload.
///
/// Layout, native endianness:
/// `[payload_size(4) | format_id(2) | decoder_id(2)]`
pub const HEADER_SIZE: usize = 8;

// The header layout must stay in sync with HEADER_SIZE.
const _: () = assert!(HEADER_SIZE == size_of::<u32>() + 2 * size_of::<u16>());

/// Metadata written in front of every payload.
///
/// The format string and the decode chain are referenced through registry
/// handles. This layout is an in-process convention only; it is not meant to
/// be persisted or sent to another process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Bytes occupied by the payload that follows the header.
    pub payload_size: u32,
    /// Registry id of the format string.
    pub format_id: u16,
    /// Registry id of the decode chain for the payload's type sequence.
    pub decoder_id: u16,
}

impl Header {
    pub fn new(payload_size: usize, format_id: u16, decoder_id: u16) -> Result<Self, Error> {
        let payload_size =
            u32::try_from(payload_size).map_err(|_| Error::PayloadTooLarge(payload_size))?;
        Ok(Self {
            payload_size,
            format_id,
            decoder_id,
        })
    }

    /// Writes the header into the first `HEADER_SIZE` bytes of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.payload_size.to_ne_bytes());
        buf[4..6].copy_from_slice(&self.format_id.to_ne_bytes());
        buf[6..8].copy_from_slice(&self.decoder_id.to_ne_bytes());
    }

    /// Reads a header from the front of `buf`.
    pub fn read_from(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::RecordTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self {
            payload_size: u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]),
            format_id: u16::from_ne_bytes([buf[4], buf[5]]),
            decoder_id: u16::from_ne_bytes([buf[6], buf[7]]),
        })
    }

    /// Header plus payload size.
    pub fn record_size(&self) -> usize {
        HEADER_SIZE + self.payload_size as usize
    }
}

/// A borrowed view of one encoded record: header plus payload.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub header: Header,
    pub payload: &'a [u8],
}

impl<'a> Record<'a> {
    /// Splits a record region into header and payload.
    ///
    /// The region may be longer than the record; bytes past the payload are
    /// ignored.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        let header = Header::read_from(bytes)?;
        let end = header.record_size();
        let payload = bytes
            .get(HEADER_SIZE..end)
            .ok_or(Error::RecordTooShort {
                expected: end,
                actual: bytes.len(),
            })?;
        Ok(Self { header, payload })
    }

    /// The format string this record was written with.
    pub fn format_string(&self) -> Result<&'static str, Error> {
        registry::format(self.header.format_id).ok_or(Error::UnknownFormat(self.header.format_id))
    }

    /// Replays the record into `out` as one line of text.
    pub fn decode(&self, out: &mut dyn io::Write) -> Result<(), Error> {
        let format = self.format_string()?;
        let steps = registry::decoder(self.header.decoder_id)
            .ok_or(Error::UnknownDecoder(self.header.decoder_id))?;
        decode::replay(out, format, steps, self.payload)
    }
}
