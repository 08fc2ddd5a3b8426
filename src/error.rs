//! Error type shared by the encode and decode sides.

use std::io;

use thiserror::Error;

/// Errors surfaced by providers, the decode chain, and the consumption loop.
///
/// Program-correctness violations are not represented here: an argument count
/// that differs from the format's marker count, or an encoder that writes a
/// different byte count than its size calculator predicted, panics instead.
/// A call site reused with another argument type sequence is not a violation;
/// each sequence gets its own decoder.
#[derive(Error, Debug)]
pub enum Error {
    /// The buffer provider cannot hand out a region of the requested size.
    #[error("buffer provider saturated: requested {requested} bytes, {available} available")]
    Saturated { requested: usize, available: usize },

    /// The payload of a single record does not fit the header's size field.
    #[error("payload of {0} bytes exceeds the record size limit")]
    PayloadTooLarge(usize),

    /// A record region is shorter than a header, or than the header claims.
    #[error("record truncated: header announces {expected} bytes, region holds {actual}")]
    RecordTooShort { expected: usize, actual: usize },

    /// A decode step ran past the end of the payload.
    #[error("payload truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// The format string ran out of markers before the decoder ran out of steps.
    #[error("format string has no marker for argument {0}")]
    MissingMarker(usize),

    /// Payload bytes were left over after the last decode step.
    #[error("{0} payload bytes left after the last argument")]
    TrailingPayload(usize),

    /// The payload holds a representation that is not a valid value of its type.
    #[error("invalid {0} representation in payload")]
    InvalidValue(&'static str),

    #[error("unknown format string id {0}")]
    UnknownFormat(u16),

    #[error("unknown decoder id {0}")]
    UnknownDecoder(u16),

    #[error(transparent)]
    Io(#[from] io::Error),
}
