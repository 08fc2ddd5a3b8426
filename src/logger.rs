use std::any::TypeId;
use std::sync::OnceLock;

use crate::args::ArgList;
use crate::error::Error;
use crate::placeholder::count_placeholders;
use crate::provider::BufferProvider;
use crate::record::{Header, HEADER_SIZE};
use crate::registry;

/// Static state of one logging call site.
///
/// Holds the format string and, after the first call, the registry handles
/// the call site writes into every header. `log_record!` declares one
/// `CallSite` static per invocation, so the registry is consulted once per
/// call site and the hot path only reads the cached handles.
///
/// # Examples
///
/// ```
/// # use deferred_log::{CallSite, RecordQueue, write_record};
/// static SITE: CallSite = CallSite::new("x=% y=%");
///
/// let queue = RecordQueue::<1024>::new();
/// write_record(&queue, &SITE, (&42, &"hi")).unwrap();
/// assert_eq!(queue.len(), 1);
/// ```
pub struct CallSite {
    format: &'static str,
    placeholders: usize,
    handles: OnceLock<Handles>,
}

#[derive(Debug, Clone, Copy)]
struct Handles {
    format_id: u16,
    decoder_id: u16,
    decoders: TypeId,
}

impl CallSite {
    pub const fn new(format: &'static str) -> Self {
        Self {
            format,
            placeholders: count_placeholders(format),
            handles: OnceLock::new(),
        }
    }

    pub fn format(&self) -> &'static str {
        self.format
    }

    /// Number of markers in the format string.
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    /// Format and decoder ids for argument list type `L`.
    ///
    /// Panics if the marker count does not match `L`'s arity. A call site
    /// used with more than one type sequence (a generic caller) keeps the
    /// first sequence cached and resolves the others through the registry.
    #[inline]
    fn handles<L: ArgList>(&self) -> (u16, u16) {
        let handles = self.handles.get_or_init(|| Handles {
            format_id: registry::register_format(self.format),
            decoder_id: self.resolve_decoder::<L>(),
            decoders: TypeId::of::<L::Decoders>(),
        });

        if handles.decoders == TypeId::of::<L::Decoders>() {
            (handles.format_id, handles.decoder_id)
        } else {
            (handles.format_id, self.resolve_decoder::<L>())
        }
    }

    #[cold]
    fn resolve_decoder<L: ArgList>(&self) -> u16 {
        assert_eq!(
            self.placeholders,
            L::LEN,
            "Number of arguments mismatch for format string {:?}",
            self.format
        );
        registry::register_decoder::<L::Decoders>()
    }
}

/// Encodes one log call into a record and publishes it to `provider`.
///
/// Steps, in order: resolve the call site's handles (checking the marker
/// count on first use), size the arguments, acquire `HEADER_SIZE + size`
/// bytes, write the header and the packed arguments, check the written size
/// against the computed one, publish.
///
/// Only the argument bytes are copied here. Number formatting and string
/// assembly happen later, when the record is decoded.
///
/// # Errors
///
/// Returns the provider's error unchanged if no region can be acquired, and
/// [`Error::PayloadTooLarge`] if the payload does not fit the header. No
/// record is produced in either case.
///
/// # Panics
///
/// Panics, before any region is acquired, if the format string's marker count
/// differs from the number of arguments. Also panics if the encoder writes a
/// different byte count than the size calculator predicted; that region is
/// never published.
pub fn write_record<P, L>(provider: &P, site: &CallSite, args: L) -> Result<(), Error>
where
    P: BufferProvider + ?Sized,
    L: ArgList,
{
    let (format_id, decoder_id) = site.handles::<L>();

    let payload_size = args.encoded_size();
    let header = Header::new(payload_size, format_id, decoder_id)?;

    let mut region = provider.acquire_write_region(HEADER_SIZE + payload_size)?;
    header.write_to(&mut region[..HEADER_SIZE]);
    let written = args.encode(&mut region[HEADER_SIZE..]);
    assert_eq!(
        written, payload_size,
        "argument encoder and size calculator disagree for {:?}",
        site.format
    );

    provider.publish(region);
    Ok(())
}

/// Records a log call for deferred formatting.
///
/// This macro is the primary interface for logging. It:
/// 1. Rejects, at build time, a format string whose `%` count differs from
///    the number of arguments
/// 2. Caches the call site's format and decoder handles in a local static
/// 3. Copies the arguments' bytes into a record acquired from the provider
///
/// # Arguments
///
/// * `provider` - A [`BufferProvider`](crate::BufferProvider) (borrowed by the macro)
/// * `fmt` - A format string literal, using `%` as the substitution marker
/// * `args...` - Zero or more plain values or text, one per marker
///
/// # Returns
///
/// `Result<(), deferred_log::Error>` from [`write_record`]
///
/// # Examples
///
/// ```
/// # use deferred_log::{log_record, consume_all, RecordQueue};
/// let queue = RecordQueue::<4096>::new();
///
/// log_record!(queue, "Hello, world!").unwrap();
/// log_record!(queue, "Temperature: % C", 25.5).unwrap();
/// log_record!(queue, "Status: %, Count: %", true, 42).unwrap();
///
/// let mut out = Vec::new();
/// consume_all(&queue, &mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "Hello, world!\nTemperature: 25.5 C\nStatus: true, Count: 42\n"
/// );
/// ```
///
/// A mismatched argument count does not compile:
///
/// ```compile_fail
/// # use deferred_log::{log_record, RecordQueue};
/// let queue = RecordQueue::<4096>::new();
/// log_record!(queue, "x=% y=%", 1).unwrap();
/// ```
#[macro_export]
macro_rules! log_record {
    ($provider:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::__assert_placeholders!($fmt, $($arg),*);
        static SITE: $crate::CallSite = $crate::CallSite::new($fmt);
        $crate::write_record(&$provider, &SITE, ($(&$arg,)*))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RecordQueue;
    use crate::record::Record;

    #[test]
    fn test_header_matches_payload() {
        static SITE: CallSite = CallSite::new("a=% b=%");
        let queue = RecordQueue::<256>::new();
        write_record(&queue, &SITE, (&1u16, &"xyz")).unwrap();

        let region = queue.next_read_region().unwrap();
        let record = Record::parse(&region).unwrap();
        assert_eq!(record.header.payload_size, 2 + 4);
        assert_eq!(region.len(), HEADER_SIZE + 6);
        assert_eq!(record.format_string().unwrap(), "a=% b=%");
        assert_eq!(&record.payload[..2], &1u16.to_ne_bytes());
        assert_eq!(&record.payload[2..], b"xyz\0");
    }

    #[test]
    fn test_handles_are_cached() {
        static SITE: CallSite = CallSite::new("v=%");
        let first = SITE.handles::<(&u8,)>();
        let second = SITE.handles::<(&u8,)>();
        assert_eq!(first, second);
        assert_eq!(SITE.placeholders(), 1);
    }

    #[test]
    fn test_generic_call_site_resolves_each_signature() {
        static SITE: CallSite = CallSite::new("v=%");
        let (format_a, decoder_a) = SITE.handles::<(&u8,)>();
        let (format_b, decoder_b) = SITE.handles::<(&str,)>();
        assert_eq!(format_a, format_b);
        assert_ne!(decoder_a, decoder_b);
    }

    #[test]
    #[should_panic(expected = "Number of arguments mismatch")]
    fn test_argument_count_mismatch_panics() {
        static SITE: CallSite = CallSite::new("a=% b=%");
        let queue = RecordQueue::<256>::new();
        let _ = write_record(&queue, &SITE, (&1i32,));
    }
}
