//! Replay of record payloads into text.
//!
//! Every argument type seen at a call site has a [`Decode`] type. The tuple of
//! those types, in argument order, implements [`DecodeList`], whose `STEPS`
//! constant is the decode chain for that signature: one step per argument,
//! fixed at compile time. [`replay`] walks the format string in lock-step with
//! the steps, so records carry no per-argument type tags.

use std::io;
use std::mem::size_of;

use crate::error::Error;
use crate::placeholder::MARKER;

/// Written after the trailing literal segment of every record.
pub const LINE_TERMINATOR: &[u8] = b"\n";

/// One link of a decode chain.
///
/// Writes the argument at the head of `data` to `out` and returns how many
/// payload bytes it consumed.
pub type DecodeStep = fn(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error>;

/// Replays one encoded argument as text.
pub trait Decode: 'static {
    fn decode(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error>;
}

/// The ordered decode types of one argument list.
pub trait DecodeList: 'static {
    /// Decode chain for this type sequence, in argument order.
    const STEPS: &'static [DecodeStep];
}

/// Splits `N` bytes off the front of the payload.
#[inline]
fn head<const N: usize>(data: &[u8]) -> Result<[u8; N], Error> {
    data.get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(Error::Truncated {
            needed: N,
            remaining: data.len(),
        })
}

macro_rules! impl_plain_decode {
    ($($type:ty),* $(,)?) => {$(
        impl Decode for $type {
            fn decode(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error> {
                let value = <$type>::from_ne_bytes(head(data)?);
                write!(out, "{}", value)?;
                Ok(size_of::<$type>())
            }
        }
    )*};
}

impl_plain_decode!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Decode for bool {
    fn decode(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error> {
        let value = match head::<1>(data)?[0] {
            0 => false,
            1 => true,
            _ => return Err(Error::InvalidValue("bool")),
        };
        write!(out, "{}", value)?;
        Ok(1)
    }
}

impl Decode for char {
    fn decode(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error> {
        let scalar = u32::from_ne_bytes(head(data)?);
        let value = char::from_u32(scalar).ok_or(Error::InvalidValue("char"))?;
        write!(out, "{}", value)?;
        Ok(size_of::<u32>())
    }
}

/// Decode type shared by all text arguments: a zero-terminated byte run,
/// written verbatim.
pub struct Text;

impl Decode for Text {
    fn decode(out: &mut dyn io::Write, data: &[u8]) -> Result<usize, Error> {
        let len = data
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::Truncated {
                needed: data.len() + 1,
                remaining: data.len(),
            })?;
        out.write_all(&data[..len])?;
        Ok(len + 1)
    }
}

impl DecodeList for () {
    const STEPS: &'static [DecodeStep] = &[];
}

macro_rules! impl_decode_list {
    ($($name:ident),+) => {
        impl<$($name: Decode),+> DecodeList for ($($name,)+) {
            const STEPS: &'static [DecodeStep] = &[$(<$name as Decode>::decode as DecodeStep),+];
        }
    };
}

impl_decode_list!(A);
impl_decode_list!(A, B);
impl_decode_list!(A, B, C);
impl_decode_list!(A, B, C, D);
impl_decode_list!(A, B, C, D, E);
impl_decode_list!(A, B, C, D, E, F);
impl_decode_list!(A, B, C, D, E, F, G);
impl_decode_list!(A, B, C, D, E, F, G, H);
impl_decode_list!(A, B, C, D, E, F, G, H, I);
impl_decode_list!(A, B, C, D, E, F, G, H, I, J);
impl_decode_list!(A, B, C, D, E, F, G, H, I, J, K);
impl_decode_list!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Renders one payload through its decode chain.
///
/// Emits the literal text before each marker, then the argument decoded by the
/// matching step. Once the steps run out, the rest of the format string is
/// emitted verbatim followed by [`LINE_TERMINATOR`].
///
/// Every payload read is bounds-checked, so a chain that does not match its
/// payload fails with an error rather than reading past the record. Text
/// written to `out` before the failure is not retracted.
pub fn replay(
    out: &mut dyn io::Write,
    format: &str,
    steps: &[DecodeStep],
    payload: &[u8],
) -> Result<(), Error> {
    let mut format = format;
    let mut payload = payload;

    for (index, step) in steps.iter().enumerate() {
        // MARKER is ASCII, so `at + 1` stays on a char boundary.
        let at = format
            .bytes()
            .position(|b| b == MARKER)
            .ok_or(Error::MissingMarker(index))?;
        out.write_all(&format.as_bytes()[..at])?;

        let consumed = step(out, payload)?;
        payload = &payload[consumed..];
        format = &format[at + 1..];
    }

    if !payload.is_empty() {
        return Err(Error::TrailingPayload(payload.len()));
    }

    out.write_all(format.as_bytes())?;
    out.write_all(LINE_TERMINATOR)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: &str, steps: &[DecodeStep], payload: &[u8]) -> Result<String, Error> {
        let mut out = Vec::new();
        replay(&mut out, format, steps, payload)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_zero_markers() {
        let text = render("plain text", <() as DecodeList>::STEPS, &[]).unwrap();
        assert_eq!(text, "plain text\n");
    }

    #[test]
    fn test_mixed_arguments() {
        let mut payload = 42i32.to_ne_bytes().to_vec();
        payload.extend_from_slice(b"hi\0");

        let steps = <(i32, Text) as DecodeList>::STEPS;
        assert_eq!(steps.len(), 2);
        assert_eq!(render("x=% y=%", steps, &payload).unwrap(), "x=42 y=hi\n");
    }

    #[test]
    fn test_trailing_literal_after_last_marker() {
        let payload = 7u8.to_ne_bytes();
        let text = render("[%] done", <(u8,) as DecodeList>::STEPS, &payload).unwrap();
        assert_eq!(text, "[7] done\n");
    }

    #[test]
    fn test_empty_text_segment() {
        let text = render("<%>", <(Text,) as DecodeList>::STEPS, &[0]).unwrap();
        assert_eq!(text, "<>\n");
    }

    #[test]
    fn test_bool_and_char() {
        let mut payload = vec![1u8];
        payload.extend_from_slice(&u32::from('é').to_ne_bytes());
        let steps = <(bool, char) as DecodeList>::STEPS;
        assert_eq!(render("% %", steps, &payload).unwrap(), "true é\n");
    }

    #[test]
    fn test_truncated_plain_value() {
        let payload = [1u8, 2];
        let err = render("%", <(u64,) as DecodeList>::STEPS, &payload).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 8, remaining: 2 }));
    }

    #[test]
    fn test_unterminated_text() {
        let err = render("%", <(Text,) as DecodeList>::STEPS, b"abc").unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn test_missing_marker() {
        let payload = 1u16.to_ne_bytes();
        let err = render("no marker", <(u16,) as DecodeList>::STEPS, &payload).unwrap_err();
        assert!(matches!(err, Error::MissingMarker(0)));
    }

    #[test]
    fn test_trailing_payload() {
        let err = render("x", <() as DecodeList>::STEPS, &[0, 0]).unwrap_err();
        assert!(matches!(err, Error::TrailingPayload(2)));
    }

    #[test]
    fn test_invalid_bool() {
        let err = render("%", <(bool,) as DecodeList>::STEPS, &[2]).unwrap_err();
        assert!(matches!(err, Error::InvalidValue("bool")));
    }

    #[test]
    fn test_unused_markers_are_literal() {
        let payload = 5i64.to_ne_bytes();
        let text = render("% and %", <(i64,) as DecodeList>::STEPS, &payload).unwrap();
        assert_eq!(text, "5 and %\n");
    }
}
