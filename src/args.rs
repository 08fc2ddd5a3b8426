use std::borrow::Cow;
use std::mem::size_of;

use crate::decode::{Decode, DecodeList, Text};

/// A value that can be captured into a record payload.
///
/// Sizing and encoding are both derived from the same impl, so the size
/// calculator and the encoder cannot drift apart per type. `Decoder` names the
/// `'static` type that replays the encoding later; it is the only piece of
/// type information that outlives the call site.
pub trait Loggable {
    /// Decode step that turns this type's encoding back into text.
    type Decoder: Decode;

    /// Number of bytes `encode` will write, without copying anything.
    fn encoded_size(&self) -> usize;

    /// Writes the encoding at the start of `buf` and returns the byte count.
    ///
    /// `buf` must hold at least `encoded_size()` bytes.
    fn encode(&self, buf: &mut [u8]) -> usize;
}

// Plain values: raw native-endian representation, fixed size.
macro_rules! impl_plain {
    ($($type:ty),* $(,)?) => {$(
        impl Loggable for $type {
            type Decoder = $type;

            #[inline(always)]
            fn encoded_size(&self) -> usize {
                size_of::<$type>()
            }

            #[inline(always)]
            fn encode(&self, buf: &mut [u8]) -> usize {
                let bytes = self.to_ne_bytes();
                buf[..bytes.len()].copy_from_slice(&bytes);
                bytes.len()
            }
        }
    )*};
}

impl_plain!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Loggable for bool {
    type Decoder = bool;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        1
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        buf[0] = u8::from(*self);
        1
    }
}

impl Loggable for char {
    type Decoder = char;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        size_of::<u32>()
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        u32::from(*self).encode(buf)
    }
}

/// Bytes of `s` that fit in a zero-terminated run: everything before the
/// first NUL.
#[inline(always)]
fn terminated_run(s: &str) -> &[u8] {
    let bytes = s.as_bytes();
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

impl Loggable for str {
    type Decoder = Text;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        terminated_run(self).len() + 1
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        let run = terminated_run(self);
        buf[..run.len()].copy_from_slice(run);
        buf[run.len()] = 0;
        run.len() + 1
    }
}

impl Loggable for String {
    type Decoder = Text;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        self.as_str().encoded_size()
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        self.as_str().encode(buf)
    }
}

impl Loggable for Cow<'_, str> {
    type Decoder = Text;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        str::encoded_size(self)
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        str::encode(self, buf)
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    type Decoder = T::Decoder;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        T::encoded_size(self)
    }

    #[inline(always)]
    fn encode(&self, buf: &mut [u8]) -> usize {
        T::encode(self, buf)
    }
}

/// An ordered argument list for one log call: a tuple of borrowed
/// [`Loggable`] values.
///
/// `Decoders` is the tuple of the arguments' decode types. It depends only on
/// the argument types, never their values, which is what lets one decode
/// chain serve every record written from the same signature.
pub trait ArgList {
    type Decoders: DecodeList;

    /// Number of arguments in the list.
    const LEN: usize;

    /// Total payload bytes, the sum of each argument's encoded size.
    fn encoded_size(&self) -> usize;

    /// Packs every argument into `buf` back to back and returns the total
    /// number of bytes written.
    fn encode(&self, buf: &mut [u8]) -> usize;
}

impl ArgList for () {
    type Decoders = ();
    const LEN: usize = 0;

    #[inline(always)]
    fn encoded_size(&self) -> usize {
        0
    }

    #[inline(always)]
    fn encode(&self, _buf: &mut [u8]) -> usize {
        0
    }
}

macro_rules! impl_arg_list {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<'a, $($name: Loggable + ?Sized),+> ArgList for ($(&'a $name,)+) {
            type Decoders = ($($name::Decoder,)+);
            const LEN: usize = $len;

            #[inline(always)]
            fn encoded_size(&self) -> usize {
                0 $(+ Loggable::encoded_size(self.$idx))+
            }

            #[inline(always)]
            fn encode(&self, buf: &mut [u8]) -> usize {
                let mut pos = 0;
                $(pos += Loggable::encode(self.$idx, &mut buf[pos..]);)+
                pos
            }
        }
    };
}

impl_arg_list!(1; A 0);
impl_arg_list!(2; A 0, B 1);
impl_arg_list!(3; A 0, B 1, C 2);
impl_arg_list!(4; A 0, B 1, C 2, D 3);
impl_arg_list!(5; A 0, B 1, C 2, D 3, E 4);
impl_arg_list!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_arg_list!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_arg_list!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_arg_list!(9; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_arg_list!(10; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_arg_list!(11; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_arg_list!(12; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);
