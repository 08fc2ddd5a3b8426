/// Substitution marker recognized in format strings.
///
/// The marker is taken literally and has no escape sequence: every `%` in a
/// format string is a substitution point, so a literal percent sign cannot be
/// expressed.
pub const MARKER: u8 = b'%';

/// Counts the substitution markers in a format string.
///
/// Usable in constant context, which is how `log_record!` rejects argument
/// count mismatches at build time.
///
/// ```
/// # use deferred_log::count_placeholders;
/// const N: usize = count_placeholders("x=% y=%");
/// assert_eq!(N, 2);
/// ```
pub const fn count_placeholders(format: &str) -> usize {
    let bytes = format.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == MARKER {
            count += 1;
        }
        i += 1;
    }
    count
}

/// Compile-time marker/argument check used by `log_record!`.
#[doc(hidden)]
#[macro_export]
macro_rules! __assert_placeholders {
    ($fmt:literal, $($arg:expr),*) => {
        const _: () = assert!(
            $crate::placeholder::count_placeholders($fmt) == 0usize $(+ $crate::__one!($arg))*,
            "Number of arguments mismatch"
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __one {
    ($arg:expr) => {
        1usize
    };
}
