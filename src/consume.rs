use std::io;

use tracing::{trace, warn};

use crate::error::Error;
use crate::provider::BufferProvider;
use crate::record::Record;

/// Drains every published record from `provider` and renders it into `out`.
///
/// Records are decoded in the order the provider yields them, one line each.
/// Each region is released back to the provider once decoded, whether or not
/// decoding succeeded.
///
/// Returns the number of records rendered. On the first failure the error is
/// returned right after its region is released; records behind it stay queued
/// for the next call.
///
/// # Examples
///
/// ```
/// # use deferred_log::{consume_all, log_record, RecordQueue};
/// let queue = RecordQueue::<1024>::new();
/// log_record!(queue, "x=% y=%", 42, "hi").unwrap();
///
/// let mut out = Vec::new();
/// assert_eq!(consume_all(&queue, &mut out).unwrap(), 1);
/// assert_eq!(out, b"x=42 y=hi\n");
/// ```
pub fn consume_all<P>(provider: &P, out: &mut dyn io::Write) -> Result<usize, Error>
where
    P: BufferProvider + ?Sized,
{
    let mut consumed = 0;

    while let Some(region) = provider.next_read_region() {
        let result = Record::parse(&*region).and_then(|record| record.decode(&mut *out));
        provider.release(region);

        if let Err(err) = result {
            warn!(consumed, error = %err, "failed to decode record");
            return Err(err);
        }
        consumed += 1;
        trace!(consumed, "record decoded");
    }

    if consumed > 0 {
        out.flush()?;
    }
    Ok(consumed)
}
