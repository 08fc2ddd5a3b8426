use std::io;
use std::sync::Arc;
use std::thread;

use deferred_log::{consume_all, log_record, Error, RecordQueue};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const QUEUE_CAPACITY: usize = 1 << 20;
const WRITERS: usize = 4;
const RECORDS_PER_WRITER: u32 = 8;

fn main() -> Result<(), Error> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_timer(fmt::time::uptime())
        .with_writer(io::stderr)
        .init();

    let queue = Arc::new(RecordQueue::<QUEUE_CAPACITY>::new());

    let writers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || -> Result<(), Error> {
                let name = format!("writer-{}", writer);
                for seq in 0..RECORDS_PER_WRITER {
                    log_record!(queue, "[%] seq=% ratio=% ok=%", name, seq, f64::from(seq) / 8.0, seq % 2 == 0)?;
                }
                Ok(())
            })
        })
        .collect();

    for writer in writers {
        writer.join().expect("writer thread panicked")?;
    }
    info!(records = queue.len(), reserved = queue.reserved_bytes(), "writers finished");

    let (mut stdout, _guard) = tracing_appender::non_blocking(io::stdout());
    let consumed = consume_all(&*queue, &mut stdout)?;
    info!(consumed, "queue drained");
    Ok(())
}
