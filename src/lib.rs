//! # Deferred Log
//!
//! A deferred logging codec. A call site records a format string and its
//! arguments into a compact binary record; the text is produced later, off
//! the hot path, from nothing but what the record captured.
//!
//! * **Cheap hot path**: a log call sizes its arguments and copies their bytes,
//!   nothing more. Number formatting and string building wait for decode.
//! * **Typed replay**: each call site's argument types select a decode chain
//!   at compile time; records carry no per-argument type tags.
//! * **Checked at build time**: `log_record!` rejects a format string whose
//!   marker count differs from its argument count.
//!
//! ## Main Components
//!
//! * `log_record!` / `write_record`: encode one log call into a record
//! * `args`: the `Loggable` and `ArgList` traits that size and pack arguments
//! * `decode`: per-type decode steps and `replay`, which renders a payload
//! * `record`: the fixed record `Header` and the `Record` view
//! * `registry`: interning of format strings and decode chains into handles
//! * `provider`: the `BufferProvider` boundary and `RecordQueue`
//! * `consume_all`: drains a provider into an output sink
//!
//! ## Format Strings
//!
//! Every `%` in a format string is a substitution marker. There is no escape
//! sequence, so a literal percent sign cannot appear in logged text.
//!
//! ## Quick Start
//!
//! ```
//! use deferred_log::{consume_all, log_record, RecordQueue};
//!
//! // A provider with a 64 KiB budget
//! let queue = RecordQueue::<65536>::new();
//!
//! // Hot path: copy bytes only
//! log_record!(queue, "Hello, world!").unwrap();
//! log_record!(queue, "x=% y=%", 42, "hi").unwrap();
//!
//! // Later, elsewhere: render text
//! let mut out = Vec::new();
//! consume_all(&queue, &mut out).unwrap();
//! assert_eq!(out, b"Hello, world!\nx=42 y=hi\n");
//! ```

pub mod args;
pub mod consume;
pub mod decode;
pub mod error;
pub mod logger;
pub mod placeholder;
pub mod provider;
pub mod record;
pub mod registry;

pub use args::{ArgList, Loggable};
pub use consume::consume_all;
pub use decode::{replay, Decode, DecodeList, DecodeStep, Text};
pub use error::Error;
pub use logger::{write_record, CallSite};
pub use placeholder::count_placeholders;
pub use provider::{BufferProvider, RecordQueue, Region};
pub use record::{Header, Record, HEADER_SIZE};
