//! Handle interning for record headers.
//!
//! A record header never stores addresses. It stores two compact ids: one for
//! its format string and one for its decode chain. This module maps them back
//! on the read side. The registry is process-wide and thread-safe; writers
//! only touch it the first time a call site is used, since `CallSite` caches
//! the ids it gets back.
//!
//! Id 0 is reserved in both tables and never handed out.

use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use tracing::debug;

use crate::decode::{DecodeList, DecodeStep};

/// Append-only interning table with dense ids starting at 1.
struct Table<K, V> {
    ids: HashMap<K, u16>,
    entries: Vec<V>,
}

impl<K: Eq + Hash, V: Copy> Table<K, V> {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn id(&self, key: &K) -> Option<u16> {
        self.ids.get(key).copied()
    }

    fn insert(&mut self, key: K, value: V) -> u16 {
        if let Some(id) = self.id(&key) {
            return id;
        }
        let id = u16::try_from(self.entries.len() + 1)
            .unwrap_or_else(|_| panic!("registry exhausted: more than {} entries", u16::MAX));
        self.entries.push(value);
        self.ids.insert(key, id);
        id
    }

    fn get(&self, id: u16) -> Option<V> {
        let index = usize::from(id).checked_sub(1)?;
        self.entries.get(index).copied()
    }
}

lazy_static! {
    /// Format string literals, deduplicated by content.
    static ref FORMATS: RwLock<Table<&'static str, &'static str>> = RwLock::new(Table::new());

    /// Decode chains, deduplicated by the type sequence they were generated for.
    static ref DECODERS: RwLock<Table<TypeId, &'static [DecodeStep]>> = RwLock::new(Table::new());
}

/// Registers a format string and returns its id.
///
/// Registering the same string again returns the same id.
///
/// ```
/// # use deferred_log::registry::{register_format, format};
/// let id = register_format("Temperature: % C");
/// assert_eq!(id, register_format("Temperature: % C"));
/// assert_eq!(format(id), Some("Temperature: % C"));
/// ```
pub fn register_format(format: &'static str) -> u16 {
    if let Some(id) = FORMATS.read().id(&format) {
        return id;
    }

    let id = FORMATS.write().insert(format, format);
    debug!(id, format, "registered format string");
    id
}

/// Looks up a format string by id.
pub fn format(id: u16) -> Option<&'static str> {
    FORMATS.read().get(id)
}

/// Registers the decode chain of type sequence `D` and returns its id.
///
/// Every call site with the same argument type sequence shares one id.
pub fn register_decoder<D: DecodeList>() -> u16 {
    let key = TypeId::of::<D>();
    if let Some(id) = DECODERS.read().id(&key) {
        return id;
    }

    let id = DECODERS.write().insert(key, D::STEPS);
    debug!(id, steps = D::STEPS.len(), decoders = std::any::type_name::<D>(), "registered decoder");
    id
}

/// Looks up a decode chain by id.
pub fn decoder(id: u16) -> Option<&'static [DecodeStep]> {
    DECODERS.read().get(id)
}
