//! The Management Information Base: an ordered `OID -> Value` store.
//!
//! Exposed as a trait so the in-memory map used by this agent can be
//! swapped for another backend (a persistent store, a mock for tests)
//! without touching the listener or worker pool.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::oid::Oid;
use crate::value::{ErrorTag, Value};

/// Storage interface for the MIB: point lookup, lexicographic successor
/// lookup, and mutation.
pub trait MibStore: Send + Sync {
    /// Inserts or overwrites the value at `oid`.
    fn create(&self, oid: Oid, value: Value);

    /// Returns the value at `oid`, or the `NoSuchObject` sentinel.
    fn read(&self, oid: &Oid) -> Value;

    /// Returns the entry whose OID is the smallest strictly greater than
    /// `oid`, or `(oid.clone(), EndOfMibView)` when none remains.
    fn read_next(&self, oid: &Oid) -> (Oid, Value);

    /// Overwrites the value at `oid`, inserting if absent.
    fn update(&self, oid: Oid, value: Value);

    /// Removes the entry at `oid`; a no-op if absent.
    fn delete(&self, oid: &Oid);
}

/// Reference MIB backend: a `BTreeMap` behind a single reader/writer
/// lock. Reads (the common case under SNMP polling load) proceed
/// concurrently; writes take an exclusive lock. The lock is held only
/// across the map operation, never across network I/O.
#[derive(Default)]
pub struct InMemoryMib {
    data: RwLock<BTreeMap<Oid, Value>>,
}

impl InMemoryMib {
    pub fn new() -> Self {
        InMemoryMib {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of entries currently stored; mainly useful for tests and
    /// startup logging.
    pub fn len(&self) -> usize {
        self.data.read().expect("MIB lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MibStore for InMemoryMib {
    fn create(&self, oid: Oid, value: Value) {
        self.data.write().expect("MIB lock poisoned").insert(oid, value);
    }

    fn read(&self, oid: &Oid) -> Value {
        self.data
            .read()
            .expect("MIB lock poisoned")
            .get(oid)
            .cloned()
            .unwrap_or(Value::ErrorTag(ErrorTag::NoSuchObject))
    }

    fn read_next(&self, oid: &Oid) -> (Oid, Value) {
        let map = self.data.read().expect("MIB lock poisoned");
        match map.range((std::ops::Bound::Excluded(oid), std::ops::Bound::Unbounded)).next() {
            Some((next_oid, value)) => (next_oid.clone(), value.clone()),
            None => (oid.clone(), Value::ErrorTag(ErrorTag::EndOfMibView)),
        }
    }

    fn update(&self, oid: Oid, value: Value) {
        self.data.write().expect("MIB lock poisoned").insert(oid, value);
    }

    fn delete(&self, oid: &Oid) {
        self.data.write().expect("MIB lock poisoned").remove(oid);
    }
}
