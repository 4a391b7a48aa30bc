//! A minimal SNMPv1 agent: a BER/ASN.1 codec, an in-memory MIB, and a
//! threaded UDP listener built on top of them.
//!
//! [`asn1`] is the wire-format primitive layer, [`value`] and [`pdu`]
//! build the SNMP object model and message envelope on top of it,
//! [`mib`] is the storage backend the dispatcher reads and writes, and
//! [`pool`] plus [`listener`] are the concurrency shell that ties a UDP
//! socket to all of the above.

pub mod asn1;
pub mod listener;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod pool;
pub mod transport;
pub mod value;

pub use listener::{AgentConfig, Listener};
pub use mib::{InMemoryMib, MibStore};
pub use oid::Oid;
pub use value::{ErrorTag, Value, VarBind};
