//! BER (Basic Encoding Rules) primitives shared by the PDU codec.
//!
//! This module deals only in tags, lengths, and the handful of ASN.1
//! universal/application types SNMPv1 needs. It knows nothing about PDUs
//! or the MIB.

pub mod decode;
pub mod encode;

/// ASN.1 BER tag constants used by this agent.
pub const INTEGER_TAG: u8 = 0x02;
pub const OCTET_STRING_TAG: u8 = 0x04;
pub const NULL_TAG: u8 = 0x05;
pub const OBJECT_IDENTIFIER_TAG: u8 = 0x06;
pub const SEQUENCE_TAG: u8 = 0x30;

pub const GET_REQUEST_TAG: u8 = 0xA0;
pub const GET_NEXT_REQUEST_TAG: u8 = 0xA1;
pub const GET_RESPONSE_TAG: u8 = 0xA2;
pub const SET_REQUEST_TAG: u8 = 0xA3;
pub const TRAP_TAG: u8 = 0xA4;

pub const NO_SUCH_OBJECT_TAG: u8 = 0x80;
pub const NO_SUCH_INSTANCE_TAG: u8 = 0x81;
pub const END_OF_MIB_VIEW_TAG: u8 = 0x82;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Asn1Error {
    #[error("malformed tag: expected one of {expected:02x?}, got {got:#04x}")]
    MalformedTag { expected: &'static [u8], got: u8 },
    #[error("truncated buffer: needed {needed} byte(s), had {available}")]
    TruncatedBuffer { needed: usize, available: usize },
    #[error("declared length {declared} exceeds {available} remaining byte(s)")]
    LengthOverflow { declared: usize, available: usize },
    #[error("invalid length encoding")]
    InvalidLength,
    #[error("invalid object identifier: {0}")]
    InvalidOid(&'static str),
    #[error("integer payload too wide: {0} byte(s)")]
    IntegerTooWide(usize),
}

pub type Asn1Result<T> = Result<T, Asn1Error>;
