//! Decoders for the BER primitives this agent consumes.
//!
//! Every function advances `buf` past whatever it reads and returns a
//! typed value, or an [`Asn1Error`] on malformed input. On error the
//! caller's job is just to abort the whole decode and drop the datagram,
//! not to try to salvage a partially-consumed buffer.

use bytes::{Buf, Bytes};

use super::{Asn1Error, Asn1Result, INTEGER_TAG, NULL_TAG, OBJECT_IDENTIFIER_TAG, OCTET_STRING_TAG};
use crate::oid::Oid;

pub fn peek_tag(buf: &Bytes) -> Asn1Result<u8> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::TruncatedBuffer {
            needed: 1,
            available: 0,
        });
    }
    Ok(buf[0])
}

pub fn decode_tag(buf: &mut Bytes) -> Asn1Result<u8> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::TruncatedBuffer {
            needed: 1,
            available: 0,
        });
    }
    Ok(buf.get_u8())
}

fn expect_tag(buf: &mut Bytes, tag: u8) -> Asn1Result<()> {
    let got = decode_tag(buf)?;
    if got != tag {
        return Err(Asn1Error::MalformedTag {
            expected: tag_name(tag),
            got,
        });
    }
    Ok(())
}

/// Names the one tag we expected, for the error message only.
fn tag_name(tag: u8) -> &'static [u8] {
    match tag {
        super::INTEGER_TAG => &[super::INTEGER_TAG],
        super::OCTET_STRING_TAG => &[super::OCTET_STRING_TAG],
        super::NULL_TAG => &[super::NULL_TAG],
        super::OBJECT_IDENTIFIER_TAG => &[super::OBJECT_IDENTIFIER_TAG],
        super::SEQUENCE_TAG => &[super::SEQUENCE_TAG],
        _ => &[],
    }
}

/// Reads a BER length. Short form (0..127) in one byte; long form
/// (0x81..0x84 followed by 1..4 big-endian bytes) is accepted on decode
/// for interop with standard tooling that emits it.
pub fn decode_length(buf: &mut Bytes) -> Asn1Result<usize> {
    if buf.remaining() < 1 {
        return Err(Asn1Error::TruncatedBuffer {
            needed: 1,
            available: 0,
        });
    }

    let first_byte = buf.get_u8();
    if first_byte < 0x80 {
        return Ok(first_byte as usize);
    }

    let num_bytes = (first_byte & 0x7F) as usize;
    if num_bytes == 0 || num_bytes > 4 {
        return Err(Asn1Error::InvalidLength);
    }
    if buf.remaining() < num_bytes {
        return Err(Asn1Error::TruncatedBuffer {
            needed: num_bytes,
            available: buf.remaining(),
        });
    }

    let mut length: usize = 0;
    for _ in 0..num_bytes {
        length = (length << 8) | (buf.get_u8() as usize);
    }
    Ok(length)
}

fn take_content(buf: &mut Bytes, length: usize) -> Asn1Result<Bytes> {
    if buf.remaining() < length {
        return Err(Asn1Error::LengthOverflow {
            declared: length,
            available: buf.remaining(),
        });
    }
    Ok(buf.split_to(length))
}

/// Reads a SEQUENCE (tag 0x30) and returns its content as an independent
/// buffer, leaving `buf` positioned right after it.
pub fn decode_sequence(buf: &mut Bytes) -> Asn1Result<Bytes> {
    expect_tag(buf, super::SEQUENCE_TAG)?;
    let length = decode_length(buf)?;
    take_content(buf, length)
}

/// Reads any tagged container whose tag is one of `allowed` (used for the
/// four implicit-SEQUENCE command PDUs, which share this shape with
/// SEQUENCE but carry an application-specific tag). Returns the matched
/// tag alongside the content.
pub fn decode_tagged_container(buf: &mut Bytes, allowed: &'static [u8]) -> Asn1Result<(u8, Bytes)> {
    let tag = decode_tag(buf)?;
    if !allowed.contains(&tag) {
        return Err(Asn1Error::MalformedTag {
            expected: allowed,
            got: tag,
        });
    }
    let length = decode_length(buf)?;
    let content = take_content(buf, length)?;
    Ok((tag, content))
}

/// Decodes an ASN.1 INTEGER as a signed 64-bit value (two's complement,
/// big-endian).
pub fn decode_integer(buf: &mut Bytes) -> Asn1Result<i64> {
    expect_tag(buf, INTEGER_TAG)?;
    let length = decode_length(buf)?;
    if length == 0 || length > 8 {
        return Err(Asn1Error::IntegerTooWide(length));
    }
    let mut bytes = take_content(buf, length)?;

    let first_byte = bytes.get_u8();
    let mut value: i64 = if (first_byte & 0x80) != 0 { -1 } else { 0 };
    value = (value << 8) | (first_byte as i64);

    while bytes.remaining() > 0 {
        value = (value << 8) | (bytes.get_u8() as i64);
    }

    Ok(value)
}

pub fn decode_octet_string(buf: &mut Bytes) -> Asn1Result<Vec<u8>> {
    expect_tag(buf, OCTET_STRING_TAG)?;
    let length = decode_length(buf)?;
    let content = take_content(buf, length)?;
    Ok(content.to_vec())
}

pub fn decode_null(buf: &mut Bytes) -> Asn1Result<()> {
    expect_tag(buf, NULL_TAG)?;
    let length = decode_length(buf)?;
    if length != 0 {
        return Err(Asn1Error::InvalidLength);
    }
    Ok(())
}

/// Decodes an OBJECT IDENTIFIER: first byte splits into `(b/40, b%40)`,
/// remaining bytes are base-128 continuation-encoded sub-identifiers.
pub fn decode_oid(buf: &mut Bytes) -> Asn1Result<Oid> {
    expect_tag(buf, OBJECT_IDENTIFIER_TAG)?;
    let length = decode_length(buf)?;
    let mut content = take_content(buf, length)?;

    if content.remaining() == 0 {
        return Err(Asn1Error::InvalidOid("zero-length OBJECT IDENTIFIER"));
    }

    let first_byte = content.get_u8();
    let mut ids = vec![(first_byte / 40) as u32, (first_byte % 40) as u32];

    while content.remaining() > 0 {
        let mut value: u32 = 0;
        loop {
            if content.remaining() == 0 {
                return Err(Asn1Error::InvalidOid(
                    "sub-identifier continuation ran past content length",
                ));
            }
            let byte = content.get_u8();
            value = (value << 7) | ((byte & 0x7F) as u32);
            if (byte & 0x80) == 0 {
                break;
            }
        }
        ids.push(value);
    }

    Ok(Oid::new(ids))
}
