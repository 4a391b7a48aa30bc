//! Encoders for the BER primitives this agent emits.
//!
//! All encoders append to a `BytesMut` scratch buffer rather than
//! returning a fresh allocation, matching how the PDU codec builds
//! compound values (children first, then tag + length of the whole).

use bytes::{BufMut, BytesMut};

use super::{
    Asn1Error, Asn1Result, INTEGER_TAG, NULL_TAG, OBJECT_IDENTIFIER_TAG, OCTET_STRING_TAG,
};
use crate::oid::Oid;

/// Short-form-only length encoder. Every length this agent ever emits
/// (1500-byte datagrams, well under the long-form threshold) fits in
/// short form; see `decode::decode_length` for the long-form reader the
/// spec asks for on input.
fn encode_length(len: usize, buf: &mut BytesMut) {
    debug_assert!(len < 128, "encoder only emits short-form lengths");
    buf.put_u8(len as u8);
}

/// Encodes an ASN.1 INTEGER: two's-complement, minimal-length, big-endian.
pub fn encode_integer(value: i64, buf: &mut BytesMut) {
    buf.put_u8(INTEGER_TAG);

    let mut temp = value;
    let mut len = 1usize;
    while temp > 127 || temp < -128 {
        temp >>= 8;
        len += 1;
    }

    encode_length(len, buf);
    for i in (0..len).rev() {
        let shift = i * 8;
        buf.put_u8(((value >> shift) & 0xFF) as u8);
    }
}

pub fn encode_octet_string(data: &[u8], buf: &mut BytesMut) {
    buf.put_u8(OCTET_STRING_TAG);
    encode_length(data.len(), buf);
    buf.put_slice(data);
}

pub fn encode_null(buf: &mut BytesMut) {
    buf.put_u8(NULL_TAG);
    buf.put_u8(0x00);
}

/// Encodes `content` as a tagged, length-prefixed block: `[tag][len][content]`.
/// Used for SEQUENCE and for the four command PDU tags, which are all
/// implicit SEQUENCEs on the wire.
pub fn encode_tagged(content: &[u8], tag: u8, buf: &mut BytesMut) {
    buf.put_u8(tag);
    encode_length(content.len(), buf);
    buf.put_slice(content);
}

/// Encodes an OBJECT IDENTIFIER: `40*oid[0]+oid[1]` head byte, then
/// base-128 continuation-encoded sub-identifiers, most significant digit
/// first.
pub fn encode_oid(oid: &Oid, buf: &mut BytesMut) -> Asn1Result<()> {
    let ids = oid.as_slice();
    if ids.len() < 2 {
        return Err(Asn1Error::InvalidOid(
            "object identifier needs at least two sub-identifiers",
        ));
    }

    let mut body = BytesMut::new();
    body.put_u8((40 * ids[0] + ids[1]) as u8);

    for &sub_id in &ids[2..] {
        encode_sub_id(sub_id, &mut body);
    }

    buf.put_u8(OBJECT_IDENTIFIER_TAG);
    encode_length(body.len(), buf);
    buf.put_slice(&body);
    Ok(())
}

fn encode_sub_id(value: u32, buf: &mut BytesMut) {
    if value < 128 {
        buf.put_u8(value as u8);
        return;
    }

    let mut digits = Vec::new();
    let mut temp = value;
    digits.push((temp & 0x7F) as u8);
    temp >>= 7;
    while temp > 0 {
        digits.push(((temp & 0x7F) | 0x80) as u8);
        temp >>= 7;
    }

    for &digit in digits.iter().rev() {
        buf.put_u8(digit);
    }
}
