//! The SNMP value universe: a closed tagged union, plus the `VarBind`
//! pair that carries one through a PDU.

use bytes::BytesMut;

use crate::asn1::{
    self, decode, encode, END_OF_MIB_VIEW_TAG, NO_SUCH_INSTANCE_TAG, NO_SUCH_OBJECT_TAG,
};
use crate::oid::Oid;

/// One of the three zero-length exception sentinels a GET/GETNEXT
/// response can carry instead of a real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl ErrorTag {
    pub fn tag(self) -> u8 {
        match self {
            ErrorTag::NoSuchObject => NO_SUCH_OBJECT_TAG,
            ErrorTag::NoSuchInstance => NO_SUCH_INSTANCE_TAG,
            ErrorTag::EndOfMibView => END_OF_MIB_VIEW_TAG,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            NO_SUCH_OBJECT_TAG => Some(ErrorTag::NoSuchObject),
            NO_SUCH_INSTANCE_TAG => Some(ErrorTag::NoSuchInstance),
            END_OF_MIB_VIEW_TAG => Some(ErrorTag::EndOfMibView),
            _ => None,
        }
    }
}

/// The value half of a `VarBind`: Null, Integer, OctetString, ObjectId,
/// Sequence, or one of the exception sentinels.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    OctetString(Vec<u8>),
    ObjectId(Oid),
    Sequence(Vec<VarBind>),
    ErrorTag(ErrorTag),
}

/// An `(oid, value)` pair, the unit the VarBindList is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        VarBind { oid, value }
    }
}

/// Decodes one VarBind: `SEQUENCE { OID, value }`.
pub fn decode_varbind(buf: &mut bytes::Bytes) -> asn1::Asn1Result<VarBind> {
    let mut content = decode::decode_sequence(buf)?;
    let oid = decode::decode_oid(&mut content)?;
    let value = decode_value(&mut content)?;
    Ok(VarBind::new(oid, value))
}

/// Decodes a single tagged value of any type this codec understands,
/// including the implicit-tag exception sentinels.
pub fn decode_value(buf: &mut bytes::Bytes) -> asn1::Asn1Result<Value> {
    let tag = decode::peek_tag(buf)?;
    match tag {
        asn1::INTEGER_TAG => Ok(Value::Integer(decode::decode_integer(buf)?)),
        asn1::OCTET_STRING_TAG => Ok(Value::OctetString(decode::decode_octet_string(buf)?)),
        asn1::NULL_TAG => {
            decode::decode_null(buf)?;
            Ok(Value::Null)
        }
        asn1::OBJECT_IDENTIFIER_TAG => Ok(Value::ObjectId(decode::decode_oid(buf)?)),
        asn1::SEQUENCE_TAG => {
            let mut content = decode::decode_sequence(buf)?;
            let mut varbinds = Vec::new();
            while bytes::Buf::has_remaining(&content) {
                varbinds.push(decode_varbind(&mut content)?);
            }
            Ok(Value::Sequence(varbinds))
        }
        NO_SUCH_OBJECT_TAG | NO_SUCH_INSTANCE_TAG | END_OF_MIB_VIEW_TAG => {
            let (tag, _) = decode::decode_tagged_container(
                buf,
                &[NO_SUCH_OBJECT_TAG, NO_SUCH_INSTANCE_TAG, END_OF_MIB_VIEW_TAG],
            )?;
            Ok(Value::ErrorTag(ErrorTag::from_tag(tag).expect("tag matched above")))
        }
        other => Err(asn1::Asn1Error::MalformedTag {
            expected: &[
                asn1::INTEGER_TAG,
                asn1::OCTET_STRING_TAG,
                asn1::NULL_TAG,
                asn1::OBJECT_IDENTIFIER_TAG,
                asn1::SEQUENCE_TAG,
            ],
            got: other,
        }),
    }
}

/// Encodes a value into `buf`, tagged appropriately.
pub fn encode_value(value: &Value, buf: &mut BytesMut) -> asn1::Asn1Result<()> {
    match value {
        Value::Null => encode::encode_null(buf),
        Value::Integer(v) => encode::encode_integer(*v, buf),
        Value::OctetString(bytes) => encode::encode_octet_string(bytes, buf),
        Value::ObjectId(oid) => encode::encode_oid(oid, buf)?,
        Value::Sequence(varbinds) => {
            let mut content = BytesMut::new();
            for vb in varbinds {
                encode_varbind(vb, &mut content)?;
            }
            encode::encode_tagged(&content, asn1::SEQUENCE_TAG, buf);
        }
        Value::ErrorTag(tag) => encode::encode_tagged(&[], tag.tag(), buf),
    }
    Ok(())
}

/// Encodes one VarBind: `SEQUENCE { OID, value }`.
pub fn encode_varbind(varbind: &VarBind, buf: &mut BytesMut) -> asn1::Asn1Result<()> {
    let mut content = BytesMut::new();
    encode::encode_oid(&varbind.oid, &mut content)?;
    encode_value(&varbind.value, &mut content)?;
    encode::encode_tagged(&content, asn1::SEQUENCE_TAG, buf);
    Ok(())
}
