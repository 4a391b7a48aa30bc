//! The SNMPv1 message envelope and PDU: parsing and building the
//! `SEQUENCE { version, community, pdu }` wrapper and its VarBindList.
//!
//! This module owns the envelope and PDU framing; the BER-level work
//! (tags, lengths, OID packing) lives in [`crate::asn1`].

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

use crate::asn1::{
    self, decode, encode, GET_NEXT_REQUEST_TAG, GET_REQUEST_TAG, GET_RESPONSE_TAG, SEQUENCE_TAG,
    SET_REQUEST_TAG, TRAP_TAG,
};
use crate::value::{decode_varbind, encode_varbind, VarBind};

pub const SNMP_VERSION_1: i64 = 0;

const COMMAND_TAGS: &[u8] = &[
    GET_REQUEST_TAG,
    GET_NEXT_REQUEST_TAG,
    GET_RESPONSE_TAG,
    SET_REQUEST_TAG,
    TRAP_TAG,
];

/// The five PDU command kinds this agent's envelope recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetRequest,
    GetNextRequest,
    GetResponse,
    SetRequest,
    Trap,
}

impl Command {
    pub fn tag(self) -> u8 {
        match self {
            Command::GetRequest => GET_REQUEST_TAG,
            Command::GetNextRequest => GET_NEXT_REQUEST_TAG,
            Command::GetResponse => GET_RESPONSE_TAG,
            Command::SetRequest => SET_REQUEST_TAG,
            Command::Trap => TRAP_TAG,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            GET_REQUEST_TAG => Some(Command::GetRequest),
            GET_NEXT_REQUEST_TAG => Some(Command::GetNextRequest),
            GET_RESPONSE_TAG => Some(Command::GetResponse),
            SET_REQUEST_TAG => Some(Command::SetRequest),
            TRAP_TAG => Some(Command::Trap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub command: Command,
    pub request_id: i32,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<VarBind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub version: i64,
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

#[derive(Debug, Error, PartialEq)]
pub enum PduError {
    #[error("unsupported SNMP version: {0}")]
    UnsupportedVersion(i64),
    #[error("request-id {0} does not fit in a 32-bit field")]
    RequestIdOutOfRange(i64),
    #[error("{0} trailing byte(s) after the last expected field")]
    TrailingBytes(usize),
    #[error(transparent)]
    Codec(#[from] asn1::Asn1Error),
}

pub type PduResult<T> = Result<T, PduError>;

fn expect_exhausted(buf: &Bytes) -> PduResult<()> {
    if buf.has_remaining() {
        return Err(PduError::TrailingBytes(buf.remaining()));
    }
    Ok(())
}

/// Decodes a full SNMPv1 message starting at offset 0 of `data`. Failure
/// at any step aborts with a typed error and surfaces no partial PDU; the
/// caller drops the datagram silently. The envelope SEQUENCE must be
/// exhaustively consumed: any byte left over after the PDU is rejected
/// rather than ignored.
pub fn decode_message(data: &[u8]) -> PduResult<Message> {
    let mut buf = Bytes::copy_from_slice(data);
    let mut msg = decode::decode_sequence(&mut buf)?;

    let version = decode::decode_integer(&mut msg)?;
    if version != SNMP_VERSION_1 {
        return Err(PduError::UnsupportedVersion(version));
    }

    let community = decode::decode_octet_string(&mut msg)?;
    let pdu = decode_pdu(&mut msg)?;
    expect_exhausted(&msg)?;

    Ok(Message {
        version,
        community,
        pdu,
    })
}

fn decode_pdu(buf: &mut Bytes) -> PduResult<Pdu> {
    let (tag, mut content) = decode::decode_tagged_container(buf, COMMAND_TAGS)?;
    let command = Command::from_tag(tag).expect("tag checked against COMMAND_TAGS");

    let request_id = decode::decode_integer(&mut content)?;
    let request_id: i32 = request_id
        .try_into()
        .map_err(|_| PduError::RequestIdOutOfRange(request_id))?;
    let error_status = decode::decode_integer(&mut content)?;
    let error_index = decode::decode_integer(&mut content)?;
    let varbinds = decode_varbind_list(&mut content)?;
    expect_exhausted(&content)?;

    Ok(Pdu {
        command,
        request_id,
        error_status,
        error_index,
        varbinds,
    })
}

fn decode_varbind_list(buf: &mut Bytes) -> PduResult<Vec<VarBind>> {
    let mut content = decode::decode_sequence(buf)?;
    let mut varbinds = Vec::new();
    while content.has_remaining() {
        varbinds.push(decode_varbind(&mut content)?);
    }
    Ok(varbinds)
}

/// Builds a `GetResponse` message that echoes `request.request_id` and
/// `request.community`, carrying `response_varbinds` and the given error
/// fields. This is the only message shape the agent ever sends: the
/// command tag in the response is always GetResponse regardless of the
/// request's command.
pub fn build_response_message(
    request: &Message,
    response_varbinds: Vec<VarBind>,
    error_status: i64,
    error_index: i64,
) -> PduResult<BytesMut> {
    let mut varbind_list = BytesMut::new();
    for vb in &response_varbinds {
        encode_varbind(vb, &mut varbind_list)?;
    }
    let mut varbind_list_tagged = BytesMut::new();
    encode::encode_tagged(&varbind_list, SEQUENCE_TAG, &mut varbind_list_tagged);

    let mut pdu_body = BytesMut::new();
    encode::encode_integer(request.pdu.request_id as i64, &mut pdu_body);
    encode::encode_integer(error_status, &mut pdu_body);
    encode::encode_integer(error_index, &mut pdu_body);
    pdu_body.extend_from_slice(&varbind_list_tagged);

    let mut pdu_tagged = BytesMut::new();
    encode::encode_tagged(&pdu_body, Command::GetResponse.tag(), &mut pdu_tagged);

    let mut msg_body = BytesMut::new();
    encode::encode_integer(request.version, &mut msg_body);
    encode::encode_octet_string(&request.community, &mut msg_body);
    msg_body.extend_from_slice(&pdu_tagged);

    let mut out = BytesMut::new();
    encode::encode_tagged(&msg_body, SEQUENCE_TAG, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::Oid;
    use crate::value::Value;

    // A captured GetRequest for sysDescr.0 against the "public" community.
    const GET_SYS_DESCR_REQUEST: &[u8] = &[
        0x30, 0x29, 0x02, 0x01, 0x00, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6C, 0x69, 0x63, 0xA0, 0x1C,
        0x02, 0x04, 0x20, 0xA5, 0xD3, 0xE3, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30,
        0x0C, 0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
    ];

    #[test]
    fn decodes_literal_get_sys_descr_request() {
        let msg = decode_message(GET_SYS_DESCR_REQUEST).unwrap();
        assert_eq!(msg.version, 0);
        assert_eq!(msg.community, b"public");
        assert_eq!(msg.pdu.command, Command::GetRequest);
        assert_eq!(msg.pdu.request_id, 0x20A5D3E3u32 as i32);
        assert_eq!(msg.pdu.error_status, 0);
        assert_eq!(msg.pdu.error_index, 0);
        assert_eq!(msg.pdu.varbinds.len(), 1);
        assert_eq!(
            msg.pdu.varbinds[0].oid,
            Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 1, 0])
        );
        assert_eq!(msg.pdu.varbinds[0].value, Value::Null);
    }

    #[test]
    fn response_echoes_request_id_and_uses_get_response_command() {
        let request = decode_message(GET_SYS_DESCR_REQUEST).unwrap();
        let response_varbinds = vec![VarBind::new(
            request.pdu.varbinds[0].oid.clone(),
            Value::OctetString(b"SNMP Server C++ Header-Only Library".to_vec()),
        )];

        let encoded = build_response_message(&request, response_varbinds, 0, 0).unwrap();
        let decoded = decode_message(&encoded).unwrap();

        assert_eq!(decoded.pdu.command, Command::GetResponse);
        assert_eq!(decoded.pdu.request_id, request.pdu.request_id);
        assert_eq!(decoded.pdu.varbinds.len(), 1);
    }

    #[test]
    fn rejects_non_v1_version() {
        // Same bytes as above but with version byte flipped to 1.
        let mut bytes = GET_SYS_DESCR_REQUEST.to_vec();
        bytes[4] = 0x01;
        let err = decode_message(&bytes).unwrap_err();
        assert_eq!(err, PduError::UnsupportedVersion(1));
    }

    #[test]
    fn truncated_community_length_is_rejected_not_panicking() {
        let bytes: &[u8] = &[0x30, 0x05, 0x02, 0x01, 0x00, 0x04, 0xFF];
        assert!(decode_message(bytes).is_err());
    }
}
