use std::net::UdpSocket;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::BytesMut;
use clap::Parser;

use snmp_agent::asn1::{self, encode};
use snmp_agent::{Oid, Value};

/// A minimal SNMPv1 GET client, mainly useful for exercising the agent
/// by hand.
#[derive(Parser, Debug)]
#[command(name = "snmpget-client", about = "Send a single SNMPv1 GetRequest")]
struct Args {
    /// Agent address, e.g. 127.0.0.1:16100.
    target: String,

    /// OID to fetch, dotted notation, e.g. 1.3.6.1.2.1.1.1.0.
    oid: String,

    /// Community string.
    #[arg(long, default_value = "public")]
    community: String,

    /// Reply timeout in milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
}

fn parse_oid(s: &str) -> Result<Oid> {
    let parts = s
        .split('.')
        .map(|p| p.parse::<u32>().context("OID sub-identifier must be a non-negative integer"))
        .collect::<Result<Vec<u32>>>()?;
    Ok(Oid::new(parts))
}

fn build_get_request(request_id: i32, community: &str, oid: &Oid) -> Result<BytesMut> {
    let mut varbind = BytesMut::new();
    encode::encode_oid(oid, &mut varbind)?;
    encode::encode_null(&mut varbind);
    let mut varbind_tagged = BytesMut::new();
    encode::encode_tagged(&varbind, asn1::SEQUENCE_TAG, &mut varbind_tagged);

    let mut varbind_list = BytesMut::new();
    encode::encode_tagged(&varbind_tagged, asn1::SEQUENCE_TAG, &mut varbind_list);

    let mut pdu_body = BytesMut::new();
    encode::encode_integer(request_id as i64, &mut pdu_body);
    encode::encode_integer(0, &mut pdu_body);
    encode::encode_integer(0, &mut pdu_body);
    pdu_body.extend_from_slice(&varbind_list);

    let mut pdu_tagged = BytesMut::new();
    encode::encode_tagged(&pdu_body, asn1::GET_REQUEST_TAG, &mut pdu_tagged);

    let mut msg_body = BytesMut::new();
    encode::encode_integer(0, &mut msg_body);
    encode::encode_octet_string(community.as_bytes(), &mut msg_body);
    msg_body.extend_from_slice(&pdu_tagged);

    let mut out = BytesMut::new();
    encode::encode_tagged(&msg_body, asn1::SEQUENCE_TAG, &mut out);
    Ok(out)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Integer(v) => format!("{v} (Integer)"),
        Value::OctetString(bytes) => {
            if bytes.iter().all(|&b| (32..=126).contains(&b)) {
                format!("\"{}\" (OctetString)", String::from_utf8_lossy(bytes))
            } else {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                format!("0x{hex} (OctetString)")
            }
        }
        Value::Null => "NULL".to_string(),
        Value::ObjectId(oid) => format!("{oid} (ObjectIdentifier)"),
        Value::Sequence(_) => "SEQUENCE".to_string(),
        Value::ErrorTag(tag) => format!("{tag:?}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let oid = parse_oid(&args.oid)?;

    let request = build_get_request(1, &args.community, &oid)?;

    let socket = UdpSocket::bind("0.0.0.0:0").context("failed to bind local UDP socket")?;
    socket
        .set_read_timeout(Some(Duration::from_millis(args.timeout_ms)))
        .context("failed to set read timeout")?;
    socket
        .send_to(&request, &args.target)
        .context("failed to send GetRequest")?;

    let mut buf = [0u8; snmp_agent::transport::MAX_DATAGRAM_SIZE];
    let (len, _) = socket
        .recv_from(&mut buf)
        .context("no response (timed out or connection refused)")?;

    let response = snmp_agent::pdu::decode_message(&buf[..len])?;
    for vb in &response.pdu.varbinds {
        println!("OID {} = {}", vb.oid, format_value(&vb.value));
    }
    Ok(())
}
