//! The listener/dispatcher state machine: receive loop on one thread,
//! worker-pool dispatch, and the per-request protocol handling that
//! turns a decoded PDU into a response.
//!
//! One thread does nothing but `receive` and `enqueue`; everything else
//! (decode, MIB access, encode, send) happens inside a pooled worker so
//! the listener thread is never blocked on anything but the socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::mib::MibStore;
use crate::pdu::{self, Command, Message};
use crate::pool::{PoolHandle, WorkerPool};
use crate::transport::{TransportError, UdpTransport, MAX_DATAGRAM_SIZE};
use crate::value::VarBind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum State {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for State {
    fn from(v: u8) -> Self {
        match v {
            0 => State::Idle,
            1 => State::Running,
            2 => State::Stopping,
            _ => State::Stopped,
        }
    }
}

/// Configuration the listener needs beyond the MIB itself.
pub struct AgentConfig {
    /// Accepted community strings. Empty means accept any community.
    pub communities: Vec<String>,
    /// Number of worker threads in the pool.
    pub workers: usize,
    /// When `true` (the default), `SetRequest` is a no-op that echoes the
    /// submitted varbinds back without touching the MIB.
    pub read_only: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            communities: Vec::new(),
            workers: 4,
            read_only: true,
        }
    }
}

fn community_accepted(communities: &[String], community: &[u8]) -> bool {
    if communities.is_empty() {
        return true;
    }
    let community = String::from_utf8_lossy(community);
    communities.iter().any(|c| c.as_str() == community)
}

/// Drives the listener through `Idle -> Running -> Stopping -> Stopped`.
pub struct Listener {
    mib: Arc<dyn MibStore>,
    config: AgentConfig,
    transport: Option<Arc<UdpTransport>>,
    pool: Option<WorkerPool>,
    listener_thread: Option<JoinHandle<()>>,
    state: Arc<AtomicU8>,
}

impl Listener {
    pub fn new(mib: Arc<dyn MibStore>, config: AgentConfig) -> Self {
        Listener {
            mib,
            config,
            transport: None,
            pool: None,
            listener_thread: None,
            state: Arc::new(AtomicU8::new(State::Idle as u8)),
        }
    }

    fn state(&self) -> State {
        State::from(self.state.load(Ordering::SeqCst))
    }

    /// Opens the socket and spawns the listener thread. `Idle -> Running`.
    pub fn start(&mut self, addr: &str) -> Result<(), TransportError> {
        assert_eq!(self.state(), State::Idle, "listener already started");

        let transport = Arc::new(UdpTransport::bind(addr)?);
        let pool = WorkerPool::new(self.config.workers.max(1));
        let pool_handle = pool.handle();

        self.state.store(State::Running as u8, Ordering::SeqCst);

        let thread_transport = Arc::clone(&transport);
        let mib = Arc::clone(&self.mib);
        let communities = self.config.communities.clone();
        let read_only = self.config.read_only;
        let state = Arc::clone(&self.state);

        let listener_thread = thread::Builder::new()
            .name("snmp-listener".to_string())
            .spawn(move || run_loop(thread_transport, pool_handle, mib, communities, read_only, state))
            .expect("failed to spawn listener thread");

        log::info!(
            "SNMP agent listening on {}",
            transport
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_default()
        );

        self.transport = Some(transport);
        self.pool = Some(pool);
        self.listener_thread = Some(listener_thread);

        Ok(())
    }

    /// The bound socket address, once `start` has succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.as_ref().and_then(|t| t.local_addr().ok())
    }

    /// `Running -> Stopping -> Stopped`: stop flag, socket shutdown to
    /// unblock `receive`, join the listener thread, stop the worker pool
    /// (which joins its workers), drop the socket.
    pub fn stop(&mut self) {
        if self.state() != State::Running {
            return;
        }
        self.state.store(State::Stopping as u8, Ordering::SeqCst);

        if let Some(transport) = &self.transport {
            transport.shutdown();
        }
        if let Some(handle) = self.listener_thread.take() {
            let _ = handle.join();
        }
        if let Some(mut pool) = self.pool.take() {
            pool.stop();
        }
        self.transport = None;
        self.state.store(State::Stopped as u8, Ordering::SeqCst);
        log::info!("SNMP agent stopped");
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    transport: Arc<UdpTransport>,
    pool: PoolHandle,
    mib: Arc<dyn MibStore>,
    communities: Vec<String>,
    read_only: bool,
    state: Arc<AtomicU8>,
) {
    loop {
        if State::from(state.load(Ordering::SeqCst)) != State::Running {
            break;
        }

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        match transport.receive(&mut buf) {
            Ok((data, src_addr)) => {
                if State::from(state.load(Ordering::SeqCst)) != State::Running {
                    break;
                }
                let mib = Arc::clone(&mib);
                let communities = communities.clone();
                let transport = Arc::clone(&transport);
                let submitted = pool.submit(move || {
                    handle_datagram(&data, src_addr, mib.as_ref(), &communities, read_only, &transport);
                });
                if let Err(e) = submitted {
                    log::warn!("dropping datagram from {src_addr}: {e}");
                }
            }
            Err(TransportError::Closed) => break,
            Err(e) => log::warn!("receive error: {e}"),
        }
    }
}

/// One worker task: decode-or-drop, per-varbind dispatch, build
/// response, send.
fn handle_datagram(
    data: &[u8],
    src_addr: SocketAddr,
    mib: &dyn MibStore,
    communities: &[String],
    read_only: bool,
    transport: &UdpTransport,
) {
    let request = match pdu::decode_message(data) {
        Ok(msg) => msg,
        Err(e) => {
            log::debug!("dropping malformed datagram from {src_addr}: {e}");
            return;
        }
    };

    if !community_accepted(communities, &request.community) {
        log::debug!(
            "dropping datagram from {src_addr}: community rejected"
        );
        return;
    }

    let response_varbinds = dispatch(&request, mib, read_only);

    let response = match pdu::build_response_message(&request, response_varbinds, 0, 0) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("failed to encode response for {src_addr}: {e}");
            return;
        }
    };

    if let Err(e) = transport.send(&response, src_addr) {
        log::warn!("failed to send response to {src_addr}: {e}");
    }
}

fn dispatch(request: &Message, mib: &dyn MibStore, read_only: bool) -> Vec<VarBind> {
    match request.pdu.command {
        Command::GetRequest => request
            .pdu
            .varbinds
            .iter()
            .map(|vb| VarBind::new(vb.oid.clone(), mib.read(&vb.oid)))
            .collect(),
        Command::GetNextRequest => request
            .pdu
            .varbinds
            .iter()
            .map(|vb| {
                let (next_oid, value) = mib.read_next(&vb.oid);
                VarBind::new(next_oid, value)
            })
            .collect(),
        Command::SetRequest => request
            .pdu
            .varbinds
            .iter()
            .map(|vb| {
                if !read_only {
                    mib.update(vb.oid.clone(), vb.value.clone());
                }
                vb.clone()
            })
            .collect(),
        // Neither has a meaningful reply in real SNMP; echo the varbinds
        // back unchanged rather than reject the request.
        Command::Trap | Command::GetResponse => request.pdu.varbinds.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mib::InMemoryMib;
    use crate::oid::Oid;
    use crate::value::Value;
    use std::net::UdpSocket;
    use std::time::Duration;

    fn start_test_agent(mib: Arc<dyn MibStore>) -> Listener {
        let mut listener = Listener::new(
            mib,
            AgentConfig {
                communities: vec!["public".to_string()],
                workers: 4,
                read_only: true,
            },
        );
        listener.start("127.0.0.1:0").unwrap();
        listener
    }

    fn udp_client() -> UdpSocket {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        sock
    }

    // A captured GetRequest for sysDescr.0 against the "public" community.
    const GET_SYS_DESCR_REQUEST: &[u8] = &[
        0x30, 0x29, 0x02, 0x01, 0x00, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6C, 0x69, 0x63, 0xA0, 0x1C,
        0x02, 0x04, 0x20, 0xA5, 0xD3, 0xE3, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30,
        0x0C, 0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
    ];

    #[test]
    fn get_sys_descr_end_to_end() {
        let mib = Arc::new(InMemoryMib::new());
        mib.create(
            Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 1, 0]),
            Value::OctetString(b"SNMP Server C++ Header-Only Library".to_vec()),
        );
        let mut agent = start_test_agent(mib);
        let addr = agent.local_addr().unwrap();

        let client = udp_client();
        client.send_to(GET_SYS_DESCR_REQUEST, addr).unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        let response = pdu::decode_message(&buf[..len]).unwrap();

        assert_eq!(response.pdu.command, Command::GetResponse);
        assert_eq!(response.pdu.request_id, 0x20A5D3E3u32 as i32);
        assert_eq!(response.pdu.error_status, 0);
        assert_eq!(
            response.pdu.varbinds[0].value,
            Value::OctetString(b"SNMP Server C++ Header-Only Library".to_vec())
        );

        agent.stop();
    }

    #[test]
    fn get_next_walk_then_end_of_mib_view() {
        let mib = Arc::new(InMemoryMib::new());
        for (i, v) in [111i64, 222, 333, 444].into_iter().enumerate() {
            let mut ids = vec![1u32, 3, 6, 1, 4, 1, 121, 1];
            ids.push((i + 1) as u32);
            mib.create(Oid::new(ids), Value::Integer(v));
        }
        let read_only = true;

        let first = dispatch(
            &Message {
                version: 0,
                community: b"public".to_vec(),
                pdu: crate::pdu::Pdu {
                    command: Command::GetNextRequest,
                    request_id: 1,
                    error_status: 0,
                    error_index: 0,
                    varbinds: vec![VarBind::new(
                        Oid::new(vec![1, 3, 6, 1, 4, 1, 121]),
                        Value::Null,
                    )],
                },
            },
            mib.as_ref(),
            read_only,
        );
        assert_eq!(first[0].oid, Oid::new(vec![1, 3, 6, 1, 4, 1, 121, 1, 1]));
        assert_eq!(first[0].value, Value::Integer(111));

        let past_last = dispatch(
            &Message {
                version: 0,
                community: b"public".to_vec(),
                pdu: crate::pdu::Pdu {
                    command: Command::GetNextRequest,
                    request_id: 2,
                    error_status: 0,
                    error_index: 0,
                    varbinds: vec![VarBind::new(
                        Oid::new(vec![1, 3, 6, 1, 4, 1, 121, 1, 4]),
                        Value::Null,
                    )],
                },
            },
            mib.as_ref(),
            read_only,
        );
        assert_eq!(
            past_last[0].oid,
            Oid::new(vec![1, 3, 6, 1, 4, 1, 121, 1, 4])
        );
        assert_eq!(
            past_last[0].value,
            Value::ErrorTag(crate::value::ErrorTag::EndOfMibView)
        );
    }

    #[test]
    fn get_unknown_oid_yields_no_such_object() {
        let mib = Arc::new(InMemoryMib::new());
        let mut agent = start_test_agent(mib);
        let addr = agent.local_addr().unwrap();

        let buf = TestRequestBuilder::build_get_request(
            7,
            "public",
            &Oid::new(vec![1, 3, 6, 1, 2, 1, 99, 99, 0]),
        );
        let client = udp_client();
        client.send_to(&buf, addr).unwrap();

        let mut recv_buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = client.recv_from(&mut recv_buf).unwrap();
        let response = pdu::decode_message(&recv_buf[..len]).unwrap();
        assert_eq!(
            response.pdu.varbinds[0].value,
            Value::ErrorTag(crate::value::ErrorTag::NoSuchObject)
        );

        agent.stop();
    }

    #[test]
    fn malformed_datagram_gets_no_reply() {
        let mib = Arc::new(InMemoryMib::new());
        let mut agent = start_test_agent(mib);
        let addr = agent.local_addr().unwrap();

        let client = udp_client();
        client.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
        // declared community length (0xFF) exceeds the buffer
        client
            .send_to(&[0x30, 0x05, 0x02, 0x01, 0x00, 0x04, 0xFF], addr)
            .unwrap();

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let result = client.recv_from(&mut buf);
        assert!(result.is_err(), "malformed input must not produce a reply");

        agent.stop();
    }

    #[test]
    fn shutdown_joins_all_threads_and_frees_the_port() {
        let mib = Arc::new(InMemoryMib::new());
        let mut agent = start_test_agent(mib);
        let addr = agent.local_addr().unwrap();
        agent.stop();

        // A fresh listener can now bind the same address.
        let mib2: Arc<dyn MibStore> = Arc::new(InMemoryMib::new());
        let mut agent2 = Listener::new(mib2, AgentConfig::default());
        agent2.start(&addr.to_string()).unwrap();
        agent2.stop();
    }

    /// Minimal GET-request builder for tests that need an arbitrary OID,
    /// mirroring `pdu::build_response_message` but for the request side.
    struct TestRequestBuilder;

    impl TestRequestBuilder {
        fn build_get_request(request_id: i32, community: &str, oid: &Oid) -> Vec<u8> {
            use crate::asn1::encode;
            use bytes::BytesMut;

            let mut varbind = BytesMut::new();
            encode::encode_oid(oid, &mut varbind).unwrap();
            encode::encode_null(&mut varbind);
            let mut varbind_tagged = BytesMut::new();
            encode::encode_tagged(&varbind, crate::asn1::SEQUENCE_TAG, &mut varbind_tagged);

            let mut varbind_list = BytesMut::new();
            encode::encode_tagged(
                &varbind_tagged,
                crate::asn1::SEQUENCE_TAG,
                &mut varbind_list,
            );

            let mut pdu_body = BytesMut::new();
            encode::encode_integer(request_id as i64, &mut pdu_body);
            encode::encode_integer(0, &mut pdu_body);
            encode::encode_integer(0, &mut pdu_body);
            pdu_body.extend_from_slice(&varbind_list);

            let mut pdu_tagged = BytesMut::new();
            encode::encode_tagged(&pdu_body, crate::asn1::GET_REQUEST_TAG, &mut pdu_tagged);

            let mut msg_body = BytesMut::new();
            encode::encode_integer(0, &mut msg_body);
            encode::encode_octet_string(community.as_bytes(), &mut msg_body);
            msg_body.extend_from_slice(&pdu_tagged);

            let mut out = BytesMut::new();
            encode::encode_tagged(&msg_body, crate::asn1::SEQUENCE_TAG, &mut out);
            out.to_vec()
        }
    }
}
