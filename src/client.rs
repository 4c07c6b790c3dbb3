//! One-shot UDP query client.
//!
//! Used by the authority's forwarding path, the inbound zone-transfer pull,
//! and the gatekeeper relay. No retries and no failover: the caller gets the
//! upstream's answer or the upstream's failure, nothing synthesized.

use crate::dns::{DNSPacket, DNSQuestion, DNSResourceType};
use crate::error::{DnsError, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

/// Ceiling on a single reply datagram; zone transfers arrive in one piece.
const MAX_REPLY_SIZE: usize = 65535;

/// How long to wait for the upstream before reporting failure.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Send `packet` to `upstream` and wait for a single reply datagram.
pub async fn query(upstream: SocketAddr, packet: &DNSPacket) -> Result<DNSPacket> {
    let bytes = packet.to_bytes()?;
    exchange(upstream, &bytes).await.and_then(|reply| {
        let parsed = DNSPacket::parse(&reply)?;
        debug!(
            %upstream,
            id = parsed.header.id,
            answers = parsed.answers.len(),
            "upstream reply"
        );
        Ok(parsed)
    })
}

/// Forward a (name, type) question verbatim and return whatever the
/// upstream returns, failures included.
pub async fn forward(upstream: SocketAddr, name: &str, qtype: DNSResourceType) -> Result<DNSPacket> {
    let packet = DNSPacket::query(rand::random(), DNSQuestion::new(name, qtype));
    query(upstream, &packet).await
}

/// Send raw bytes and collect the raw reply; also used for the plaintext
/// replication control message.
pub async fn exchange(upstream: SocketAddr, payload: &[u8]) -> Result<Vec<u8>> {
    let bind_addr: SocketAddr = if upstream.is_ipv4() {
        "0.0.0.0:0".parse().expect("valid wildcard address")
    } else {
        "[::]:0".parse().expect("valid wildcard address")
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| DnsError::UpstreamFailure(upstream.to_string(), e.to_string()))?;
    socket
        .send_to(payload, upstream)
        .await
        .map_err(|e| DnsError::UpstreamFailure(upstream.to_string(), e.to_string()))?;

    let mut buf = vec![0u8; MAX_REPLY_SIZE];
    let (len, _) = timeout(UPSTREAM_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .map_err(|_| DnsError::UpstreamFailure(upstream.to_string(), "timed out".to_string()))?
        .map_err(|e| DnsError::UpstreamFailure(upstream.to_string(), e.to_string()))?;

    buf.truncate(len);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::DNSResource;
    use crate::dns::enums::DNSResourceClass;

    #[tokio::test]
    async fn test_query_roundtrip_against_local_responder() {
        // A stand-in upstream that answers every query with one A record.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = server.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            let (len, from) = server.recv_from(&mut buf).await.unwrap();
            let request = DNSPacket::parse(&buf[..len]).unwrap();
            let mut response = DNSPacket::response_to(&request);
            response.answers.push(DNSResource::new(
                request.questions[0].name.clone(),
                DNSResourceType::A,
                DNSResourceClass::IN,
                60,
                vec![192, 0, 2, 10],
            ));
            server
                .send_to(&response.to_bytes().unwrap(), from)
                .await
                .unwrap();
        });

        let reply = forward(upstream, "www.example.com", DNSResourceType::A)
            .await
            .unwrap();
        assert_eq!(reply.answers.len(), 1);
        assert_eq!(reply.answers[0].rdata, vec![192, 0, 2, 10]);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_times_out() {
        // Nothing listens here; expect an upstream failure, not a panic.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = silent.local_addr().unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            forward(upstream, "www.example.com", DNSResourceType::A),
        )
        .await
        .expect("timeout wrapper");
        assert!(matches!(result, Err(DnsError::UpstreamFailure(_, _))));
    }
}
