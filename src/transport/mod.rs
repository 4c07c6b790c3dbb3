//! Wire-transport front ends: thin byte-in/byte-out adapters that parse a
//! DNS message, hand it to the authority, and serialize the reply.

pub mod doh;
pub mod dot;
pub mod tls;
pub mod udp;

use crate::authority::{Resolution, ZoneAuthority};
use crate::dns::{DNSPacket, ResponseCode};
use crate::error::Result;
use std::net::SocketAddr;

/// Parse one DNS message, resolve it, and serialize the reply.
pub async fn process_message(authority: &ZoneAuthority, data: &[u8]) -> Result<Vec<u8>> {
    let query = DNSPacket::parse(data)?;
    let resolution = authority.resolve(&query).await?;
    let response = resolution_response(&query, resolution)?;
    response.to_bytes()
}

/// Build the wire reply for a resolution outcome.
fn resolution_response(query: &DNSPacket, resolution: Resolution) -> Result<DNSPacket> {
    let mut response = DNSPacket::response_to(query);
    match resolution {
        Resolution::Records(rrset) => {
            response.answers.extend(rrset.to_resources());
        }
        Resolution::Upstream(reply) => {
            // Symmetric pass-through: the upstream's outcome, including its
            // failure rcode, reaches the client unmasked.
            response.header.rcode = reply.header.rcode;
            response.header.aa = false;
            response.answers.extend(reply.answers);
        }
        Resolution::Transfer(transfer) => {
            response = transfer;
        }
        Resolution::Update(Some(applied)) => {
            response.answers.extend(applied.to_resources());
        }
        Resolution::Update(None) => {
            response.set_rcode(ResponseCode::NxRRset);
        }
    }
    Ok(response)
}

/// Recognize the plaintext replication control message:
/// `ZONE_TRANSFER <zone-name> <primary-host> <primary-port>`.
pub fn parse_control_message(data: &[u8]) -> Option<(String, SocketAddr)> {
    let text = std::str::from_utf8(data).ok()?;
    let mut parts = text.split_whitespace();
    if parts.next()? != "ZONE_TRANSFER" {
        return None;
    }
    let zone = parts.next()?.to_string();
    let host = parts.next()?;
    let port: u16 = parts.next()?.parse().ok()?;
    let primary = format!("{}:{}", host, port).parse().ok()?;
    Some((zone, primary))
}
