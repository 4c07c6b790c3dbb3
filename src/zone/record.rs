//! Rdata conversion between master-file presentation text and wire form.
//!
//! The zone store keeps every value in wire form; these conversions are only
//! exercised at the zone-file boundary.

use super::{Result, ZoneError};
use crate::dns::DNSResourceType;
use crate::dns::name::{name_to_wire, parse_name};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;

/// Parse presentation rdata into wire form.
pub fn rdata_from_text(rtype: DNSResourceType, text: &str) -> Result<Vec<u8>> {
    match rtype {
        DNSResourceType::A => parse_a(text),
        DNSResourceType::AAAA => parse_aaaa(text),
        DNSResourceType::NS | DNSResourceType::CNAME | DNSResourceType::PTR => wire_name(text),
        DNSResourceType::MX => parse_mx(text),
        DNSResourceType::TXT => parse_txt(text),
        DNSResourceType::SOA => parse_soa(text),
        DNSResourceType::DNSKEY => parse_dnskey(text),
        DNSResourceType::RRSIG => parse_rrsig(text),
        other => Err(ZoneError::InvalidRecord(format!(
            "unsupported record type in zone file: {}",
            other
        ))),
    }
}

/// Render wire rdata in presentation form.
pub fn rdata_to_text(rtype: DNSResourceType, rdata: &[u8]) -> Result<String> {
    match rtype {
        DNSResourceType::A => {
            let octets: [u8; 4] = rdata
                .try_into()
                .map_err(|_| ZoneError::InvalidRecord("bad A rdata length".to_string()))?;
            Ok(std::net::Ipv4Addr::from(octets).to_string())
        }
        DNSResourceType::AAAA => {
            let octets: [u8; 16] = rdata
                .try_into()
                .map_err(|_| ZoneError::InvalidRecord("bad AAAA rdata length".to_string()))?;
            Ok(std::net::Ipv6Addr::from(octets).to_string())
        }
        DNSResourceType::NS | DNSResourceType::CNAME | DNSResourceType::PTR => {
            let (target, _) = rdata_name(rdata, 0)?;
            Ok(fqdn(&target))
        }
        DNSResourceType::MX => {
            if rdata.len() < 3 {
                return Err(ZoneError::InvalidRecord("short MX rdata".to_string()));
            }
            let priority = u16::from_be_bytes([rdata[0], rdata[1]]);
            let (exchange, _) = rdata_name(rdata, 2)?;
            Ok(format!("{} {}", priority, fqdn(&exchange)))
        }
        DNSResourceType::TXT => {
            let mut strings = Vec::new();
            let mut pos = 0;
            while pos < rdata.len() {
                let len = rdata[pos] as usize;
                let chunk = rdata
                    .get(pos + 1..pos + 1 + len)
                    .ok_or_else(|| ZoneError::InvalidRecord("short TXT rdata".to_string()))?;
                strings.push(format!("\"{}\"", String::from_utf8_lossy(chunk)));
                pos += 1 + len;
            }
            Ok(strings.join(" "))
        }
        DNSResourceType::SOA => {
            let (mname, pos) = rdata_name(rdata, 0)?;
            let (rname, pos) = rdata_name(rdata, pos)?;
            let tail = rdata
                .get(pos..pos + 20)
                .ok_or_else(|| ZoneError::InvalidRecord("short SOA rdata".to_string()))?;
            let fields: Vec<String> = tail
                .chunks(4)
                .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]).to_string())
                .collect();
            Ok(format!("{} {} {}", fqdn(&mname), fqdn(&rname), fields.join(" ")))
        }
        DNSResourceType::DNSKEY => {
            if rdata.len() < 4 {
                return Err(ZoneError::InvalidRecord("short DNSKEY rdata".to_string()));
            }
            let flags = u16::from_be_bytes([rdata[0], rdata[1]]);
            Ok(format!(
                "{} {} {} {}",
                flags,
                rdata[2],
                rdata[3],
                BASE64.encode(&rdata[4..])
            ))
        }
        DNSResourceType::RRSIG => {
            if rdata.len() < 18 {
                return Err(ZoneError::InvalidRecord("short RRSIG rdata".to_string()));
            }
            let covered = DNSResourceType::from_u16(u16::from_be_bytes([rdata[0], rdata[1]]));
            let original_ttl = u32::from_be_bytes([rdata[4], rdata[5], rdata[6], rdata[7]]);
            let expiration = u32::from_be_bytes([rdata[8], rdata[9], rdata[10], rdata[11]]);
            let inception = u32::from_be_bytes([rdata[12], rdata[13], rdata[14], rdata[15]]);
            let key_tag = u16::from_be_bytes([rdata[16], rdata[17]]);
            let (signer, pos) = rdata_name(rdata, 18)?;
            Ok(format!(
                "{} {} {} {} {} {} {} {} {}",
                covered,
                rdata[2],
                rdata[3],
                original_ttl,
                format_timestamp(expiration),
                format_timestamp(inception),
                key_tag,
                fqdn(&signer),
                BASE64.encode(&rdata[pos..])
            ))
        }
        other => Err(ZoneError::InvalidRecord(format!(
            "unsupported record type in zone file: {}",
            other
        ))),
    }
}

fn parse_a(text: &str) -> Result<Vec<u8>> {
    let addr: std::net::Ipv4Addr = text
        .trim()
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid IPv4 address: {}", text)))?;
    Ok(addr.octets().to_vec())
}

fn parse_aaaa(text: &str) -> Result<Vec<u8>> {
    let addr: std::net::Ipv6Addr = text
        .trim()
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid IPv6 address: {}", text)))?;
    Ok(addr.octets().to_vec())
}

fn parse_mx(text: &str) -> Result<Vec<u8>> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(ZoneError::InvalidRecord(format!(
            "MX record needs 2 fields, got {}",
            parts.len()
        )));
    }
    let priority: u16 = parts[0]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid MX priority: {}", parts[0])))?;

    let mut rdata = priority.to_be_bytes().to_vec();
    rdata.extend_from_slice(&wire_name(parts[1])?);
    Ok(rdata)
}

fn parse_txt(text: &str) -> Result<Vec<u8>> {
    let mut rdata = Vec::new();
    for chunk in split_strings(text) {
        for piece in chunk.as_bytes().chunks(255) {
            rdata.push(piece.len() as u8);
            rdata.extend_from_slice(piece);
        }
        if chunk.is_empty() {
            rdata.push(0);
        }
    }
    if rdata.is_empty() {
        return Err(ZoneError::InvalidRecord("empty TXT rdata".to_string()));
    }
    Ok(rdata)
}

/// Split TXT presentation into character-strings: quoted segments or bare
/// whitespace-separated tokens.
fn split_strings(text: &str) -> Vec<String> {
    let text = text.trim();
    if !text.contains('"') {
        return text.split_whitespace().map(str::to_string).collect();
    }

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in text.chars() {
        match ch {
            '"' => {
                if in_quotes {
                    strings.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            _ if in_quotes => current.push(ch),
            _ => {}
        }
    }
    strings
}

fn parse_soa(text: &str) -> Result<Vec<u8>> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 7 {
        return Err(ZoneError::InvalidRecord(format!(
            "SOA record needs 7 fields, got {}",
            parts.len()
        )));
    }

    let mut rdata = wire_name(parts[0])?;
    rdata.extend_from_slice(&wire_name(parts[1])?);
    for part in &parts[2..] {
        let value: u32 = part
            .parse()
            .map_err(|_| ZoneError::InvalidRecord(format!("invalid SOA field: {}", part)))?;
        rdata.extend_from_slice(&value.to_be_bytes());
    }
    Ok(rdata)
}

fn parse_dnskey(text: &str) -> Result<Vec<u8>> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ZoneError::InvalidRecord(format!(
            "DNSKEY record needs 4 fields, got {}",
            parts.len()
        )));
    }

    let flags: u16 = parts[0]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid DNSKEY flags: {}", parts[0])))?;
    let protocol: u8 = parts[1]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid DNSKEY protocol: {}", parts[1])))?;
    let algorithm: u8 = parts[2]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid DNSKEY algorithm: {}", parts[2])))?;
    let key = BASE64
        .decode(parts[3..].concat())
        .map_err(|e| ZoneError::InvalidRecord(format!("invalid DNSKEY key data: {}", e)))?;

    let mut rdata = flags.to_be_bytes().to_vec();
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(&key);
    Ok(rdata)
}

fn parse_rrsig(text: &str) -> Result<Vec<u8>> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 9 {
        return Err(ZoneError::InvalidRecord(format!(
            "RRSIG record needs 9 fields, got {}",
            parts.len()
        )));
    }

    let covered = DNSResourceType::from_mnemonic(parts[0])
        .ok_or_else(|| ZoneError::InvalidRecord(format!("invalid RRSIG type: {}", parts[0])))?;
    let algorithm: u8 = parts[1]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid RRSIG algorithm: {}", parts[1])))?;
    let labels: u8 = parts[2]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid RRSIG labels: {}", parts[2])))?;
    let original_ttl: u32 = parts[3]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid RRSIG TTL: {}", parts[3])))?;
    let expiration = parse_timestamp(parts[4])?;
    let inception = parse_timestamp(parts[5])?;
    let key_tag: u16 = parts[6]
        .parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid RRSIG key tag: {}", parts[6])))?;
    let signature = BASE64
        .decode(parts[8..].concat())
        .map_err(|e| ZoneError::InvalidRecord(format!("invalid RRSIG signature: {}", e)))?;

    let mut rdata = covered.to_u16().to_be_bytes().to_vec();
    rdata.push(algorithm);
    rdata.push(labels);
    rdata.extend_from_slice(&original_ttl.to_be_bytes());
    rdata.extend_from_slice(&expiration.to_be_bytes());
    rdata.extend_from_slice(&inception.to_be_bytes());
    rdata.extend_from_slice(&key_tag.to_be_bytes());
    rdata.extend_from_slice(&wire_name(parts[7])?);
    rdata.extend_from_slice(&signature);
    Ok(rdata)
}

/// RRSIG timestamps: YYYYMMDDHHMMSS presentation, or a bare epoch integer.
fn parse_timestamp(text: &str) -> Result<u32> {
    if text.len() == 14 && text.bytes().all(|b| b.is_ascii_digit()) {
        let dt = chrono::NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S")
            .map_err(|_| ZoneError::InvalidRecord(format!("invalid timestamp: {}", text)))?;
        return Ok(dt.and_utc().timestamp() as u32);
    }
    text.parse()
        .map_err(|_| ZoneError::InvalidRecord(format!("invalid timestamp: {}", text)))
}

fn format_timestamp(epoch: u32) -> String {
    match DateTime::from_timestamp(i64::from(epoch), 0) {
        Some(dt) => dt.format("%Y%m%d%H%M%S").to_string(),
        None => epoch.to_string(),
    }
}

fn wire_name(name: &str) -> Result<Vec<u8>> {
    name_to_wire(name).map_err(|e| ZoneError::InvalidRecord(e.to_string()))
}

fn rdata_name(rdata: &[u8], offset: usize) -> Result<(String, usize)> {
    parse_name(rdata, offset).map_err(|e| ZoneError::InvalidRecord(e.to_string()))
}

fn fqdn(name: &str) -> String {
    if name.is_empty() {
        ".".to_string()
    } else {
        format!("{}.", name)
    }
}
