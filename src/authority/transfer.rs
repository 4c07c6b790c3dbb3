//! Zone transfer: serving signed AXFR/IXFR responses and pulling a zone
//! from a primary.

use super::{ZoneAuthority, install_dnskey, validate};
use crate::client;
use crate::dns::{DNSPacket, DNSQuestion, DNSResourceType};
use crate::dnssec::{SigningKey, constants, signer, unix_now};
use crate::error::{DnsError, Result};
use crate::zone::{Zone, ZoneError};
use std::net::SocketAddr;
use tracing::{info, warn};

/// Build the answer to an AXFR/IXFR query: every data record set signed
/// fresh at serve time, appended as (data, signature) adjacent pairs, with
/// the SOA record set repeated last as the terminal marker.
///
/// Signatures are never cached, so serving the same zone twice yields
/// byte-different but equally valid signature material.
pub fn build_transfer_response(
    query: &DNSPacket,
    zone: &Zone,
    key: &SigningKey,
) -> Result<DNSPacket> {
    let now = unix_now();
    let inception = now.saturating_sub(constants::INCEPTION_SKEW_SECS);
    let expiration = now.saturating_add(constants::SIGNATURE_VALIDITY_SECS);

    let mut response = DNSPacket::response_to(query);
    let mut soa_resources = None;

    for (rrset, _) in zone.iter_paired() {
        let sig_set = signer::sign(rrset, key, &zone.origin, inception, expiration)?;

        if rrset.rtype == DNSResourceType::SOA {
            soa_resources = Some(rrset.to_resources());
        }
        response.answers.extend(rrset.to_resources());
        response.answers.extend(sig_set.to_resources());
    }

    let terminal = soa_resources.ok_or(ZoneError::MissingSOA)?;
    response.answers.extend(terminal);

    info!(
        origin = %zone.origin,
        answers = response.answers.len(),
        "serving zone transfer"
    );
    Ok(response)
}

/// Pull `zone_name` from `primary`, validate the transferred zone, and swap
/// it in. On any failure the local zone stays untouched and the error
/// surfaces to the caller.
pub async fn pull_zone(
    authority: &ZoneAuthority,
    zone_name: &str,
    primary: SocketAddr,
) -> Result<()> {
    let request = DNSPacket::query(
        rand::random(),
        DNSQuestion::new(zone_name, DNSResourceType::IXFR),
    );
    let reply = client::query(primary, &request).await?;
    if reply.answers.is_empty() {
        return Err(DnsError::UpstreamFailure(
            primary.to_string(),
            "empty transfer response".to_string(),
        ));
    }

    let candidate = Zone::from_records(zone_name, &reply.answers);
    let mut validated = validate::validate_zone(&candidate).inspect_err(|e| {
        warn!(zone = zone_name, %primary, error = %e, "discarding transferred zone");
    })?;

    install_dnskey(&mut validated, authority.key());

    let _txn = authority.update_lock.lock();
    authority.commit(validated)?;
    info!(zone = zone_name, %primary, "zone transfer applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::testing::{fresh_key, signed_zone, unsigned_zone};
    use crate::dns::DNSQuestion;

    fn axfr_query(zone: &str) -> DNSPacket {
        DNSPacket::query(42, DNSQuestion::new(zone, DNSResourceType::AXFR))
    }

    #[test]
    fn test_transfer_pairs_and_terminal_soa() {
        let file_key = fresh_key();
        let server_key = fresh_key();
        let mut zone = signed_zone(&file_key);
        install_dnskey(&mut zone, &server_key);

        let response =
            build_transfer_response(&axfr_query("example.com"), &zone, &server_key).unwrap();

        // Adjacent (data, signature) pairs, then the terminal SOA.
        let answers = &response.answers;
        assert!(answers.len() >= 3);

        let terminal = answers.last().unwrap();
        assert_eq!(terminal.rtype, DNSResourceType::SOA);

        let paired = &answers[..answers.len() - 1];
        let mut index = 0;
        while index < paired.len() {
            let data = &paired[index];
            assert_ne!(data.rtype, DNSResourceType::RRSIG, "expected data record");
            // All records of the set share the type; the covering signature
            // set follows immediately.
            let mut next = index + 1;
            while next < paired.len()
                && paired[next].rtype == data.rtype
                && paired[next].name == data.name
            {
                next += 1;
            }
            assert!(next < paired.len(), "record set missing its signature");
            let sig = &paired[next];
            assert_eq!(sig.rtype, DNSResourceType::RRSIG);
            assert_eq!(sig.covered_type(), Some(data.rtype));
            assert_eq!(sig.name, data.name);
            index = next + 1;
        }
    }

    #[test]
    fn test_fresh_signatures_differ_per_serve() {
        let key = fresh_key();
        let mut zone = unsigned_zone();
        install_dnskey(&mut zone, &key);

        let first = build_transfer_response(&axfr_query("example.com"), &zone, &key).unwrap();
        let second = build_transfer_response(&axfr_query("example.com"), &zone, &key).unwrap();

        let data_of = |packet: &DNSPacket| {
            packet
                .answers
                .iter()
                .filter(|record| record.rtype != DNSResourceType::RRSIG)
                .cloned()
                .collect::<Vec<_>>()
        };
        // Record data identical; signatures may differ only in their
        // validity window, and both serves carry one per data set.
        assert_eq!(data_of(&first), data_of(&second));
        assert_eq!(first.answers.len(), second.answers.len());
    }

    #[test]
    fn test_transfer_without_soa_fails() {
        let key = fresh_key();
        let mut zone = Zone::new("example.com");
        install_dnskey(&mut zone, &key);

        assert!(build_transfer_response(&axfr_query("example.com"), &zone, &key).is_err());
    }

    #[test]
    fn test_round_trip_transfer_validates() {
        let file_key = fresh_key();
        let server_key = fresh_key();
        let mut primary_zone = signed_zone(&file_key);
        install_dnskey(&mut primary_zone, &server_key);

        let response =
            build_transfer_response(&axfr_query("example.com"), &primary_zone, &server_key)
                .unwrap();

        let candidate = Zone::from_records("example.com", &response.answers);
        let validated = validate::validate_zone(&candidate).unwrap();

        // All non-signature data survives unchanged; DNSKEY is excluded.
        let www = validated.lookup("www.example.com", DNSResourceType::A).unwrap();
        assert!(www.contains(&[192, 0, 2, 1]));
        assert_eq!(
            validated.soa().unwrap(),
            primary_zone.soa().unwrap()
        );
        assert!(validated.dnskey_rrsets().is_empty());
    }
}
