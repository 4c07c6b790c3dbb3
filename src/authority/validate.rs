//! Whole-zone validation: the gate every candidate zone passes before it can
//! become the committed state.

use crate::dns::DNSResourceType;
use crate::dnssec::errors::{DnsSecError, Result};
use crate::dnssec::{unix_now, verify_rrset};
use crate::zone::Zone;
use tracing::{debug, warn};

/// Validate every (data, signature) pair in `candidate` against its own
/// trust anchor and build a fresh zone from the records that checked out.
///
/// The candidate must hold exactly one non-empty DNSKEY record set, which
/// serves as the trust anchor. Each data record set must carry a covering
/// signature set stored alongside it, and every signature set must cover
/// data that is actually present. Any failure aborts the whole pass; no
/// partial zone is ever produced. The output zone contains everything that
/// verified except the DNSKEY set itself, TTLs preserved.
pub fn validate_zone(candidate: &Zone) -> Result<Zone> {
    validate_zone_at(candidate, unix_now())
}

pub fn validate_zone_at(candidate: &Zone, now: u32) -> Result<Zone> {
    let anchors = candidate.dnskey_rrsets();
    let anchor = match anchors.as_slice() {
        [] => return Err(DnsSecError::MissingTrustAnchor),
        [only] => *only,
        _ => return Err(DnsSecError::AmbiguousTrustAnchor),
    };

    let mut validated = Zone::new(&candidate.origin);

    for (name, node) in candidate.iter_nodes() {
        for rrset in node.data_rrsets() {
            let sig_set = node
                .signature_for(rrset.class, rrset.rtype)
                .ok_or_else(|| DnsSecError::NoRrsig(name.to_string()))?;

            verify_rrset(rrset, sig_set, anchor, now).inspect_err(|e| {
                warn!(name, rtype = %rrset.rtype, error = %e, "zone validation failed");
            })?;

            if rrset.rtype != DNSResourceType::DNSKEY {
                validated.upsert(
                    name,
                    rrset.class,
                    rrset.rtype,
                    rrset.covers,
                    rrset.ttl,
                    rrset.values().map(<[u8]>::to_vec),
                );
            }
        }

        // A signature with nothing to cover means the pairing is broken.
        for sig_set in node
            .rrsets()
            .filter(|rrset| rrset.rtype == DNSResourceType::RRSIG)
        {
            let covered = sig_set.covers.ok_or(DnsSecError::InvalidSignature)?;
            let has_data = node
                .get(&(sig_set.class, covered, None))
                .is_some_and(|rrset| !rrset.is_empty());
            if !has_data {
                return Err(DnsSecError::UnmatchedRrsig(name.to_string()));
            }
        }
    }

    debug!(origin = %candidate.origin, "zone validated");
    Ok(validated)
}
