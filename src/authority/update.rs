//! The dynamic-update transaction: checkpoint, mutate, validate, then commit
//! or roll back. A failed update is invisible; concurrent lookups observe
//! the pre-transaction zone throughout.

use super::{ZoneAuthority, install_dnskey, validate};
use crate::dns::{DNSPacket, DNSResource, DNSResourceClass, DNSResourceType};
use crate::error::DnsError;
use crate::zone::RecordSet;
use tracing::{info, warn};

/// Apply the update section of `query` to the authority's zone.
///
/// Returns the applied record set as acknowledgment, or `None` when the
/// transaction rolled back. The committed zone changes only on a full
/// commit; every failure path leaves it untouched.
pub fn apply_update(authority: &ZoneAuthority, query: &DNSPacket) -> Option<RecordSet> {
    let _txn = authority.update_lock.lock();

    let target = query.authorities.first()?;
    let update_set = collect_update_rrset(&query.authorities, target);

    // Checkpoint: the committed zone stays as-is; the transaction works on
    // its own copy and rollback is simply dropping it.
    let committed = authority.zone();
    let mut candidate = (*committed).clone();

    if !candidate.is_in_zone(&target.name) {
        let error = DnsError::MalformedUpdateTarget(target.name.clone());
        warn!(origin = %candidate.origin, %error, "rejecting update");
        return None;
    }

    // Mutate: union the update's values into the target record set.
    candidate.upsert(
        &update_set.name,
        update_set.class,
        update_set.rtype,
        update_set.covers,
        update_set.ttl,
        update_set.values().map(<[u8]>::to_vec),
    );

    // Re-derive origin invariants before spending any crypto work.
    if let Err(e) = candidate.check_origin() {
        warn!(error = %e, "rolling back update: origin check failed");
        return None;
    }

    // Strip the trust anchor we injected ourselves: re-validation must
    // succeed against key material the zone actually carries.
    let origin = candidate.origin.clone();
    candidate.strip_value(
        &origin,
        &(DNSResourceClass::IN, DNSResourceType::DNSKEY, None),
        authority.key().dnskey_rdata(),
    );

    match validate::validate_zone(&candidate) {
        Ok(mut validated) => {
            install_dnskey(&mut validated, authority.key());
            match authority.commit(validated) {
                Ok(()) => {
                    info!(
                        target = %update_set.name,
                        rtype = %update_set.rtype,
                        "update committed"
                    );
                    Some(update_set)
                }
                Err(e) => {
                    warn!(error = %e, "rolling back update: commit failed");
                    None
                }
            }
        }
        Err(e) => {
            info!(error = %e, "rolling back update: validation failed");
            None
        }
    }
}

/// Group the update records sharing the first record's owner, class, type,
/// and covered type into one record set, mirroring how the update section
/// is interpreted record-set-at-a-time.
fn collect_update_rrset(records: &[DNSResource], target: &DNSResource) -> RecordSet {
    let mut rrset = RecordSet::new(
        target.name.clone(),
        target.rclass,
        target.rtype,
        target.covered_type(),
        target.ttl,
    );
    for record in records {
        if record.name == target.name
            && record.rclass == target.rclass
            && record.rtype == target.rtype
            && record.covered_type() == target.covered_type()
        {
            rrset.insert(record.rdata.clone());
        }
    }
    rrset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DNSQuestion, opcode};

    #[test]
    fn test_collect_update_rrset_groups_matching_records() {
        let mut query = DNSPacket::query(
            1,
            DNSQuestion::new("example.com", DNSResourceType::SOA),
        );
        query.header.opcode = opcode::UPDATE;
        query.authorities.push(DNSResource::new(
            "www.example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            300,
            vec![192, 0, 2, 1],
        ));
        query.authorities.push(DNSResource::new(
            "www.example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            300,
            vec![192, 0, 2, 2],
        ));
        query.authorities.push(DNSResource::new(
            "other.example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            300,
            vec![192, 0, 2, 3],
        ));

        let rrset = collect_update_rrset(&query.authorities, &query.authorities[0]);
        assert_eq!(rrset.len(), 2);
        assert_eq!(rrset.name, "www.example.com");
        assert!(!rrset.contains(&[192, 0, 2, 3]));
    }
}
