//! The zone authority: query resolution, validated dynamic updates, and
//! signed zone transfer for one zone.

pub mod transfer;
pub mod update;
pub mod validate;

use crate::client;
use crate::dns::{DNSPacket, DNSResourceClass, DNSResourceType};
use crate::dnssec::SigningKey;
use crate::error::Result;
use crate::zone::{RecordSet, Zone, ZoneParser, constants};
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of resolving one query.
#[derive(Debug)]
pub enum Resolution {
    /// Answered from the local zone
    Records(RecordSet),
    /// The configured upstream's reply, relayed verbatim
    Upstream(DNSPacket),
    /// A full signed transfer response
    Transfer(DNSPacket),
    /// Dynamic update: the applied record set, or None when rolled back
    Update(Option<RecordSet>),
}

/// Authoritative server state for a single zone. Owns the zone and the
/// signing key for the lifetime of the process.
pub struct ZoneAuthority {
    origin: String,
    /// The committed zone. Lookups clone the Arc; transactions swap it.
    zone: RwLock<Arc<Zone>>,
    /// Serializes update transactions and inbound transfers.
    update_lock: Mutex<()>,
    key: SigningKey,
    zone_path: PathBuf,
    upstream: SocketAddr,
}

impl ZoneAuthority {
    /// Load the zone file and signing key, and publish the key's DNSKEY at
    /// the origin.
    pub fn load(zone_path: PathBuf, key_path: &std::path::Path, upstream: SocketAddr) -> Result<Self> {
        let key = SigningKey::load(key_path)?;
        let mut zone = ZoneParser::new().parse_file(&zone_path)?;
        install_dnskey(&mut zone, &key);

        info!(
            origin = %zone.origin,
            key_tag = key.key_tag(),
            zone_file = %zone_path.display(),
            "zone authority ready"
        );

        Ok(Self {
            origin: zone.origin.clone(),
            zone: RwLock::new(Arc::new(zone)),
            update_lock: Mutex::new(()),
            key,
            zone_path,
            upstream,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }

    /// Snapshot of the committed zone.
    pub fn zone(&self) -> Arc<Zone> {
        self.zone.read().clone()
    }

    /// Persist `zone` to the zone file, then make it the committed zone.
    /// Readers keep observing the previous zone until the swap.
    pub(crate) fn commit(&self, zone: Zone) -> Result<()> {
        zone.persist(&self.zone_path)?;
        *self.zone.write() = Arc::new(zone);
        Ok(())
    }

    /// Resolve one parsed query. Dispatch order: update section, transfer
    /// request, exact local lookup, upstream pass-through.
    pub async fn resolve(&self, query: &DNSPacket) -> Result<Resolution> {
        if query.is_update() {
            return Ok(Resolution::Update(update::apply_update(self, query)));
        }

        let question = query.first_question()?;
        if question.qtype.is_transfer() {
            let zone = self.zone();
            let response = transfer::build_transfer_response(query, &zone, &self.key)?;
            return Ok(Resolution::Transfer(response));
        }

        let local = self
            .zone()
            .lookup(&question.name, question.qtype)
            .cloned();
        match local {
            Some(rrset) => {
                debug!(name = %question.name, qtype = %question.qtype, "answered locally");
                Ok(Resolution::Records(rrset))
            }
            None => {
                // Not found locally means forward, even for in-zone names:
                // the authority doubles as a pass-through forwarder and never
                // synthesizes NXDOMAIN itself.
                info!(
                    name = %question.name,
                    qtype = %question.qtype,
                    upstream = %self.upstream,
                    "forwarding query upstream"
                );
                let reply = client::forward(self.upstream, &question.name, question.qtype).await?;
                Ok(Resolution::Upstream(reply))
            }
        }
    }

    /// Pull the zone from a primary and, if the transferred zone validates,
    /// replace the local one. On any failure the local zone is untouched.
    pub async fn pull_zone(&self, zone_name: &str, primary: SocketAddr) -> Result<()> {
        transfer::pull_zone(self, zone_name, primary).await
    }
}

impl std::fmt::Debug for ZoneAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneAuthority")
            .field("origin", &self.origin)
            .field("zone_path", &self.zone_path)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

/// Publish the authority's public key as a DNSKEY record set at the origin.
/// Additive: key material already present in the zone stays.
pub fn install_dnskey(zone: &mut Zone, key: &SigningKey) {
    let origin = zone.origin.clone();
    let ttl = zone
        .lookup(&origin, DNSResourceType::DNSKEY)
        .map(|rrset| rrset.ttl)
        .unwrap_or(constants::DEFAULT_TTL);
    zone.upsert(
        &origin,
        DNSResourceClass::IN,
        DNSResourceType::DNSKEY,
        None,
        ttl,
        [key.dnskey_rdata().to_vec()],
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::dnssec::keypair::generate_for_tests;
    use crate::dnssec::{signer, unix_now};
    use crate::zone::record::rdata_from_text;

    /// A zone with SOA, NS, and one A record, unsigned.
    pub fn unsigned_zone() -> Zone {
        let mut zone = Zone::new("example.com");
        zone.upsert(
            "example.com",
            DNSResourceClass::IN,
            DNSResourceType::SOA,
            None,
            3600,
            [rdata_from_text(
                DNSResourceType::SOA,
                "ns1.example.com. admin.example.com. 2024010101 3600 900 604800 86400",
            )
            .unwrap()],
        );
        zone.upsert(
            "example.com",
            DNSResourceClass::IN,
            DNSResourceType::NS,
            None,
            3600,
            [rdata_from_text(DNSResourceType::NS, "ns1.example.com.").unwrap()],
        );
        zone.upsert(
            "www.example.com",
            DNSResourceClass::IN,
            DNSResourceType::A,
            None,
            300,
            [vec![192, 0, 2, 1]],
        );
        zone
    }

    /// Sign every record set in `zone` with `key` and store the signatures
    /// alongside their data, the way an offline signer would produce the
    /// zone file.
    pub fn sign_zone_in_place(zone: &mut Zone, key: &SigningKey) {
        let now = unix_now();
        let pairs: Vec<(RecordSet, RecordSet)> = zone
            .iter_paired()
            .map(|(rrset, _)| {
                let sig = signer::sign(rrset, key, &zone.origin, now - 60, now + 86400)
                    .expect("signing test zone");
                (rrset.clone(), sig)
            })
            .collect();
        for (_, sig) in pairs {
            let name = sig.name.clone();
            zone.upsert(
                &name,
                sig.class,
                sig.rtype,
                sig.covers,
                sig.ttl,
                sig.values().map(<[u8]>::to_vec),
            );
        }
    }

    /// An offline-signed zone: DNSKEY of `file_key` installed, then every
    /// record set signed by `file_key`.
    pub fn signed_zone(file_key: &SigningKey) -> Zone {
        let mut zone = unsigned_zone();
        install_dnskey(&mut zone, file_key);
        sign_zone_in_place(&mut zone, file_key);
        zone
    }

    pub fn fresh_key() -> SigningKey {
        generate_for_tests()
    }
}
