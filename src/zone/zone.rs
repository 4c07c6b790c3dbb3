use super::rrset::{RRsetKey, RecordSet};
use super::{Result, ZoneError};
use crate::dns::{DNSResource, DNSResourceClass, DNSResourceType};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// All record sets owned by one name, in insertion order.
///
/// Signature sets are keyed by the type they cover, directly alongside the
/// data set they sign. That stored association, not map iteration order, is
/// what lets the validation pass walk (data, signature) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    order: Vec<RRsetKey>,
    rrsets: HashMap<RRsetKey, RecordSet>,
}

impl Node {
    pub fn get(&self, key: &RRsetKey) -> Option<&RecordSet> {
        self.rrsets.get(key)
    }

    pub fn get_mut(&mut self, key: &RRsetKey) -> Option<&mut RecordSet> {
        self.rrsets.get_mut(key)
    }

    /// Fetch or create the record set for `key`.
    pub fn entry(
        &mut self,
        name: &str,
        key: RRsetKey,
        ttl: u32,
    ) -> &mut RecordSet {
        if !self.rrsets.contains_key(&key) {
            let (class, rtype, covers) = key;
            self.order.push(key);
            self.rrsets
                .insert(key, RecordSet::new(name, class, rtype, covers, ttl));
        }
        self.rrsets.get_mut(&key).expect("entry just ensured")
    }

    pub fn remove(&mut self, key: &RRsetKey) -> Option<RecordSet> {
        self.order.retain(|k| k != key);
        self.rrsets.remove(key)
    }

    /// All non-empty record sets in insertion order.
    pub fn rrsets(&self) -> impl Iterator<Item = &RecordSet> {
        self.order
            .iter()
            .filter_map(|key| self.rrsets.get(key))
            .filter(|rrset| !rrset.is_empty())
    }

    /// Non-empty data (non-signature) record sets in insertion order.
    pub fn data_rrsets(&self) -> impl Iterator<Item = &RecordSet> {
        self.rrsets()
            .filter(|rrset| rrset.rtype != DNSResourceType::RRSIG)
    }

    /// The signature set covering `rtype`, if present.
    pub fn signature_for(&self, class: DNSResourceClass, rtype: DNSResourceType) -> Option<&RecordSet> {
        self.rrsets
            .get(&(class, DNSResourceType::RRSIG, Some(rtype)))
            .filter(|rrset| !rrset.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.rrsets.values().all(RecordSet::is_empty)
    }
}

/// The in-memory authoritative database for one zone.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Zone apex, lowercase, no trailing dot
    pub origin: String,
    names: Vec<String>,
    nodes: HashMap<String, Node>,
}

impl Zone {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: normalize(&origin.into()),
            names: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    /// Reconstruct a candidate zone from transferred records. The terminal
    /// SOA repetition of an AXFR stream merges into the existing SOA set, so
    /// no special-casing is needed.
    pub fn from_records(origin: &str, records: &[DNSResource]) -> Self {
        let mut zone = Zone::new(origin);
        for record in records {
            zone.upsert_resource(record);
        }
        zone
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(&normalize(name))
    }

    fn node_mut_or_create(&mut self, name: &str) -> &mut Node {
        let name = normalize(name);
        if !self.nodes.contains_key(&name) {
            self.names.push(name.clone());
            self.nodes.insert(name.clone(), Node::default());
        }
        self.nodes.get_mut(&name).expect("node just ensured")
    }

    /// Union `values` into the record set at (name, class, type, covers),
    /// creating node and set as needed. Existing data of the same type is
    /// never removed.
    pub fn upsert<I>(
        &mut self,
        name: &str,
        class: DNSResourceClass,
        rtype: DNSResourceType,
        covers: Option<DNSResourceType>,
        ttl: u32,
        values: I,
    ) -> &RecordSet
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let name = normalize(name);
        let node = self.node_mut_or_create(&name);
        let rrset = node.entry(&name, (class, rtype, covers), ttl);
        for value in values {
            rrset.insert(value);
        }
        &*rrset
    }

    pub fn upsert_resource(&mut self, record: &DNSResource) -> &RecordSet {
        self.upsert(
            &record.name,
            record.rclass,
            record.rtype,
            record.covered_type(),
            record.ttl,
            [record.rdata.clone()],
        )
    }

    /// Exact-match lookup of a data record set.
    pub fn lookup(&self, name: &str, rtype: DNSResourceType) -> Option<&RecordSet> {
        self.node(name)?
            .get(&(DNSResourceClass::IN, rtype, None))
            .filter(|rrset| !rrset.is_empty())
    }

    pub fn remove_rrset(&mut self, name: &str, key: &RRsetKey) -> Option<RecordSet> {
        self.nodes.get_mut(&normalize(name))?.remove(key)
    }

    /// Remove one value from a record set, leaving the (possibly empty) set
    /// in place. Returns whether the value was present.
    pub fn strip_value(&mut self, name: &str, key: &RRsetKey, value: &[u8]) -> bool {
        self.nodes
            .get_mut(&normalize(name))
            .and_then(|node| node.get_mut(key))
            .is_some_and(|rrset| rrset.remove(value))
    }

    /// Nodes in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.names
            .iter()
            .filter_map(|name| self.nodes.get(name).map(|node| (name.as_str(), node)))
            .filter(|(_, node)| !node.is_empty())
    }

    /// Stable full enumeration: every data record set, each immediately
    /// followed by its covering signature set when one is stored.
    pub fn iter_paired(&self) -> impl Iterator<Item = (&RecordSet, Option<&RecordSet>)> {
        self.iter_nodes().flat_map(|(_, node)| {
            node.data_rrsets()
                .map(move |rrset| (rrset, node.signature_for(rrset.class, rrset.rtype)))
        })
    }

    /// All non-empty DNSKEY record sets anywhere in the zone.
    pub fn dnskey_rrsets(&self) -> Vec<&RecordSet> {
        self.iter_nodes()
            .flat_map(|(_, node)| node.rrsets())
            .filter(|rrset| rrset.rtype == DNSResourceType::DNSKEY)
            .collect()
    }

    /// The SOA record set at the origin.
    pub fn soa(&self) -> Option<&RecordSet> {
        self.lookup(&self.origin, DNSResourceType::SOA)
    }

    pub fn is_in_zone(&self, name: &str) -> bool {
        let name = normalize(name);
        name == self.origin || name.ends_with(&format!(".{}", self.origin))
    }

    /// Origin-linkage invariants: exactly one SOA record set, located at the
    /// origin, at least one NS at the origin, and every name under the
    /// origin.
    pub fn check_origin(&self) -> Result<()> {
        let mut soa_count = 0;
        for (name, node) in self.iter_nodes() {
            if !self.is_in_zone(name) {
                return Err(ZoneError::NameOutOfZone(name.to_string()));
            }
            for rrset in node.rrsets() {
                if rrset.rtype == DNSResourceType::SOA {
                    if name != self.origin {
                        return Err(ZoneError::MissingSOA);
                    }
                    soa_count += 1;
                }
            }
        }
        match soa_count {
            0 => return Err(ZoneError::MissingSOA),
            1 => {}
            _ => return Err(ZoneError::DuplicateSOA),
        }

        if self.lookup(&self.origin, DNSResourceType::NS).is_none() {
            return Err(ZoneError::MissingNS);
        }
        Ok(())
    }

    /// Render as master-file text, fully qualified names throughout.
    pub fn to_zone_file(&self) -> Result<String> {
        let mut out = format!("$ORIGIN {}.\n", self.origin);
        for (_, node) in self.iter_nodes() {
            for rrset in node.rrsets() {
                for line in rrset.to_file_lines()? {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    /// Full-file rewrite through a temporary file and an atomic rename, so
    /// no reader ever observes a half-written zone.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let text = self.to_zone_file()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| ZoneError::IoError(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| ZoneError::IoError(e.to_string()))?;
        debug!(path = %path.display(), "zone persisted");
        Ok(())
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        if self.origin != other.origin {
            return false;
        }
        let ours: Vec<(&str, &Node)> = self.iter_nodes().collect();
        let theirs: Vec<(&str, &Node)> = other.iter_nodes().collect();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.iter().all(|(name, node)| {
            other.node(name).is_some_and(|other_node| {
                let a: Vec<&RecordSet> = node.rrsets().collect();
                let b: Vec<&RecordSet> = other_node.rrsets().collect();
                a.len() == b.len()
                    && a.iter()
                        .all(|rrset| other_node.get(&rrset.key()) == Some(rrset))
            })
        })
    }
}

impl Eq for Zone {}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}
