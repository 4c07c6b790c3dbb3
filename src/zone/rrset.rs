use super::{Result, record};
use crate::dns::{DNSResource, DNSResourceClass, DNSResourceType};

/// Key of a record set within a node: class, type, and (for signature sets)
/// the covered type.
pub type RRsetKey = (DNSResourceClass, DNSResourceType, Option<DNSResourceType>);

/// All records sharing one owner name, class, and type.
///
/// Values are wire-format rdata held as a set: inserting a value that is
/// already present (byte-for-byte) is a no-op, and enumeration order is
/// irrelevant for equality.
#[derive(Debug, Clone)]
pub struct RecordSet {
    /// Owner name, lowercase, no trailing dot
    pub name: String,
    pub class: DNSResourceClass,
    pub rtype: DNSResourceType,
    /// For RRSIG sets, the type the signatures cover
    pub covers: Option<DNSResourceType>,
    pub ttl: u32,
    values: Vec<Vec<u8>>,
}

impl RecordSet {
    pub fn new(
        name: impl Into<String>,
        class: DNSResourceClass,
        rtype: DNSResourceType,
        covers: Option<DNSResourceType>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into().trim_end_matches('.').to_lowercase(),
            class,
            rtype,
            covers,
            ttl,
            values: Vec::new(),
        }
    }

    pub fn key(&self) -> RRsetKey {
        (self.class, self.rtype, self.covers)
    }

    /// Add a value; duplicates are not stored twice. Returns whether the set
    /// changed.
    pub fn insert(&mut self, value: Vec<u8>) -> bool {
        if self.values.iter().any(|v| *v == value) {
            return false;
        }
        self.values.push(value);
        true
    }

    /// Remove a value by byte equality. Returns whether it was present.
    pub fn remove(&mut self, value: &[u8]) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v != value);
        self.values.len() != before
    }

    pub fn contains(&self, value: &[u8]) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> impl Iterator<Item = &[u8]> {
        self.values.iter().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Expand into wire resource records, one per value.
    pub fn to_resources(&self) -> Vec<DNSResource> {
        self.values
            .iter()
            .map(|value| {
                DNSResource::new(
                    self.name.clone(),
                    self.rtype,
                    self.class,
                    self.ttl,
                    value.clone(),
                )
            })
            .collect()
    }

    /// Render as zone-file lines, one per value, fully qualified.
    pub fn to_file_lines(&self) -> Result<Vec<String>> {
        self.values
            .iter()
            .map(|value| {
                let rdata = record::rdata_to_text(self.rtype, value)?;
                Ok(format!(
                    "{}. {} {} {} {}",
                    self.name, self.ttl, self.class, self.rtype, rdata
                ))
            })
            .collect()
    }
}

impl PartialEq for RecordSet {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name
            || self.class != other.class
            || self.rtype != other.rtype
            || self.covers != other.covers
            || self.ttl != other.ttl
            || self.values.len() != other.values.len()
        {
            return false;
        }
        let mut ours: Vec<&Vec<u8>> = self.values.iter().collect();
        let mut theirs: Vec<&Vec<u8>> = other.values.iter().collect();
        ours.sort();
        theirs.sort();
        ours == theirs
    }
}

impl Eq for RecordSet {}
