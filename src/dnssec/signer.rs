use super::errors::{DnsSecError, Result};
use super::keypair::SigningKey;
use crate::dns::DNSResourceType;
use crate::dns::name::name_to_wire;
use crate::zone::RecordSet;

/// Parsed RRSIG rdata (RFC 4034 §3.1).
#[derive(Debug, Clone)]
pub struct Rrsig {
    pub covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl Rrsig {
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        if rdata.len() < 18 {
            return Err(DnsSecError::InvalidSignature);
        }

        let covered = DNSResourceType::from_u16(u16::from_be_bytes([rdata[0], rdata[1]]));
        let algorithm = rdata[2];
        let labels = rdata[3];
        let original_ttl = u32::from_be_bytes([rdata[4], rdata[5], rdata[6], rdata[7]]);
        let expiration = u32::from_be_bytes([rdata[8], rdata[9], rdata[10], rdata[11]]);
        let inception = u32::from_be_bytes([rdata[12], rdata[13], rdata[14], rdata[15]]);
        let key_tag = u16::from_be_bytes([rdata[16], rdata[17]]);

        // Signer name is never compressed inside RRSIG rdata.
        let (signer_name, consumed) = crate::dns::name::parse_name(&rdata[18..], 0)
            .map_err(|_| DnsSecError::InvalidSignature)?;
        let signature = rdata[18 + consumed..].to_vec();
        if signature.is_empty() {
            return Err(DnsSecError::InvalidSignature);
        }

        Ok(Self {
            covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        })
    }

    pub fn to_rdata(&self) -> Result<Vec<u8>> {
        let mut rdata = self.rdata_prefix()?;
        rdata.extend_from_slice(&self.signature);
        Ok(rdata)
    }

    /// The rdata up to (and excluding) the signature field, i.e. the part that
    /// prefixes the canonical signed data.
    fn rdata_prefix(&self) -> Result<Vec<u8>> {
        let mut prefix = Vec::with_capacity(18 + self.signer_name.len() + 2);
        prefix.extend_from_slice(&self.covered.to_u16().to_be_bytes());
        prefix.push(self.algorithm);
        prefix.push(self.labels);
        prefix.extend_from_slice(&self.original_ttl.to_be_bytes());
        prefix.extend_from_slice(&self.expiration.to_be_bytes());
        prefix.extend_from_slice(&self.inception.to_be_bytes());
        prefix.extend_from_slice(&self.key_tag.to_be_bytes());
        prefix.extend_from_slice(
            &name_to_wire(&self.signer_name).map_err(|_| DnsSecError::InvalidSignature)?,
        );
        Ok(prefix)
    }

    /// RFC 4034 §3.1.8.1 canonical signed data: the rdata prefix followed by
    /// every record of the set in canonical form, values in canonical
    /// (bytewise) order.
    pub fn signed_data(&self, rrset: &RecordSet) -> Result<Vec<u8>> {
        let mut data = self.rdata_prefix()?;

        let owner = name_to_wire(&rrset.name).map_err(|_| DnsSecError::InvalidSignature)?;
        let mut values: Vec<&[u8]> = rrset.values().collect();
        values.sort();

        for value in values {
            data.extend_from_slice(&owner);
            data.extend_from_slice(&rrset.rtype.to_u16().to_be_bytes());
            data.extend_from_slice(&rrset.class.to_u16().to_be_bytes());
            data.extend_from_slice(&self.original_ttl.to_be_bytes());
            data.extend_from_slice(&(value.len() as u16).to_be_bytes());
            data.extend_from_slice(value);
        }

        Ok(data)
    }
}

/// Sign a record set, producing its covering RRSIG record set. Deterministic
/// for a given key, record set, and validity window (Ed25519 signatures
/// carry no nonce).
pub fn sign(
    rrset: &RecordSet,
    key: &SigningKey,
    signer_name: &str,
    inception: u32,
    expiration: u32,
) -> Result<RecordSet> {
    let mut rrsig = Rrsig {
        covered: rrset.rtype,
        algorithm: key.algorithm().to_u8(),
        labels: rrset.name.split('.').filter(|l| !l.is_empty()).count() as u8,
        original_ttl: rrset.ttl,
        expiration,
        inception,
        key_tag: key.key_tag(),
        signer_name: signer_name.trim_end_matches('.').to_lowercase(),
        signature: Vec::new(),
    };

    let message = rrsig.signed_data(rrset)?;
    rrsig.signature = key.sign_raw(&message);

    let mut sig_set = RecordSet::new(
        rrset.name.clone(),
        rrset.class,
        DNSResourceType::RRSIG,
        Some(rrset.rtype),
        rrset.ttl,
    );
    sig_set.insert(rrsig.to_rdata()?);
    Ok(sig_set)
}
