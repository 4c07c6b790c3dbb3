use super::algorithm::DnsSecAlgorithm;
use super::errors::{DnsSecError, Result};
use super::key_tag::calculate_key_tag;
use super::signer::Rrsig;
use crate::zone::RecordSet;
use ring::signature::UnparsedPublicKey;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Parsed DNSKEY rdata (RFC 4034 §2.1).
#[derive(Debug, Clone)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
    pub key_tag: u16,
}

impl Dnskey {
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        if rdata.len() < 5 {
            return Err(DnsSecError::InvalidPublicKey);
        }

        let flags = u16::from_be_bytes([rdata[0], rdata[1]]);
        let protocol = rdata[2];
        let algorithm = rdata[3];
        let public_key = rdata[4..].to_vec();
        let key_tag = calculate_key_tag(flags, protocol, algorithm, &public_key);

        Ok(Self {
            flags,
            protocol,
            algorithm,
            public_key,
            key_tag,
        })
    }
}

/// Verify a record set against its covering signature set using the keys in
/// `trust_anchor`. Succeeds if any (signature, key) pair with matching
/// algorithm and key tag verifies.
///
/// Fails closed: malformed signatures, malformed keys, unknown algorithms,
/// and windows that exclude `now` are all verification failures.
pub fn verify_rrset(
    rrset: &RecordSet,
    sig_set: &RecordSet,
    trust_anchor: &RecordSet,
    now: u32,
) -> Result<()> {
    let mut last_error = DnsSecError::SignatureInvalid;

    for sig_rdata in sig_set.values() {
        let rrsig = match Rrsig::parse(sig_rdata) {
            Ok(rrsig) => rrsig,
            Err(e) => {
                last_error = e;
                continue;
            }
        };

        if rrsig.covered != rrset.rtype {
            last_error = DnsSecError::InvalidSignature;
            continue;
        }
        if now < rrsig.inception {
            last_error = DnsSecError::SignatureNotYetValid;
            continue;
        }
        if now > rrsig.expiration {
            last_error = DnsSecError::SignatureExpired;
            continue;
        }

        let algorithm = match DnsSecAlgorithm::from_u8(rrsig.algorithm) {
            Some(algorithm) => algorithm,
            None => {
                last_error = DnsSecError::UnsupportedAlgorithm(rrsig.algorithm);
                continue;
            }
        };

        let message = match rrsig.signed_data(rrset) {
            Ok(message) => message,
            Err(e) => {
                last_error = e;
                continue;
            }
        };

        for key_rdata in trust_anchor.values() {
            let dnskey = match Dnskey::parse(key_rdata) {
                Ok(dnskey) => dnskey,
                Err(e) => {
                    last_error = e;
                    continue;
                }
            };

            if dnskey.algorithm != rrsig.algorithm || dnskey.key_tag != rrsig.key_tag {
                continue;
            }

            let public_key = UnparsedPublicKey::new(algorithm.verification(), &dnskey.public_key);
            match public_key.verify(&message, &rrsig.signature) {
                Ok(()) => {
                    trace!(
                        name = %rrset.name,
                        rtype = %rrset.rtype,
                        key_tag = dnskey.key_tag,
                        "signature verified"
                    );
                    return Ok(());
                }
                Err(_) => last_error = DnsSecError::SignatureInvalid,
            }
        }
    }

    Err(last_error)
}

pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DNSResourceClass, DNSResourceType};
    use crate::dnssec::keypair::{SigningKey, generate_for_tests};
    use crate::dnssec::signer::sign;

    fn anchor_for(key: &SigningKey) -> RecordSet {
        let mut anchor = RecordSet::new(
            "example.com",
            DNSResourceClass::IN,
            DNSResourceType::DNSKEY,
            None,
            3600,
        );
        anchor.insert(key.dnskey_rdata().to_vec());
        anchor
    }

    fn a_rrset() -> RecordSet {
        let mut rrset = RecordSet::new(
            "www.example.com",
            DNSResourceClass::IN,
            DNSResourceType::A,
            None,
            300,
        );
        rrset.insert(vec![192, 0, 2, 1]);
        rrset
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = generate_for_tests();
        let rrset = a_rrset();
        let sig_set = sign(&rrset, &key, "example.com", 100, 200).unwrap();

        assert_eq!(
            verify_rrset(&rrset, &sig_set, &anchor_for(&key), 150),
            Ok(())
        );
    }

    #[test]
    fn test_tampered_data_fails() {
        let key = generate_for_tests();
        let rrset = a_rrset();
        let sig_set = sign(&rrset, &key, "example.com", 100, 200).unwrap();

        let mut tampered = rrset.clone();
        tampered.insert(vec![192, 0, 2, 99]);

        assert_eq!(
            verify_rrset(&tampered, &sig_set, &anchor_for(&key), 150),
            Err(DnsSecError::SignatureInvalid)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let signing = generate_for_tests();
        let other = generate_for_tests();
        let rrset = a_rrset();
        let sig_set = sign(&rrset, &signing, "example.com", 100, 200).unwrap();

        // No key in the anchor matches the signature's key tag.
        assert!(verify_rrset(&rrset, &sig_set, &anchor_for(&other), 150).is_err());
    }

    #[test]
    fn test_second_anchor_key_verifies() {
        let signing = generate_for_tests();
        let other = generate_for_tests();
        let rrset = a_rrset();
        let sig_set = sign(&rrset, &signing, "example.com", 100, 200).unwrap();

        let mut anchor = anchor_for(&other);
        anchor.insert(signing.dnskey_rdata().to_vec());

        assert_eq!(verify_rrset(&rrset, &sig_set, &anchor, 150), Ok(()));
    }

    #[test]
    fn test_validity_window_enforced() {
        let key = generate_for_tests();
        let rrset = a_rrset();
        let sig_set = sign(&rrset, &key, "example.com", 100, 200).unwrap();
        let anchor = anchor_for(&key);

        assert_eq!(
            verify_rrset(&rrset, &sig_set, &anchor, 50),
            Err(DnsSecError::SignatureNotYetValid)
        );
        assert_eq!(
            verify_rrset(&rrset, &sig_set, &anchor, 300),
            Err(DnsSecError::SignatureExpired)
        );
    }

    #[test]
    fn test_garbage_fails_closed() {
        let key = generate_for_tests();
        let rrset = a_rrset();
        let anchor = anchor_for(&key);

        let mut garbage_sig = RecordSet::new(
            "www.example.com",
            DNSResourceClass::IN,
            DNSResourceType::RRSIG,
            Some(DNSResourceType::A),
            300,
        );
        garbage_sig.insert(vec![0xFF; 7]);

        assert!(verify_rrset(&rrset, &garbage_sig, &anchor, 150).is_err());

        // Truncated signature bytes after a valid prefix.
        let real = sign(&rrset, &key, "example.com", 100, 200).unwrap();
        let mut truncated_rdata = real.values().next().unwrap().to_vec();
        truncated_rdata.truncate(truncated_rdata.len() - 10);
        let mut truncated = RecordSet::new(
            "www.example.com",
            DNSResourceClass::IN,
            DNSResourceType::RRSIG,
            Some(DNSResourceType::A),
            300,
        );
        truncated.insert(truncated_rdata);

        assert!(verify_rrset(&rrset, &truncated, &anchor, 150).is_err());
    }
}
