use std::fmt;

/// DNSSEC algorithm numbers (RFC 4034, 5702, 6605, 8080)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
}

impl DnsSecAlgorithm {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// The ring verification algorithm for signatures of this kind.
    pub fn verification(
        &self,
    ) -> &'static dyn ring::signature::VerificationAlgorithm {
        match self {
            Self::RsaSha256 => &ring::signature::RSA_PKCS1_2048_8192_SHA256,
            Self::RsaSha512 => &ring::signature::RSA_PKCS1_2048_8192_SHA512,
            Self::EcdsaP256Sha256 => &ring::signature::ECDSA_P256_SHA256_FIXED,
            Self::EcdsaP384Sha384 => &ring::signature::ECDSA_P384_SHA384_FIXED,
            Self::Ed25519 => &ring::signature::ED25519,
        }
    }
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsaSha256 => write!(f, "RSASHA256"),
            Self::RsaSha512 => write!(f, "RSASHA512"),
            Self::EcdsaP256Sha256 => write!(f, "ECDSAP256SHA256"),
            Self::EcdsaP384Sha384 => write!(f, "ECDSAP384SHA384"),
            Self::Ed25519 => write!(f, "ED25519"),
        }
    }
}
