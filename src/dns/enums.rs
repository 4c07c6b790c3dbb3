use std::fmt;

/// DNS resource record types understood by the server.
///
/// Only the types that can appear in our zones (plus the transfer
/// pseudo-types) get first-class variants; everything else is carried
/// through as `Unknown` so forwarded answers survive round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DNSResourceType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    DNSKEY,
    RRSIG,
    IXFR,
    AXFR,
    ANY,
    Unknown(u16),
}

impl DNSResourceType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::NS,
            5 => Self::CNAME,
            6 => Self::SOA,
            12 => Self::PTR,
            15 => Self::MX,
            16 => Self::TXT,
            28 => Self::AAAA,
            46 => Self::RRSIG,
            48 => Self::DNSKEY,
            251 => Self::IXFR,
            252 => Self::AXFR,
            255 => Self::ANY,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::NS => 2,
            Self::CNAME => 5,
            Self::SOA => 6,
            Self::PTR => 12,
            Self::MX => 15,
            Self::TXT => 16,
            Self::AAAA => 28,
            Self::RRSIG => 46,
            Self::DNSKEY => 48,
            Self::IXFR => 251,
            Self::AXFR => 252,
            Self::ANY => 255,
            Self::Unknown(other) => other,
        }
    }

    /// Parse a presentation-format mnemonic ("A", "RRSIG", ...).
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "NS" => Some(Self::NS),
            "CNAME" => Some(Self::CNAME),
            "SOA" => Some(Self::SOA),
            "PTR" => Some(Self::PTR),
            "MX" => Some(Self::MX),
            "TXT" => Some(Self::TXT),
            "AAAA" => Some(Self::AAAA),
            "DNSKEY" => Some(Self::DNSKEY),
            "RRSIG" => Some(Self::RRSIG),
            "IXFR" => Some(Self::IXFR),
            "AXFR" => Some(Self::AXFR),
            "ANY" => Some(Self::ANY),
            _ => None,
        }
    }

    /// True for the zone-transfer pseudo-types.
    pub fn is_transfer(self) -> bool {
        matches!(self, Self::AXFR | Self::IXFR)
    }
}

impl From<DNSResourceType> for u16 {
    fn from(rtype: DNSResourceType) -> u16 {
        rtype.to_u16()
    }
}

impl fmt::Display for DNSResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::NS => write!(f, "NS"),
            Self::CNAME => write!(f, "CNAME"),
            Self::SOA => write!(f, "SOA"),
            Self::PTR => write!(f, "PTR"),
            Self::MX => write!(f, "MX"),
            Self::TXT => write!(f, "TXT"),
            Self::AAAA => write!(f, "AAAA"),
            Self::DNSKEY => write!(f, "DNSKEY"),
            Self::RRSIG => write!(f, "RRSIG"),
            Self::IXFR => write!(f, "IXFR"),
            Self::AXFR => write!(f, "AXFR"),
            Self::ANY => write!(f, "ANY"),
            Self::Unknown(code) => write!(f, "TYPE{}", code),
        }
    }
}

/// DNS record classes. IN everywhere in practice; NONE/ANY appear in
/// dynamic-update sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DNSResourceClass {
    IN,
    CH,
    HS,
    NONE,
    ANY,
    Unknown(u16),
}

impl DNSResourceClass {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::IN,
            3 => Self::CH,
            4 => Self::HS,
            254 => Self::NONE,
            255 => Self::ANY,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::IN => 1,
            Self::CH => 3,
            Self::HS => 4,
            Self::NONE => 254,
            Self::ANY => 255,
            Self::Unknown(other) => other,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Some(Self::IN),
            "CH" => Some(Self::CH),
            "HS" => Some(Self::HS),
            "NONE" => Some(Self::NONE),
            "ANY" => Some(Self::ANY),
            _ => None,
        }
    }
}

impl From<DNSResourceClass> for u16 {
    fn from(class: DNSResourceClass) -> u16 {
        class.to_u16()
    }
}

impl fmt::Display for DNSResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IN => write!(f, "IN"),
            Self::CH => write!(f, "CH"),
            Self::HS => write!(f, "HS"),
            Self::NONE => write!(f, "NONE"),
            Self::ANY => write!(f, "ANY"),
            Self::Unknown(code) => write!(f, "CLASS{}", code),
        }
    }
}

/// Response codes (RFC 1035 §4.1.1, RFC 2136 §2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseCode {
    NoError = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
    YxDomain = 6,
    YxRRset = 7,
    NxRRset = 8,
    NotAuth = 9,
    NotZone = 10,
}

/// Opcodes we care about: plain query and RFC 2136 UPDATE.
pub mod opcode {
    pub const QUERY: u8 = 0;
    pub const UPDATE: u8 = 5;
}
