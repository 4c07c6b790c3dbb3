use super::enums::{DNSResourceClass, DNSResourceType};
use super::name::{parse_name, write_name};
use crate::error::{DnsError, Result};

/// A question-section entry. In an UPDATE message this is the zone section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DNSQuestion {
    /// Queried name, lowercase, no trailing dot
    pub name: String,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: impl Into<String>, qtype: DNSResourceType) -> Self {
        Self {
            name: name.into().trim_end_matches('.').to_lowercase(),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }

    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, pos) = parse_name(message, offset)?;
        let fixed = message
            .get(pos..pos + 4)
            .ok_or_else(|| DnsError::InvalidPacket("truncated question".to_string()))?;

        Ok((
            Self {
                name,
                qtype: DNSResourceType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]])),
                qclass: DNSResourceClass::from_u16(u16::from_be_bytes([fixed[2], fixed[3]])),
            },
            pos + 4,
        ))
    }

    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_name(buf, &self.name)?;
        buf.extend_from_slice(&self.qtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_u16().to_be_bytes());
        Ok(())
    }
}
