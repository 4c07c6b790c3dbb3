use super::enums::{DNSResourceClass, DNSResourceType};
use super::name::{name_to_wire, parse_name, write_name};
use crate::error::{DnsError, Result};

/// A resource record with its rdata held in uncompressed wire form.
///
/// Compression pointers inside rdata are expanded at parse time, so records
/// can be re-serialized, compared, and fed to the DNSSEC canonical form
/// without carrying offsets into the original message around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DNSResource {
    /// Owner name, lowercase, no trailing dot
    pub name: String,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl DNSResource {
    pub fn new(
        name: impl Into<String>,
        rtype: DNSResourceType,
        rclass: DNSResourceClass,
        ttl: u32,
        rdata: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into().trim_end_matches('.').to_lowercase(),
            rtype,
            rclass,
            ttl,
            rdata,
        }
    }

    pub fn parse(message: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, pos) = parse_name(message, offset)?;
        let fixed = message
            .get(pos..pos + 10)
            .ok_or_else(|| DnsError::InvalidPacket("truncated record header".to_string()))?;

        let rtype = DNSResourceType::from_u16(u16::from_be_bytes([fixed[0], fixed[1]]));
        let rclass = DNSResourceClass::from_u16(u16::from_be_bytes([fixed[2], fixed[3]]));
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;

        let rdata_start = pos + 10;
        let rdata_end = rdata_start + rdlength;
        if message.len() < rdata_end {
            return Err(DnsError::InvalidPacket("truncated rdata".to_string()));
        }

        let rdata = decompress_rdata(message, rdata_start, rdata_end, rtype)?;

        Ok((
            Self {
                name,
                rtype,
                rclass,
                ttl,
                rdata,
            },
            rdata_end,
        ))
    }

    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_name(buf, &self.name)?;
        buf.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.rclass.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.rdata);
        Ok(())
    }

    /// The type an RRSIG record covers (first two rdata bytes), if this
    /// record is a signature.
    pub fn covered_type(&self) -> Option<DNSResourceType> {
        if self.rtype != DNSResourceType::RRSIG || self.rdata.len() < 2 {
            return None;
        }
        Some(DNSResourceType::from_u16(u16::from_be_bytes([
            self.rdata[0],
            self.rdata[1],
        ])))
    }
}

/// Expand compression pointers inside rdata for the record types that embed
/// domain names. All other rdata is copied verbatim.
fn decompress_rdata(
    message: &[u8],
    start: usize,
    end: usize,
    rtype: DNSResourceType,
) -> Result<Vec<u8>> {
    match rtype {
        DNSResourceType::NS | DNSResourceType::CNAME | DNSResourceType::PTR => {
            let (target, consumed) = parse_name(message, start)?;
            if consumed > end {
                return Err(DnsError::InvalidPacket("name overruns rdata".to_string()));
            }
            name_to_wire(&target)
        }
        DNSResourceType::MX => {
            if end - start < 3 {
                return Err(DnsError::InvalidPacket("short MX rdata".to_string()));
            }
            let mut rdata = message[start..start + 2].to_vec();
            let (exchange, consumed) = parse_name(message, start + 2)?;
            if consumed > end {
                return Err(DnsError::InvalidPacket("name overruns rdata".to_string()));
            }
            rdata.extend_from_slice(&name_to_wire(&exchange)?);
            Ok(rdata)
        }
        DNSResourceType::SOA => {
            let (mname, pos) = parse_name(message, start)?;
            let (rname, pos) = parse_name(message, pos)?;
            if pos + 20 > end {
                return Err(DnsError::InvalidPacket("short SOA rdata".to_string()));
            }
            let mut rdata = name_to_wire(&mname)?;
            rdata.extend_from_slice(&name_to_wire(&rname)?);
            rdata.extend_from_slice(&message[pos..pos + 20]);
            Ok(rdata)
        }
        // RRSIG signer names and everything else are uncompressed on the
        // wire (RFC 4034 §3.1.7), so a straight copy is already canonical.
        _ => Ok(message[start..end].to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = DNSResource::new(
            "www.example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            3600,
            vec![192, 0, 2, 1],
        );

        let mut buf = Vec::new();
        record.write(&mut buf).unwrap();

        let (parsed, consumed) = DNSResource::parse(&buf, 0).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn test_compressed_ns_rdata_expanded() {
        // Message: the owner name, then an NS record whose rdata is
        // "ns1." + pointer back to the owner name.
        let mut message = Vec::new();
        write_name(&mut message, "example.com").unwrap();
        let record_at = message.len();

        message.extend_from_slice(&[0xC0, 0x00]); // owner: pointer to example.com
        message.extend_from_slice(&DNSResourceType::NS.to_u16().to_be_bytes());
        message.extend_from_slice(&DNSResourceClass::IN.to_u16().to_be_bytes());
        message.extend_from_slice(&300u32.to_be_bytes());
        message.extend_from_slice(&6u16.to_be_bytes()); // rdlength
        message.extend_from_slice(b"\x03ns1");
        message.extend_from_slice(&[0xC0, 0x00]); // pointer to example.com

        let (parsed, _) = DNSResource::parse(&message, record_at).unwrap();
        assert_eq!(parsed.name, "example.com");
        assert_eq!(parsed.rdata, name_to_wire("ns1.example.com").unwrap());
    }

    #[test]
    fn test_covered_type() {
        let mut rdata = Vec::new();
        rdata.extend_from_slice(&DNSResourceType::A.to_u16().to_be_bytes());
        rdata.extend_from_slice(&[15, 2]); // algorithm, labels

        let sig = DNSResource::new(
            "example.com",
            DNSResourceType::RRSIG,
            DNSResourceClass::IN,
            300,
            rdata,
        );
        assert_eq!(sig.covered_type(), Some(DNSResourceType::A));

        let a = DNSResource::new(
            "example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            300,
            vec![192, 0, 2, 1],
        );
        assert_eq!(a.covered_type(), None);
    }
}
