use crate::error::{DnsError, Result};

/// Maximum length of a domain name on the wire (RFC 1035 §2.3.4).
const MAX_NAME_LEN: usize = 255;
/// Guard against pointer loops in malformed messages.
const MAX_POINTER_HOPS: usize = 32;

/// Decode a (possibly compressed) domain name starting at `offset` within
/// the full message. Returns the name in lowercase presentation form without
/// a trailing dot (the root is the empty string) and the offset just past
/// the name at its original location.
pub fn parse_name(message: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = offset;
    let mut next = None;
    let mut hops = 0;
    let mut total_len = 0;

    loop {
        let len = *message
            .get(pos)
            .ok_or_else(|| DnsError::InvalidPacket("name runs past message".to_string()))?
            as usize;

        if len == 0 {
            pos += 1;
            break;
        }

        if len & 0xC0 == 0xC0 {
            let low = *message
                .get(pos + 1)
                .ok_or_else(|| DnsError::InvalidPacket("truncated pointer".to_string()))?
                as usize;
            if next.is_none() {
                next = Some(pos + 2);
            }
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return Err(DnsError::InvalidPacket("pointer loop in name".to_string()));
            }
            pos = ((len & 0x3F) << 8) | low;
            continue;
        }

        if len > 63 {
            return Err(DnsError::InvalidLabelLength(len as u8));
        }

        let start = pos + 1;
        let end = start + len;
        let label = message
            .get(start..end)
            .ok_or_else(|| DnsError::InvalidPacket("label runs past message".to_string()))?;

        total_len += len + 1;
        if total_len > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong);
        }

        labels.push(String::from_utf8_lossy(label).to_lowercase());
        pos = end;
    }

    Ok((labels.join("."), next.unwrap_or(pos)))
}

/// Encode a domain name in uncompressed wire form. Accepts presentation
/// names with or without the trailing dot; the empty string and "." both
/// encode the root.
pub fn write_name(buf: &mut Vec<u8>, name: &str) -> Result<()> {
    let trimmed = name.trim_end_matches('.');
    let mut total_len = 0;

    for label in trimmed.split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > 63 {
            return Err(DnsError::InvalidLabelLength(label.len() as u8));
        }
        total_len += label.len() + 1;
        if total_len > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong);
        }
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }

    buf.push(0);
    Ok(())
}

/// Encode a name to a fresh buffer, for rdata construction.
pub fn name_to_wire(name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(name.len() + 2);
    write_name(&mut buf, name)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        let mut buf = Vec::new();
        write_name(&mut buf, "www.example.com.").unwrap();
        assert_eq!(buf, b"\x03www\x07example\x03com\x00");

        let (name, consumed) = parse_name(&buf, 0).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn test_root_name() {
        let mut buf = Vec::new();
        write_name(&mut buf, ".").unwrap();
        assert_eq!(buf, b"\x00");

        let (name, consumed) = parse_name(&buf, 0).unwrap();
        assert_eq!(name, "");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_compressed_name() {
        // "example.com" at offset 0, then "www" + pointer to offset 0.
        let mut message = Vec::new();
        write_name(&mut message, "example.com").unwrap();
        let ptr_at = message.len();
        message.extend_from_slice(b"\x03www");
        message.extend_from_slice(&[0xC0, 0x00]);

        let (name, consumed) = parse_name(&message, ptr_at).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(consumed, message.len());
    }

    #[test]
    fn test_pointer_loop_rejected() {
        // Pointer to itself.
        let message = [0xC0u8, 0x00];
        assert!(parse_name(&message, 0).is_err());
    }

    #[test]
    fn test_uppercase_is_folded() {
        let mut buf = Vec::new();
        write_name(&mut buf, "WWW.Example.COM").unwrap();
        let (name, _) = parse_name(&buf, 0).unwrap();
        assert_eq!(name, "www.example.com");
    }
}
