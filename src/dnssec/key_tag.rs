/// Calculate the key tag of a DNSKEY record (RFC 4034 Appendix B).
///
/// The tag is a checksum over the DNSKEY rdata: flags, protocol, algorithm,
/// then the public key, summing big-endian 16-bit groups with carry folding.
pub fn calculate_key_tag(flags: u16, protocol: u8, algorithm: u8, public_key: &[u8]) -> u16 {
    let mut rdata = Vec::with_capacity(4 + public_key.len());
    rdata.extend_from_slice(&flags.to_be_bytes());
    rdata.push(protocol);
    rdata.push(algorithm);
    rdata.extend_from_slice(public_key);

    let mut accumulator: u32 = 0;
    for (i, &byte) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            accumulator += u32::from(byte) << 8;
        } else {
            accumulator += u32::from(byte);
        }
    }
    accumulator += accumulator >> 16;
    (accumulator & 0xFFFF) as u16
}
