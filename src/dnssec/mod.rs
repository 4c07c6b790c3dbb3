pub mod algorithm;
pub mod errors;
pub mod key_tag;
pub mod keypair;
pub mod signer;
pub mod validator;

pub use algorithm::DnsSecAlgorithm;
pub use errors::DnsSecError;
pub use key_tag::calculate_key_tag;
pub use keypair::SigningKey;
pub use signer::{Rrsig, sign};
pub use validator::{Dnskey, unix_now, verify_rrset};

/// DNSSEC constants
pub mod constants {
    /// How long outbound transfer signatures stay valid (7 days)
    pub const SIGNATURE_VALIDITY_SECS: u32 = 7 * 24 * 3600;

    /// Inception backdate to absorb clock skew between peers (5 minutes)
    pub const INCEPTION_SKEW_SECS: u32 = 300;
}
