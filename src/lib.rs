pub mod authority;
pub mod client;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod gatekeeper;
pub mod transport;
pub mod zone;

pub use dns::DNSPacket;
pub use error::{DnsError, Result};
