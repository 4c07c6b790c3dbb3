pub mod errors;
pub mod parser;
pub mod record;
pub mod rrset;
#[allow(clippy::module_inception)]
pub mod zone;

pub use errors::{Result, ZoneError};
pub use parser::ZoneParser;
pub use rrset::{RRsetKey, RecordSet};
pub use zone::{Node, Zone};

/// Zone constants
pub mod constants {
    /// Default TTL if not specified (1 hour)
    pub const DEFAULT_TTL: u32 = 3600;
}
