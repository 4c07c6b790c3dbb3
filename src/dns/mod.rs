pub mod enums;
pub mod header;
pub mod name;
pub mod packet;
pub mod question;
pub mod resource;

pub use enums::{DNSResourceClass, DNSResourceType, ResponseCode, opcode};
pub use header::DNSHeader;
pub use packet::DNSPacket;
pub use question::DNSQuestion;
pub use resource::DNSResource;
