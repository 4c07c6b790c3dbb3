//! Stateless load splitting across the primary/secondary authority pair.

use crate::dns::DNSPacket;
use std::net::SocketAddr;
use tracing::debug;

/// Which upstream a query was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Primary,
    Secondary,
}

/// Splits queries 50/50 on the parity of a fresh random token. Not
/// health-aware: no retry against the other upstream, no circuit breaking.
/// Update queries always go to the primary, where they are applied directly.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    primary: SocketAddr,
    secondary: SocketAddr,
}

impl Dispatcher {
    pub fn new(primary: SocketAddr, secondary: SocketAddr) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> SocketAddr {
        self.primary
    }

    pub fn secondary(&self) -> SocketAddr {
        self.secondary
    }

    /// Pick the upstream for one query, drawing a fresh token.
    pub fn route(&self, query: &DNSPacket) -> (SocketAddr, Route) {
        if query.is_update() {
            debug!("routing update to primary");
            return (self.primary, Route::Primary);
        }
        self.route_with_token(rand::random())
    }

    fn route_with_token(&self, token: u64) -> (SocketAddr, Route) {
        if token % 2 == 0 {
            (self.primary, Route::Primary)
        } else {
            (self.secondary, Route::Secondary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DNSQuestion, DNSResource, DNSResourceClass, DNSResourceType, opcode};

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            "127.0.0.1:31111".parse().unwrap(),
            "127.0.0.1:31112".parse().unwrap(),
        )
    }

    #[test]
    fn test_parity_decides_route() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.route_with_token(0).1, Route::Primary);
        assert_eq!(dispatcher.route_with_token(1).1, Route::Secondary);
        assert_eq!(dispatcher.route_with_token(2).1, Route::Primary);
    }

    #[test]
    fn test_split_converges_toward_even() {
        let dispatcher = dispatcher();
        let query = DNSPacket::query(1, DNSQuestion::new("www.example.com", DNSResourceType::A));

        let total = 2000;
        let primaries = (0..total)
            .filter(|_| dispatcher.route(&query).1 == Route::Primary)
            .count();

        // Loose statistical bound: a fair coin stays within these limits
        // with overwhelming probability at this sample size.
        assert!(primaries > total * 2 / 5, "primary starved: {}", primaries);
        assert!(primaries < total * 3 / 5, "secondary starved: {}", primaries);
    }

    #[test]
    fn test_updates_always_hit_primary() {
        let dispatcher = dispatcher();
        let mut update = DNSPacket::query(1, DNSQuestion::new("example.com", DNSResourceType::SOA));
        update.header.opcode = opcode::UPDATE;
        update.authorities.push(DNSResource::new(
            "new.example.com",
            DNSResourceType::A,
            DNSResourceClass::IN,
            300,
            vec![192, 0, 2, 50],
        ));

        for _ in 0..64 {
            assert_eq!(dispatcher.route(&update).1, Route::Primary);
        }
    }
}
