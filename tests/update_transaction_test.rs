//! The dynamic-update transaction end to end: commits are acknowledged and
//! persisted, rollbacks leave zone and zone file byte-identically alone.

mod common;

use bastion_dns::authority::Resolution;
use bastion_dns::dns::{
    DNSPacket, DNSQuestion, DNSResource, DNSResourceClass, DNSResourceType, opcode,
};
use bastion_dns::zone::ZoneParser;
use common::{authority_from_zone, base_zone, generate_key, sign_zone, silent_upstream};
use tempfile::TempDir;

fn update_query(name: &str, rdata: Vec<u8>) -> DNSPacket {
    let mut query = DNSPacket::query(7, DNSQuestion::new("example.com", DNSResourceType::SOA));
    query.header.opcode = opcode::UPDATE;
    query.authorities.push(DNSResource::new(
        name,
        DNSResourceType::A,
        DNSResourceClass::IN,
        300,
        rdata,
    ));
    query
}

#[tokio::test]
async fn update_that_keeps_zone_valid_commits() {
    let dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut zone = base_zone([192, 0, 2, 1]);
    sign_zone(&mut zone, &file_key);

    let (_guard, upstream) = silent_upstream().await;
    let authority = authority_from_zone(&dir, &zone, upstream);

    // Re-adding the value that is already present changes nothing, so every
    // stored signature still verifies and the transaction commits.
    let query = update_query("www.example.com", vec![192, 0, 2, 1]);
    let resolution = authority.resolve(&query).await.unwrap();

    let Resolution::Update(ack) = resolution else {
        panic!("expected update resolution");
    };
    let applied = ack.expect("no-op union update should commit");
    assert_eq!(applied.name, "www.example.com");
    assert!(applied.contains(&[192, 0, 2, 1]));

    // Committed zone still answers, and the DNSKEY invariant holds.
    let committed = authority.zone();
    assert!(
        committed
            .lookup("www.example.com", DNSResourceType::A)
            .unwrap()
            .contains(&[192, 0, 2, 1])
    );
    assert_eq!(committed.dnskey_rrsets().len(), 1);

    // The committed state was persisted and round-trips from disk.
    let on_disk = ZoneParser::new()
        .parse_file(dir.path().join("zone"))
        .unwrap();
    assert_eq!(on_disk, *committed);
}

#[tokio::test]
async fn update_that_invalidates_a_signature_rolls_back() {
    let dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut zone = base_zone([192, 0, 2, 1]);
    sign_zone(&mut zone, &file_key);

    let (_guard, upstream) = silent_upstream().await;
    let authority = authority_from_zone(&dir, &zone, upstream);

    let before = authority.zone();
    let file_before = std::fs::read_to_string(dir.path().join("zone")).unwrap();

    // A genuinely new value breaks the stored signature over the A set.
    let query = update_query("www.example.com", vec![203, 0, 113, 9]);
    let Resolution::Update(ack) = authority.resolve(&query).await.unwrap() else {
        panic!("expected update resolution");
    };
    assert!(ack.is_none(), "signature-invalidating update must roll back");

    // Atomicity: the committed zone is the checkpointed zone, exactly.
    let after = authority.zone();
    assert_eq!(*before, *after);
    assert!(
        !after
            .lookup("www.example.com", DNSResourceType::A)
            .unwrap()
            .contains(&[203, 0, 113, 9])
    );

    // And nothing touched the file.
    let file_after = std::fs::read_to_string(dir.path().join("zone")).unwrap();
    assert_eq!(file_before, file_after);
}

#[tokio::test]
async fn update_without_offline_signatures_always_rolls_back() {
    // A zone whose only DNSKEY is the authority's own key: stripping it
    // before validation leaves no trust anchor, so even a no-op update is
    // rejected.
    let dir = TempDir::new().unwrap();
    let zone = base_zone([192, 0, 2, 1]);

    let (_guard, upstream) = silent_upstream().await;
    let authority = authority_from_zone(&dir, &zone, upstream);

    let query = update_query("www.example.com", vec![192, 0, 2, 1]);
    let Resolution::Update(ack) = authority.resolve(&query).await.unwrap() else {
        panic!("expected update resolution");
    };
    assert!(ack.is_none());
}

#[tokio::test]
async fn update_outside_zone_is_rejected() {
    let dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut zone = base_zone([192, 0, 2, 1]);
    sign_zone(&mut zone, &file_key);

    let (_guard, upstream) = silent_upstream().await;
    let authority = authority_from_zone(&dir, &zone, upstream);
    let before = authority.zone();

    let query = update_query("www.other.org", vec![192, 0, 2, 1]);
    let Resolution::Update(ack) = authority.resolve(&query).await.unwrap() else {
        panic!("expected update resolution");
    };
    assert!(ack.is_none());
    assert_eq!(*before, *authority.zone());
}
