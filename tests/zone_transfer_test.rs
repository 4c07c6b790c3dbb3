//! Replication end to end over localhost UDP: a secondary pulls a signed
//! zone from its primary via the plaintext control message, validates it,
//! and swaps it in. Failures leave the secondary untouched.

mod common;

use bastion_dns::client;
use bastion_dns::dns::{DNSPacket, DNSResource, DNSResourceClass, DNSResourceType};
use bastion_dns::gatekeeper::trigger_zone_transfer;
use bastion_dns::transport::udp::UdpTransport;
use common::{authority_from_zone, base_zone, generate_key, sign_zone, silent_upstream};
use tempfile::TempDir;

#[tokio::test]
async fn secondary_converges_to_primary_zone() {
    let (_up_guard, upstream) = silent_upstream().await;

    // Primary: offline-signed zone with www = 192.0.2.1.
    let primary_dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut primary_zone = base_zone([192, 0, 2, 1]);
    sign_zone(&mut primary_zone, &file_key);
    let primary = authority_from_zone(&primary_dir, &primary_zone, upstream);

    let primary_udp = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), primary)
        .await
        .unwrap();
    let primary_addr = primary_udp.local_addr().unwrap();
    tokio::spawn(primary_udp.run());

    // Secondary: stale zone with www = 192.0.2.200.
    let secondary_dir = TempDir::new().unwrap();
    let stale_key = generate_key();
    let mut stale_zone = base_zone([192, 0, 2, 200]);
    sign_zone(&mut stale_zone, &stale_key);
    let secondary = authority_from_zone(&secondary_dir, &stale_zone, upstream);
    let secondary_handle = secondary.clone();

    let secondary_udp = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), secondary)
        .await
        .unwrap();
    let secondary_addr = secondary_udp.local_addr().unwrap();
    tokio::spawn(secondary_udp.run());

    // Trigger replication the way the gatekeeper (and the trigger utility)
    // do: a plaintext control datagram to the secondary.
    let verdict = trigger_zone_transfer(secondary_addr, "example.com", primary_addr)
        .await
        .unwrap();
    assert!(verdict, "secondary should answer SUCCESS");

    // The secondary now serves the primary's data.
    let reply = client::forward(secondary_addr, "www.example.com", DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(reply.answers.len(), 1);
    assert_eq!(reply.answers[0].rdata, vec![192, 0, 2, 1]);

    // And its own DNSKEY invariant held through the swap.
    assert_eq!(secondary_handle.zone().dnskey_rrsets().len(), 1);

    // The transferred zone was persisted.
    let on_disk = bastion_dns::zone::ZoneParser::new()
        .parse_file(secondary_dir.path().join("zone"))
        .unwrap();
    assert_eq!(on_disk, *secondary_handle.zone());
}

#[tokio::test]
async fn unvalidatable_transfer_leaves_secondary_untouched() {
    let (_up_guard, upstream) = silent_upstream().await;

    // A fake primary that answers transfer queries with unsigned records
    // and no DNSKEY.
    let fake_primary = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let fake_addr = fake_primary.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        loop {
            let (len, from) = fake_primary.recv_from(&mut buf).await.unwrap();
            let Ok(request) = DNSPacket::parse(&buf[..len]) else {
                continue;
            };
            let mut response = DNSPacket::response_to(&request);
            response.answers.push(DNSResource::new(
                "www.example.com",
                DNSResourceType::A,
                DNSResourceClass::IN,
                300,
                vec![198, 51, 100, 66],
            ));
            let _ = fake_primary
                .send_to(&response.to_bytes().unwrap(), from)
                .await;
        }
    });

    let secondary_dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut zone = base_zone([192, 0, 2, 200]);
    sign_zone(&mut zone, &file_key);
    let secondary = authority_from_zone(&secondary_dir, &zone, upstream);
    let secondary_handle = secondary.clone();
    let before = secondary_handle.zone();

    let secondary_udp = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), secondary)
        .await
        .unwrap();
    let secondary_addr = secondary_udp.local_addr().unwrap();
    tokio::spawn(secondary_udp.run());

    let verdict = trigger_zone_transfer(secondary_addr, "example.com", fake_addr)
        .await
        .unwrap();
    assert!(!verdict, "secondary should answer FAILURE");

    // Local zone untouched, still serving the old data.
    assert_eq!(*before, *secondary_handle.zone());
    let reply = client::forward(secondary_addr, "www.example.com", DNSResourceType::A)
        .await
        .unwrap();
    assert_eq!(reply.answers[0].rdata, vec![192, 0, 2, 200]);
}

#[tokio::test]
async fn transfer_round_trips_data_with_fresh_signatures() {
    // Two serves of the same zone answer with identical data but
    // independently produced signatures, and both validate at the receiver.
    let (_up_guard, upstream) = silent_upstream().await;

    let dir = TempDir::new().unwrap();
    let file_key = generate_key();
    let mut zone = base_zone([192, 0, 2, 1]);
    sign_zone(&mut zone, &file_key);
    let authority = authority_from_zone(&dir, &zone, upstream);

    let udp = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), authority)
        .await
        .unwrap();
    let addr = udp.local_addr().unwrap();
    tokio::spawn(udp.run());

    let first = client::forward(addr, "example.com", DNSResourceType::AXFR)
        .await
        .unwrap();
    let second = client::forward(addr, "example.com", DNSResourceType::AXFR)
        .await
        .unwrap();

    let data_records = |packet: &DNSPacket| {
        packet
            .answers
            .iter()
            .filter(|record| record.rtype != DNSResourceType::RRSIG)
            .cloned()
            .collect::<Vec<_>>()
    };
    assert_eq!(data_records(&first), data_records(&second));
    assert!(
        first
            .answers
            .iter()
            .any(|record| record.rtype == DNSResourceType::RRSIG)
    );
}
