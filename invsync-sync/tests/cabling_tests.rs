mod common;

use common::interface_record as iface;
use invsync_model::dcim::Cable;
use invsync_sync::cabling::derive_cables;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn devices(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}

fn endpoint(device: &str, interface: &str) -> (String, String) {
    (device.to_string(), interface.to_string())
}

#[test]
fn link_reported_from_both_ends_yields_one_cable() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &["b"]),
        iface("b", "d2", "eth1", &["a"]),
    ];
    let derived = derive_cables(&interfaces, &devices(&[("d1", "sw1"), ("d2", "sw2")]), "internal");

    assert_eq!(
        derived.cables,
        vec![Cable::between(endpoint("sw1", "eth0"), endpoint("sw2", "eth1"))]
    );
    assert!(derived.unresolved.is_empty());
}

#[test]
fn cable_endpoints_are_canonical() {
    let interfaces = vec![iface("b", "d2", "eth1", &["a"]), iface("a", "d1", "eth0", &[])];
    let derived = derive_cables(&interfaces, &devices(&[("d1", "sw1"), ("d2", "sw2")]), "internal");

    let cable = &derived.cables[0];
    assert_eq!(cable.from_device, "sw1");
    assert_eq!(cable.to_device, "sw2");
}

#[test]
fn zero_or_many_connections_yield_nothing() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &[]),
        iface("b", "d1", "eth1", &["c", "d"]),
        iface("c", "d2", "eth0", &[]),
        iface("d", "d2", "eth1", &[]),
    ];
    let derived = derive_cables(&interfaces, &devices(&[("d1", "sw1"), ("d2", "sw2")]), "internal");
    assert!(derived.cables.is_empty());
}

#[test]
fn unknown_peers_and_devices_are_ignored() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &["ghost"]),
        iface("b", "d9", "eth0", &["c"]),
        iface("c", "d1", "eth1", &["b"]),
    ];
    let derived = derive_cables(&interfaces, &devices(&[("d1", "sw1")]), "internal");
    assert!(derived.cables.is_empty());
    assert!(derived.unresolved.is_empty());
}

#[test]
fn self_loop_is_skipped() {
    let interfaces = vec![iface("a", "d1", "eth0", &["a"])];
    let derived = derive_cables(&interfaces, &devices(&[("d1", "sw1")]), "internal");
    assert!(derived.cables.is_empty());
}

// ── Aggregation interface ───────────────────────────────────────

#[test]
fn one_hop_through_aggregation_interface() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &["hub"]),
        iface("hub", "d2", "internal", &["a", "b"]),
        iface("b", "d3", "eth7", &["hub"]),
    ];
    let derived = derive_cables(
        &interfaces,
        &devices(&[("d1", "sw1"), ("d2", "core"), ("d3", "sw3")]),
        "internal",
    );

    assert_eq!(
        derived.cables,
        vec![Cable::between(endpoint("sw1", "eth0"), endpoint("sw3", "eth7"))]
    );
    assert!(derived.unresolved.is_empty());
}

#[test]
fn ambiguous_aggregation_interface_is_unresolved() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &["hub"]),
        iface("hub", "d2", "internal", &["a", "b", "c"]),
        iface("b", "d3", "eth1", &[]),
        iface("c", "d3", "eth2", &[]),
    ];
    let derived = derive_cables(
        &interfaces,
        &devices(&[("d1", "sw1"), ("d2", "core"), ("d3", "sw3")]),
        "internal",
    );
    assert!(derived.cables.is_empty());
    assert_eq!(derived.unresolved.len(), 1);
}

#[test]
fn chained_aggregation_interfaces_are_unresolved() {
    let interfaces = vec![
        iface("a", "d1", "eth0", &["hub1"]),
        iface("hub1", "d2", "internal", &["a", "hub2"]),
        iface("hub2", "d3", "internal", &["hub1", "b"]),
        iface("b", "d4", "eth0", &[]),
    ];
    let derived = derive_cables(
        &interfaces,
        &devices(&[("d1", "sw1"), ("d2", "core1"), ("d3", "core2"), ("d4", "sw4")]),
        "internal",
    );
    assert!(derived.cables.is_empty());
    assert_eq!(derived.unresolved.len(), 1);
}
