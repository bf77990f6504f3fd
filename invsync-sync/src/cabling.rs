//! Cable derivation from discovered interface connections.
//!
//! Discovery reports connectivity per interface, so every physical cable
//! shows up twice (once from each end). Some links also pass through an
//! internal aggregation interface that is not a real port. This module
//! turns the flat interface list into one [`Cable`] per physical link.

use crate::provider::InterfaceRecord;
use invsync_model::dcim::Cable;
use std::collections::{HashMap, HashSet};

/// Result of [`derive_cables`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedCables {
    /// One cable per physical link, in first-seen order.
    pub cables: Vec<Cable>,
    /// Links that could not be followed through an aggregation interface.
    pub unresolved: Vec<String>,
}

/// Derives cables from `interfaces`.
///
/// `devices` maps device ids to names; interfaces on devices not in the
/// map are ignored. An interface contributes a cable only when it has
/// exactly one connection and that connection resolves to a known
/// interface. A connection landing on the `aggregation` interface is
/// redirected once to the aggregation interface's other connection; if
/// that is ambiguous, unknown, or itself an aggregation interface, the
/// link is reported as unresolved.
pub fn derive_cables(
    interfaces: &[InterfaceRecord],
    devices: &HashMap<String, String>,
    aggregation: &str,
) -> DerivedCables {
    let known: HashMap<&str, &InterfaceRecord> = interfaces
        .iter()
        .filter(|i| devices.contains_key(&i.device_id))
        .map(|i| (i.id.as_str(), i))
        .collect();
    let endpoint = |iface: &InterfaceRecord| -> Option<(String, String)> {
        devices
            .get(&iface.device_id)
            .map(|device| (device.clone(), iface.name.clone()))
    };

    let mut derived = DerivedCables::default();
    let mut seen = HashSet::new();

    for iface in interfaces {
        if iface.name == aggregation || !known.contains_key(iface.id.as_str()) {
            continue;
        }
        let [peer_id] = iface.connected_to.as_slice() else {
            continue;
        };
        let Some(&peer) = known.get(peer_id.as_str()) else {
            continue;
        };

        let peer = if peer.name == aggregation {
            match redirect(iface, peer, &known, aggregation) {
                Some(next) => next,
                None => {
                    derived.unresolved.push(format!(
                        "{}/{} -> {} ({}): cannot follow aggregation interface",
                        iface.device_id, iface.name, peer.name, peer.id
                    ));
                    continue;
                }
            }
        } else {
            peer
        };

        if peer.id == iface.id {
            continue;
        }
        let (Some(a), Some(b)) = (endpoint(iface), endpoint(peer)) else {
            continue;
        };
        let cable = Cable::between(a, b);
        if seen.insert(cable.clone()) {
            derived.cables.push(cable);
        }
    }
    derived
}

/// One hop through an aggregation interface: its connections other than
/// the one we came from must name exactly one real interface.
fn redirect<'a>(
    from: &InterfaceRecord,
    hub: &InterfaceRecord,
    known: &HashMap<&str, &'a InterfaceRecord>,
    aggregation: &str,
) -> Option<&'a InterfaceRecord> {
    let onward: Vec<&String> = hub.connected_to.iter().filter(|id| **id != from.id).collect();
    let [next_id] = onward.as_slice() else {
        return None;
    };
    let next = *known.get(next_id.as_str())?;
    (next.name != aggregation).then_some(next)
}
