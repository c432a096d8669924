//! C5: HyperSplit search (spec §4.4).
//!
//! Pure comparisons against the packed node array, no allocation on the
//! hot path. A packet is searched against every tree in the forest; the
//! minimum priority across trees wins (smaller priority = higher
//! precedence).

use crate::hypersplit::tree::{NodeKind, Tree};
use crate::rule::{Packet, Trace};

/// Walk `tree` from its root, returning the leaf priority reached.
pub fn search_tree(tree: &Tree, packet: &Packet) -> u32 {
    let mut idx = tree.root_index();
    loop {
        match tree.node(idx) {
            NodeKind::Internal { dim, threshold, left, right } => {
                idx = if packet.value(*dim) <= *threshold { *left } else { *right };
            }
            NodeKind::Leaf { priority } => return *priority,
        }
    }
}

/// Search `packet` against every tree in the forest, returning the
/// smallest priority found, or `def_rule` if the forest is empty.
pub fn search_one(trees: &[Tree], def_rule: u32, packet: &Packet) -> u32 {
    trees
        .iter()
        .map(|t| search_tree(t, packet))
        .min()
        .unwrap_or(def_rule)
}

/// Apply `search_one` to every packet in `trace`, writing the result into
/// `packet.found`.
pub fn search_trace(trees: &[Tree], def_rule: u32, trace: &mut Trace) {
    for packet in &mut trace.packets {
        packet.found = search_one(trees, def_rule, packet);
    }
}
