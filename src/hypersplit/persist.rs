//! C7: binary save/load of a built forest (spec §4.6, §6.5).
//!
//! The original format is a raw host-endian struct dump with no magic
//! number and no version byte — flagged in spec §9 as a portability
//! hazard. This reimplementation keeps the original's field grouping
//! (tree count, default priority, then per-tree `inode_num`/`depth_max`/
//! node-buffer) but adds a 4-byte magic, a version byte, explicit
//! little-endian integers, and index-based child references instead of a
//! pointer dump.

use crate::dim::Dimension;
use crate::error::Error;
use crate::hypersplit::tree::{NodeKind, Tree};
use alloc::vec::Vec;

pub const MAGIC: [u8; 4] = *b"HSC1";
pub const FORMAT_VERSION: u8 = 1;

const TAG_INTERNAL: u8 = 0;
const TAG_LEAF: u8 = 1;

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn node_encoded_len(node: &NodeKind) -> usize {
    match node {
        NodeKind::Internal { .. } => 1 + 1 + 4 + 4 + 4,
        NodeKind::Leaf { .. } => 1 + 4,
    }
}

fn push_node(out: &mut Vec<u8>, node: &NodeKind) {
    match node {
        NodeKind::Internal { dim, threshold, left, right } => {
            out.push(TAG_INTERNAL);
            out.push(*dim as u8);
            push_u32(out, *threshold);
            push_u32(out, *left);
            push_u32(out, *right);
        }
        NodeKind::Leaf { priority } => {
            out.push(TAG_LEAF);
            push_u32(out, *priority);
        }
    }
}

/// Serialize a forest of trees into the versioned binary schema.
pub fn save(trees: &[Tree], def_rule: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    push_u32(&mut out, trees.len() as u32);
    push_u32(&mut out, def_rule);

    for tree in trees {
        push_u32(&mut out, tree.inode_num);
        push_u32(&mut out, tree.depth_max);
        push_u32(&mut out, tree.nodes.len() as u32);

        let mlen: usize = tree.nodes.iter().map(node_encoded_len).sum();
        push_u32(&mut out, mlen as u32);
        for node in &tree.nodes {
            push_node(&mut out, node);
        }
    }

    out
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(n).ok_or(Error::Corrupt("length overflow"))?;
        let slice = self.bytes.get(self.pos..end).ok_or(Error::Corrupt("short read"))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, Error> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn read_node(r: &mut Reader) -> Result<NodeKind, Error> {
    match r.u8()? {
        TAG_INTERNAL => {
            let dim_byte = r.u8()?;
            let dim = Dimension::from_index(dim_byte as usize).ok_or(Error::Corrupt("bad dimension"))?;
            let threshold = r.u32()?;
            let left = r.u32()?;
            let right = r.u32()?;
            Ok(NodeKind::Internal { dim, threshold, left, right })
        }
        TAG_LEAF => Ok(NodeKind::Leaf { priority: r.u32()? }),
        _ => Err(Error::Corrupt("bad node tag")),
    }
}

/// Deserialize a forest previously produced by [`save`]. Any short read or
/// internal inconsistency (bad magic, unsupported version, mismatched
/// `mlen`, out-of-range child index) is reported as `Error::Corrupt`.
pub fn load(bytes: &[u8]) -> Result<(Vec<Tree>, u32), Error> {
    let mut r = Reader::new(bytes);

    let magic = r.take(4)?;
    if magic != MAGIC {
        return Err(Error::Corrupt("bad magic"));
    }
    let version = r.u8()?;
    if version != FORMAT_VERSION {
        return Err(Error::Corrupt("unsupported version"));
    }

    let tree_num = r.u32()? as usize;
    let def_rule = r.u32()?;

    let mut trees = Vec::with_capacity(tree_num);
    for _ in 0..tree_num {
        let inode_num = r.u32()?;
        let depth_max = r.u32()?;
        let node_count = r.u32()? as usize;
        let mlen = r.u32()? as usize;

        let body_start = r.pos;
        let mut nodes = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            let node = read_node(&mut r)?;
            if let NodeKind::Internal { left, right, .. } = node {
                if left as usize >= node_count || right as usize >= node_count {
                    return Err(Error::Corrupt("child index out of range"));
                }
            }
            nodes.push(node);
        }
        if r.pos - body_start != mlen {
            return Err(Error::Corrupt("mlen mismatch"));
        }

        trees.push(Tree { nodes, inode_num, depth_max });
    }

    Ok((trees, def_rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::{full_box, Dimension};
    use crate::hypersplit::builder::build;
    use crate::rule::Rule;
    use crate::rule::RuleSet;

    fn rule(sip_lo: u32, sip_hi: u32, priority: u32) -> Rule {
        let mut dims = full_box();
        dims[Dimension::Sip as usize] = [sip_lo, sip_hi];
        Rule::new(dims, priority).unwrap()
    }

    #[test]
    fn round_trip_preserves_tree_structure() {
        let rs = RuleSet::from_rules(alloc::vec![rule(0, 127, 0), rule(128, 255, 1)]);
        let tree = build(&rs).unwrap();
        let bytes = save(&[tree.clone()], rs.def_rule);
        let (loaded, def_rule) = load(&bytes).unwrap();
        assert_eq!(loaded, alloc::vec![tree]);
        assert_eq!(def_rule, rs.def_rule);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = save(&[], 0);
        bytes[0] = b'X';
        assert_eq!(load(&bytes).unwrap_err(), Error::Corrupt("bad magic"));
    }

    #[test]
    fn rejects_short_read() {
        let rs = RuleSet::from_rules(alloc::vec![rule(0, 127, 0), rule(128, 255, 1)]);
        let tree = build(&rs).unwrap();
        let mut bytes = save(&[tree], rs.def_rule);
        bytes.truncate(bytes.len() - 2);
        assert!(load(&bytes).is_err());
    }
}
