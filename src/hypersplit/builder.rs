//! C4: HyperSplit tree construction (spec §4.3).
//!
//! At each node, every dimension is shadow-projected (C3) within the
//! node's bounding box; the dimension whose half-weight threshold produces
//! the most balanced two-way split is chosen. Rules that straddle the
//! threshold are replicated into both children — this is the documented
//! source of rule blow-up that RFG (C6) exists to limit.

use crate::dim::{full_box, BoundingBox, Dimension};
use crate::error::Error;
use crate::hypersplit::tree::{NodeKind, Tree};
use crate::rule::{Rule, RuleSet};
use crate::shadow;
use alloc::vec::Vec;

/// `2 * sum(BIT_WIDTH) = 208` (spec §5). Recursion this deep only happens
/// on pathological, highly-overlapping inputs; plain recursion is safe
/// because the bound is small, so no explicit work-stack is needed (see
/// DESIGN.md).
const MAX_DEPTH: u32 = 208;

/// Build a HyperSplit tree over `rule_set`. `rule_set` must be non-empty.
pub fn build(rule_set: &RuleSet) -> Result<Tree, Error> {
    if rule_set.rules.is_empty() {
        return Err(Error::Invalid);
    }

    let rule_ids: Vec<usize> = (0..rule_set.rules.len()).collect();
    let bbox = full_box();

    let mut nodes = Vec::new();
    let mut inode_num = 0u32;
    let mut depth_max = 0u32;

    build_node(
        &rule_set.rules,
        &rule_ids,
        &bbox,
        0,
        &mut nodes,
        &mut inode_num,
        &mut depth_max,
    )?;

    Ok(Tree {
        nodes,
        inode_num,
        depth_max,
    })
}

fn min_priority(rules: &[Rule], rule_ids: &[usize]) -> u32 {
    rule_ids
        .iter()
        .map(|&i| rules[i].priority)
        .min()
        .expect("rule_ids is non-empty")
}

fn push_leaf(priority: u32, depth: u32, nodes: &mut Vec<NodeKind>, depth_max: &mut u32) -> u32 {
    *depth_max = (*depth_max).max(depth);
    nodes.push(NodeKind::Leaf { priority });
    (nodes.len() - 1) as u32
}

struct Candidate {
    dim: Dimension,
    threshold: u32,
    left_ids: Vec<usize>,
    right_ids: Vec<usize>,
    score: f64,
}

/// Score a two-way split by how balanced and how replicated it is: the
/// larger side dominates, with a small penalty for total replication so
/// ties prefer the split that duplicates fewer rules overall.
fn score_split(left: usize, right: usize) -> f64 {
    (left.max(right) as f64) + 0.1 * ((left + right) as f64)
}

fn evaluate_dimension(
    rules: &[Rule],
    rule_ids: &[usize],
    bbox: &BoundingBox,
    dim: Dimension,
) -> Result<Candidate, Error> {
    let bound = bbox[dim as usize];
    let proj = shadow::shadow(rules, rule_ids, dim, bound)?;

    let half = (proj.total + 1) / 2;
    let mut cum: u64 = 0;
    let mut threshold = bound[1];
    for seg in &proj.segments {
        cum += seg.count as u64;
        threshold = seg.hi;
        if cum >= half {
            break;
        }
    }

    let left_bound = [bound[0], threshold];
    let mut left_ids = Vec::new();
    let mut right_ids = Vec::new();
    for &id in rule_ids {
        if rules[id].overlaps(dim, left_bound) {
            left_ids.push(id);
        }
    }
    if threshold < bound[1] {
        let right_bound = [threshold + 1, bound[1]];
        for &id in rule_ids {
            if rules[id].overlaps(dim, right_bound) {
                right_ids.push(id);
            }
        }
    }

    let score = score_split(left_ids.len(), right_ids.len());
    Ok(Candidate {
        dim,
        threshold,
        left_ids,
        right_ids,
        score,
    })
}

fn build_node(
    rules: &[Rule],
    rule_ids: &[usize],
    bbox: &BoundingBox,
    depth: u32,
    nodes: &mut Vec<NodeKind>,
    inode_num: &mut u32,
    depth_max: &mut u32,
) -> Result<u32, Error> {
    if rule_ids.len() == 1 || depth >= MAX_DEPTH {
        return Ok(push_leaf(min_priority(rules, rule_ids), depth, nodes, depth_max));
    }

    let mut best: Option<Candidate> = None;
    for d in Dimension::ALL {
        let cand = evaluate_dimension(rules, rule_ids, bbox, d)?;
        let better = match &best {
            None => true,
            Some(b) => cand.score < b.score,
        };
        if better {
            best = Some(cand);
        }
    }
    let best = best.expect("DIM_MAX > 0");

    // Degenerate: every remaining rule is indistinguishable on this box —
    // neither side shrank below the full subset.
    if best.left_ids.len() == rule_ids.len() && best.right_ids.len() == rule_ids.len() {
        return Ok(push_leaf(min_priority(rules, rule_ids), depth, nodes, depth_max));
    }

    let left_idx = if best.left_ids.is_empty() {
        push_leaf(min_priority(rules, rule_ids), depth + 1, nodes, depth_max)
    } else {
        let mut left_box: BoundingBox = *bbox;
        left_box[best.dim as usize] = [bbox[best.dim as usize][0], best.threshold];
        build_node(rules, &best.left_ids, &left_box, depth + 1, nodes, inode_num, depth_max)?
    };
    let right_idx = if best.right_ids.is_empty() {
        push_leaf(min_priority(rules, rule_ids), depth + 1, nodes, depth_max)
    } else {
        let mut right_box: BoundingBox = *bbox;
        right_box[best.dim as usize] = [best.threshold + 1, bbox[best.dim as usize][1]];
        build_node(rules, &best.right_ids, &right_box, depth + 1, nodes, inode_num, depth_max)?
    };

    nodes.push(NodeKind::Internal {
        dim: best.dim,
        threshold: best.threshold,
        left: left_idx,
        right: right_idx,
    });
    *inode_num += 1;
    Ok((nodes.len() - 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::full_box;
    use crate::rule::Rule;

    fn rule(sip_lo: u32, sip_hi: u32, priority: u32) -> Rule {
        let mut dims = full_box();
        dims[Dimension::Sip as usize] = [sip_lo, sip_hi];
        Rule::new(dims, priority).unwrap()
    }

    #[test]
    fn single_rule_is_a_leaf() {
        let rs = RuleSet::from_rules(alloc::vec![rule(0, u32::MAX, 0)]);
        let tree = build(&rs).unwrap();
        assert_eq!(tree.inode_num, 0);
        assert_eq!(tree.enode_num(), 1);
        assert!(matches!(tree.node(tree.root_index()), NodeKind::Leaf { priority: 0 }));
    }

    #[test]
    fn empty_ruleset_is_invalid() {
        let rs = RuleSet::from_rules(Vec::new());
        assert_eq!(build(&rs).unwrap_err(), Error::Invalid);
    }

    #[test]
    fn two_disjoint_sip_rules_split_on_sip_at_127() {
        let rs = RuleSet::from_rules(alloc::vec![rule(0, 127, 0), rule(128, 255, 1)]);
        let tree = build(&rs).unwrap();
        assert_eq!(tree.inode_num, 1);
        assert_eq!(tree.enode_num(), 2);
        match tree.node(tree.root_index()) {
            NodeKind::Internal { dim, threshold, .. } => {
                assert_eq!(*dim, Dimension::Sip);
                assert_eq!(*threshold, 127);
            }
            NodeKind::Leaf { .. } => panic!("expected an internal node"),
        }
    }

    #[test]
    fn depth_max_matches_tree_shape() {
        let rs = RuleSet::from_rules(alloc::vec![rule(0, 127, 0), rule(128, 255, 1)]);
        let tree = build(&rs).unwrap();
        assert_eq!(tree.depth_max, 1);
    }
}
