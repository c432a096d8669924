//! C6: Recursive Field Grouping.
//!
//! Splits a `RuleSet` into up to `PART_MAX` subsets so that wildcard-heavy
//! rules do not force every HyperSplit tree to replicate across their full
//! range. Rules are bucketed by a 5-bit "bigness" signature (one bit per
//! dimension, set when the rule's range there covers at least half that
//! dimension's universe); oversized bucket counts are then folded down to
//! `PART_MAX` by repeatedly merging the two smallest buckets, which keeps
//! rules that share few "big" dimensions grouped together.

use crate::dim::Dimension;
use crate::error::Error;
use crate::rule::{Partition, Rule, RuleSet, PART_MAX};
use alloc::vec::Vec;

/// Bit `d` is set iff `rule`'s range on dimension `d` covers at least half
/// of that dimension's universe.
fn signature(rule: &Rule) -> u8 {
    let mut sig = 0u8;
    for d in Dimension::ALL {
        let [lo, hi] = rule.range(d);
        let width = (hi - lo) as u64 + 1;
        let universe = d.max_value() as u64 + 1;
        if width * 2 >= universe {
            sig |= 1 << (d as u8);
        }
    }
    sig
}

/// Partition `rule_set` into at most `PART_MAX` subsets by bigness
/// signature.
///
/// Every input rule appears in exactly one output subset, in its original
/// within-subset priority order; the result is deterministic for a given
/// input.
pub fn group(rule_set: &RuleSet) -> Result<Partition, Error> {
    if rule_set.rules.is_empty() {
        return Err(Error::Invalid);
    }

    // Bucket by signature, buckets ordered by first appearance so grouping
    // is deterministic given the input order.
    let mut bucket_sigs: Vec<u8> = Vec::new();
    let mut buckets: Vec<Vec<Rule>> = Vec::new();
    for rule in &rule_set.rules {
        let sig = signature(rule);
        match bucket_sigs.iter().position(|&s| s == sig) {
            Some(idx) => buckets[idx].push(rule.clone()),
            None => {
                bucket_sigs.push(sig);
                buckets.push(alloc::vec![rule.clone()]);
            }
        }
    }

    // Fold down to PART_MAX subsets by repeatedly merging the two smallest
    // buckets — this keeps the largest, most distinctively-signed buckets
    // intact the longest.
    while buckets.len() > PART_MAX {
        let mut smallest = 0usize;
        let mut second = 1usize;
        if buckets[second].len() < buckets[smallest].len() {
            core::mem::swap(&mut smallest, &mut second);
        }
        for i in 2..buckets.len() {
            if buckets[i].len() < buckets[smallest].len() {
                second = smallest;
                smallest = i;
            } else if buckets[i].len() < buckets[second].len() {
                second = i;
            }
        }
        let merged = buckets.swap_remove(smallest.max(second));
        let other = buckets.swap_remove(smallest.min(second));
        // A plain `append` would concatenate two independently-sorted
        // sequences whose priority ranges interleave, leaving the result
        // unsorted; merge by priority so the subset stays in priority
        // order (its last element must remain its true max-priority rule,
        // since `RuleSet::from_rules` derives `def_rule` from it).
        let mut combined = Vec::with_capacity(other.len() + merged.len());
        let (mut i, mut j) = (0, 0);
        while i < other.len() && j < merged.len() {
            if other[i].priority <= merged[j].priority {
                combined.push(other[i].clone());
                i += 1;
            } else {
                combined.push(merged[j].clone());
                j += 1;
            }
        }
        combined.extend_from_slice(&other[i..]);
        combined.extend_from_slice(&merged[j..]);
        buckets.push(combined);
    }

    let subsets = buckets.into_iter().map(RuleSet::from_rules).collect();
    Ok(Partition { subsets })
}

/// Inverse of [`group`]: flatten a partition back into a single `RuleSet`
/// ordered by original priority.
///
/// Grounded on the original platform's `revert_partition`: rules are
/// written back into an array indexed by their own priority
/// (`rules[rule.pri] = rule`), which both restores the original order and
/// catches priority collisions introduced by a malformed partition (two
/// rules claiming the same slot silently overwrite — an accepted limitation
/// inherited from the source algorithm). Unlike the original, `def_rule` is
/// computed from the reconstructed array's own last rule rather than copied
/// from `subsets[0]`, which was arbitrary and wrong whenever subset 0 did
/// not contain the globally last-priority rule (see DESIGN.md).
pub fn revert_partition(partition: &Partition) -> Result<RuleSet, Error> {
    if partition.subsets.is_empty() {
        return Err(Error::Invalid);
    }

    let rule_num = partition.rule_num();
    let mut slots: Vec<Option<Rule>> = alloc::vec![None; rule_num];

    for subset in &partition.subsets {
        for rule in &subset.rules {
            let idx = rule.priority as usize;
            if idx >= rule_num {
                return Err(Error::Invalid);
            }
            slots[idx] = Some(rule.clone());
        }
    }

    let mut rules = Vec::with_capacity(rule_num);
    for slot in slots {
        rules.push(slot.ok_or(Error::Invalid)?);
    }

    Ok(RuleSet::from_rules(rules))
}
