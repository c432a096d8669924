//! C1: the rule/packet/trace/partition data model (spec §3).
//!
//! A [`Rule`] stores all five dimension ranges uniformly as `[lo, hi]` pairs
//! of `u32` (mirroring the original platform's `struct rule { uint32_t
//! dims[DIM_MAX][2]; ... }`), rather than giving each dimension its own
//! differently-typed field. Every algorithm downstream (shadow projection,
//! prefix conversion, tree building) is written generically "for each
//! dimension d"; a uniform representation keeps that code free of
//! per-dimension match arms.

use crate::dim::{Dimension, DIM_MAX};
use crate::error::Error;
use alloc::vec::Vec;
use core::fmt;

/// Maximum rules accepted from a single rule file.
pub const RULE_MAX: usize = 65_536;
/// Maximum packets accepted from a single trace file.
pub const PKT_MAX: usize = 1_000_000;
/// Maximum subsets a [`Partition`] may hold.
pub const PART_MAX: usize = 16;

/// A closed interval `[min, max]`, generic so it can describe either a raw
/// dimension range or a decoded CIDR-prefix range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, val: T) -> bool {
        val >= self.min && val <= self.max
    }
}

/// A classification rule: one closed interval per dimension, plus a
/// priority (lower value = higher precedence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub dims: [[u32; 2]; DIM_MAX],
    pub priority: u32,
}

impl Rule {
    /// Build a rule, checking `lo <= hi` on every dimension.
    pub fn new(dims: [[u32; 2]; DIM_MAX], priority: u32) -> Result<Self, Error> {
        for [lo, hi] in dims {
            if lo > hi {
                return Err(Error::Invalid);
            }
        }
        Ok(Self { dims, priority })
    }

    pub fn range(&self, dim: Dimension) -> [u32; 2] {
        self.dims[dim as usize]
    }

    /// True if every dimension of `packet` falls within this rule's range.
    pub fn matches(&self, packet: &Packet) -> bool {
        Dimension::ALL
            .iter()
            .all(|&d| Range::new(self.dims[d as usize][0], self.dims[d as usize][1]).contains(packet.dims[d as usize]))
    }

    /// True if this rule's range on `dim` intersects `bound`.
    pub fn overlaps(&self, dim: Dimension, bound: [u32; 2]) -> bool {
        let [lo, hi] = self.dims[dim as usize];
        lo <= bound[1] && hi >= bound[0]
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule(pri={}, dims={:?})", self.priority, self.dims)
    }
}

/// An ordered sequence of rules plus the "default match" priority returned
/// when a search finds nothing (spec §3: "typically the last-loaded rule's
/// priority").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    pub def_rule: u32,
}

impl RuleSet {
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let def_rule = rules.last().map(|r| r.priority).unwrap_or(0);
        Self { rules, def_rule }
    }

    pub fn rule_num(&self) -> usize {
        self.rules.len()
    }

    /// Linear-scan reference classifier: the minimum priority among rules
    /// matching `packet`, or `def_rule` if none match (spec §8 oracle).
    pub fn classify_linear(&self, packet: &Packet) -> u32 {
        self.rules
            .iter()
            .filter(|r| r.matches(packet))
            .map(|r| r.priority)
            .min()
            .unwrap_or(self.def_rule)
    }
}

/// A single packet's 5-tuple, plus the trace file's expected answer and the
/// slot search() fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet {
    pub dims: [u32; DIM_MAX],
    /// Expected match rule priority, loaded from the trace file (already
    /// decremented from the file's 1-based value).
    pub match_rule: u32,
    /// Populated by `search`/`search_trace`.
    pub found: u32,
}

impl Packet {
    pub fn new(dims: [u32; DIM_MAX]) -> Self {
        Self {
            dims,
            match_rule: 0,
            found: 0,
        }
    }

    pub fn value(&self, dim: Dimension) -> u32 {
        self.dims[dim as usize]
    }
}

/// An ordered sequence of packets.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub packets: Vec<Packet>,
}

/// An ordered sequence of rule subsets, produced by RFG (or a single-subset
/// wrapper around a freshly loaded `RuleSet`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub subsets: Vec<RuleSet>,
}

impl Partition {
    pub fn single(rs: RuleSet) -> Self {
        Self { subsets: alloc::vec![rs] }
    }

    pub fn subset_num(&self) -> usize {
        self.subsets.len()
    }

    pub fn rule_num(&self) -> usize {
        self.subsets.iter().map(RuleSet::rule_num).sum()
    }

    /// The default-match priority for the partition as a whole: the
    /// highest-numbered priority across all subsets (the overall last
    /// rule), used as the classifier-wide fallback.
    pub fn def_rule(&self) -> u32 {
        self.subsets
            .iter()
            .map(|s| s.def_rule)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::full_box;

    fn wildcard_rule(priority: u32) -> Rule {
        let mut dims = [[0u32, 0]; DIM_MAX];
        for d in Dimension::ALL {
            dims[d as usize] = d.universe();
        }
        Rule::new(dims, priority).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let mut dims = full_box();
        dims[0] = [10, 5];
        assert_eq!(Rule::new(dims, 0), Err(Error::Invalid));
    }

    #[test]
    fn wildcard_matches_everything() {
        let r = wildcard_rule(0);
        let p = Packet::new([1, 2, 3, 4, 5]);
        assert!(r.matches(&p));
    }

    #[test]
    fn classify_linear_picks_min_priority() {
        let rs = RuleSet::from_rules(alloc::vec![wildcard_rule(3), wildcard_rule(1), wildcard_rule(2)]);
        let p = Packet::new([1, 2, 3, 4, 5]);
        assert_eq!(rs.classify_linear(&p), 1);
    }

    #[test]
    fn classify_linear_falls_back_to_def_rule() {
        let mut dims = full_box();
        dims[Dimension::Proto as usize] = [1, 1];
        let r = Rule::new(dims, 7).unwrap();
        let rs = RuleSet::from_rules(alloc::vec![r]);
        let p = Packet::new([0, 0, 0, 0, 2]);
        assert_eq!(rs.classify_linear(&p), rs.def_rule);
    }
}
