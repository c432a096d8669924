//! HyperSplit: build (C4), search (C5) and persistence (C7) for the
//! per-subset decision trees that make up a classifier.

pub mod builder;
pub mod persist;
pub mod search;
pub mod tree;

pub use tree::{NodeKind, Tree};

use crate::error::Error;
use crate::rule::{Packet, Partition, Trace};
use alloc::vec::Vec;

/// The built classifier: one tree per partition subset plus the
/// partition-wide default priority (spec §3 "HyperSplit result").
///
/// This is the crate's one and only built-index type — see DESIGN.md's
/// note on the spec's `BuiltIndex` tagged-variant suggestion, which only
/// applies once a second classification algorithm is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    pub trees: Vec<Tree>,
    pub def_rule: u32,
}

impl Forest {
    /// Build one tree per subset of `partition`.
    pub fn build(partition: &Partition) -> Result<Self, Error> {
        let mut trees = Vec::with_capacity(partition.subsets.len());
        for subset in &partition.subsets {
            trees.push(builder::build(subset)?);
        }
        Ok(Self { trees, def_rule: partition.def_rule() })
    }

    pub fn search(&self, packet: &Packet) -> u32 {
        search::search_one(&self.trees, self.def_rule, packet)
    }

    pub fn search_trace(&self, trace: &mut Trace) {
        search::search_trace(&self.trees, self.def_rule, trace);
    }

    pub fn save(&self) -> Vec<u8> {
        persist::save(&self.trees, self.def_rule)
    }

    pub fn load(bytes: &[u8]) -> Result<Self, Error> {
        let (trees, def_rule) = persist::load(bytes)?;
        Ok(Self { trees, def_rule })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::full_box;
    use crate::rule::{Rule, RuleSet};

    #[test]
    fn forest_round_trips_through_save_and_load() {
        let mut dims = full_box();
        dims[0] = [0, 127];
        let r0 = Rule::new(dims, 0).unwrap();
        dims[0] = [128, 255];
        let r1 = Rule::new(dims, 1).unwrap();

        let partition = Partition::single(RuleSet::from_rules(alloc::vec![r0, r1]));
        let forest = Forest::build(&partition).unwrap();

        let bytes = forest.save();
        let loaded = Forest::load(&bytes).unwrap();
        assert_eq!(loaded, forest);
    }
}
