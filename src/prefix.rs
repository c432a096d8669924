//! C2: range <-> CIDR-prefix conversion.
//!
//! [`range_to_prefixes`] decomposes an arbitrary `[lo, hi]` range into the
//! minimal set of aligned `(value, len)` prefixes that covers it exactly;
//! [`prefix_to_range`] is its inverse. [`split_range_rule`] applies the
//! decomposition independently on every dimension of a [`Rule`] and takes
//! the cross product, turning one range rule into a set of prefix-only
//! rules — grounded directly on the original platform's `split_range_rule`
//! odometer loop, which carries from the last dimension (`DIM_PROTO`)
//! backward.

use crate::dim::Dimension;
use crate::error::Error;
use crate::rule::Rule;
use alloc::vec::Vec;

/// An aligned prefix: the top `len` bits of `value` are significant, the
/// rest are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub value: u32,
    pub len: u32,
}

/// Decompose `[lo, hi]` (within a `bits`-wide universe) into the minimal
/// ordered set of prefixes whose union is exactly `[lo, hi]`.
///
/// At each step the longest prefix starting at the current cursor that both
/// respects alignment and stays within `hi` is chosen greedily; this always
/// yields the minimal decomposition.
pub fn range_to_prefixes(lo: u32, hi: u32, bits: u32) -> Result<Vec<Prefix>, Error> {
    if lo > hi {
        return Err(Error::Invalid);
    }

    let mut prefixes = Vec::new();
    let mut current = lo;
    loop {
        let trailing_zeros = if current == 0 { bits } else { current.trailing_zeros() };
        let alignment_len = if trailing_zeros >= bits { 0 } else { bits - trailing_zeros };

        let mut best_len = bits;
        for l in alignment_len..=bits {
            let size = 1u64 << (bits - l);
            if (current as u64) + size - 1 <= hi as u64 {
                best_len = l;
                break;
            }
        }

        prefixes.push(Prefix { value: current, len: best_len });

        let size = 1u64 << (bits - best_len);
        let next = current as u64 + size;
        if next > hi as u64 {
            break;
        }
        current = next as u32;
    }

    Ok(prefixes)
}

/// Expand a prefix back into the `[lo, hi]` range it covers within a
/// `bits`-wide universe. Infallible: every `(value, len)` with `len <=
/// bits` denotes a valid range.
pub fn prefix_to_range(p: Prefix, bits: u32) -> [u32; 2] {
    if p.len >= bits {
        return [p.value, p.value];
    }
    let host_bits = bits - p.len;
    let size = 1u64 << host_bits;
    let mask = (size - 1) as u32;
    [p.value & !mask, p.value | mask]
}

/// Split a range rule into the cross product of its per-dimension prefix
/// decompositions. Every output rule keeps the input rule's priority.
///
/// Dimensions are decomposed independently, then combined via an
/// odometer-style counter that carries starting from the last dimension
/// (`Proto`) toward the first (`Sip`) — the same traversal order as the
/// source platform's cross-product loop, so the resulting rule order
/// matches what downstream tooling expects from a prefix-only rule file.
pub fn split_range_rule(rule: &Rule) -> Result<Vec<Rule>, Error> {
    let mut prefixes: [Vec<Prefix>; 5] = Default::default();
    for d in Dimension::ALL {
        let [lo, hi] = rule.range(d);
        prefixes[d as usize] = range_to_prefixes(lo, hi, d.width())?;
    }

    let mut cursors = [0usize; 5];
    let mut out = Vec::new();

    loop {
        if cursors[Dimension::Sip as usize] >= prefixes[Dimension::Sip as usize].len() {
            break;
        }

        let mut dims = [[0u32, 0]; 5];
        for d in Dimension::ALL {
            let p = prefixes[d as usize][cursors[d as usize]];
            dims[d as usize] = prefix_to_range(p, d.width());
        }
        out.push(Rule::new(dims, rule.priority)?);

        let mut d = Dimension::Proto as usize;
        cursors[d] += 1;
        while cursors[d] == prefixes[d].len() && d > Dimension::Sip as usize {
            cursors[d] = 0;
            d -= 1;
            cursors[d] += 1;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_is_a_single_wildcard_prefix() {
        let ps = range_to_prefixes(0, u32::MAX, 32).unwrap();
        assert_eq!(ps, alloc::vec![Prefix { value: 0, len: 0 }]);
    }

    #[test]
    fn single_value_is_a_host_prefix() {
        let ps = range_to_prefixes(42, 42, 32).unwrap();
        assert_eq!(ps, alloc::vec![Prefix { value: 42, len: 32 }]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(range_to_prefixes(5, 1, 8), Err(Error::Invalid));
    }

    #[test]
    fn round_trip_on_unaligned_port_range() {
        let (lo, hi) = (100u32, 200u32);
        let ps = range_to_prefixes(lo, hi, 16).unwrap();
        let mut covered: Vec<u32> = Vec::new();
        for p in &ps {
            let [a, b] = prefix_to_range(*p, 16);
            for v in a..=b {
                covered.push(v);
            }
        }
        covered.sort_unstable();
        let expected: Vec<u32> = (lo..=hi).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn prefixes_are_disjoint_and_sorted() {
        let ps = range_to_prefixes(10, 300, 16).unwrap();
        for w in ps.windows(2) {
            let [_, hi0] = prefix_to_range(w[0], 16);
            let [lo1, _] = prefix_to_range(w[1], 16);
            assert!(hi0 < lo1);
        }
    }

    #[test]
    fn split_range_rule_cross_product_covers_box() {
        use crate::dim::full_box;
        let mut dims = full_box();
        dims[Dimension::Sport as usize] = [100, 101];
        dims[Dimension::Dport as usize] = [0, 1];
        let rule = Rule::new(dims, 9).unwrap();
        let split = split_range_rule(&rule).unwrap();

        // Every produced rule is a pure prefix on every dimension and keeps
        // the original priority; the union of sport x dport pairs covers
        // exactly the 2x2 input box.
        let mut pairs: Vec<(u32, u32)> = Vec::new();
        for r in &split {
            assert_eq!(r.priority, 9);
            pairs.push((r.dims[Dimension::Sport as usize][0], r.dims[Dimension::Dport as usize][0]));
        }
        pairs.sort_unstable();
        assert_eq!(pairs, alloc::vec![(100, 0), (100, 1), (101, 0), (101, 1)]);
    }
}
