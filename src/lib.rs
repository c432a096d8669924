#![no_std]
#![deny(warnings)]

extern crate alloc;

pub mod dim;
pub mod error;
pub mod hypersplit;
pub mod parse;
pub mod prefix;
pub mod rfg;
pub mod rule;
pub mod shadow;
pub mod simulation;

pub use dim::{Dimension, BIT_WIDTH, DIM_MAX};
pub use error::Error;
pub use rule::{Packet, Partition, Range, Rule, RuleSet, Trace};

// Tests can use std
#[cfg(test)]
extern crate std;
