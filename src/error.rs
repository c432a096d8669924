//! Error kinds surfaced by the core library (spec §7).
//!
//! All library operations return a `Result`; nothing in this crate panics
//! on bad caller input. `debug_assert!` still guards conditions that should
//! be unreachable given the crate's own invariants (e.g. a dimension index
//! out of range) — those are bugs, not user-facing errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed caller input: null/empty argument, `lo > hi`, empty rule
    /// set passed to `build`.
    #[error("invalid input")]
    Invalid,

    /// Allocation failure. Unreachable in practice under Rust's global
    /// allocator (which aborts rather than returning), kept for API
    /// completeness and spec fidelity.
    #[error("allocation failure")]
    NoMemory,

    /// Unrecognised file format, or a count exceeding a compile-time bound
    /// (`RULE_MAX`, `PKT_MAX`, `PART_MAX`).
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// A binary tree stream failed an internal consistency check.
    #[error("corrupt data: {0}")]
    Corrupt(&'static str),

    /// File open/read/write failure. The core library never produces this
    /// itself (it has no file I/O); it exists so callers that plumb I/O
    /// errors through `hspc::Error` have a slot to put them in.
    #[error("I/O error")]
    Io,
}
