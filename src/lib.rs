#![warn(rust_2018_idioms)]

//! # CFF1 font subsetter
//!
//! This crate parses a [CFF](https://learn.microsoft.com/en-us/typography/opentype/spec/cff)
//! (Compact Font Format, version 1) table and produces a new, self-consistent
//! CFF table containing only a chosen subset of its glyphs. All internal
//! cross-references — String IDs, charset and encoding tables, Font DICT
//! selectors, and DICT offsets — are renumbered and rewritten for the subset.
//! CharStrings are flattened: global and local subroutine calls are inlined
//! so the output carries no subroutines at all, and stem hints can optionally
//! be stripped.
//!
//! The subsetter works in two phases. A plan pass computes the exact byte
//! layout of the output — every INDEX offset size, every sub-table offset,
//! every remapped identifier — before a single byte is written. A write pass
//! then emits bytes that must land precisely on the planned offsets; any
//! divergence aborts the operation rather than producing a corrupt font.
//!
//! # Example
//!
//! ```no_run
//! use cff_subset::binary::read::ReadScope;
//! use cff_subset::cff::CFF;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // `data` holds the contents of the CFF table of an OpenType font.
//! let data = std::fs::read("font.cff")?;
//! let cff = ReadScope::new(&data).read::<CFF<'_>>()?;
//!
//! // Keep `.notdef` and three other glyphs, stripping hints.
//! let subset = cff.subset(&[0, 68, 69, 70], true)?;
//! std::fs::write("font-subset.cff", subset)?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod cff;
pub mod error;

pub use tinyvec;
