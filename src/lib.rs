//! N-up imposition for DSC-conformant PostScript documents.
//!
//! This library places several logical pages of a PostScript document onto
//! each physical output sheet. One forward scan over the input records the
//! byte offsets of the DSC landmarks (header, prolog, setup, every
//! `%%Page:`), a small optimiser picks the grid and rotation that waste the
//! least sheet area, and the emitter streams a rewritten document whose
//! pages execute the original page bodies under per-cell transforms, gated
//! by an injected `PStoPS` procset.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use psnup::{Options, run};
//!
//! # fn main() -> psnup::Result<()> {
//! let opts = Options {
//!     nup: 2,
//!     width: Some(595.0),
//!     height: Some(842.0),
//!     ..Options::default()
//! };
//! let input = File::open("report.ps")?;
//! let output = File::create("report-2up.ps")?;
//! run(&opts, input, output)?;
//! # Ok(())
//! # }
//! ```
//!
//! Inputs that cannot seek (pipes) can be spooled first with
//! [`io::spool_to_temp`]. The lower-level pieces — [`dsc::InputIndex`],
//! [`layout::choose_layout`], [`pagespec::build_nup_specs`] and
//! [`pstops::Rearranger`] — are public for callers that need other page
//! rearrangements than N-up.

/// Common types and utilities
pub mod common;
/// DSC comment scanning and the page offset index
pub mod dsc;
/// Stream plumbing: spooling, line reads, counted writes
pub mod io;
/// Grid selection
pub mod layout;
/// The N-up front end
pub mod nup;
/// Placement specifications
pub mod pagespec;
/// Paper name lookup
pub mod paper;
/// The page rearrangement engine
pub mod pstops;

// Re-export the entry points for convenience
pub use common::error::{Error, Result};
pub use nup::{Options, run};
pub use paper::PaperSize;
