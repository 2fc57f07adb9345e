//! Unified error type for the imposition pipeline.
//!
//! Every failure is fatal: the binary prints the display string as a
//! one-line diagnostic and exits nonzero. Variants carry exactly what that
//! line needs.

use thiserror::Error;

/// Main error type for imposition operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed dimension argument
    #[error("bad dimension '{0}'")]
    BadDimension(String),

    /// Malformed integer argument
    #[error("invalid number '{0}'")]
    BadNumber(String),

    /// Paper name missing from the paper database
    #[error("paper size '{0}' not recognised")]
    UnknownPaper(String),

    /// Pages per sheet was zero
    #[error("number of pages per sheet must be positive")]
    BadNup,

    /// Output size neither given nor derivable
    #[error("paper size not set")]
    PaperSizeNotSet,

    /// Margins leave no usable sheet area
    #[error("paper margins are too large")]
    MarginsTooLarge,

    /// `w` unit used before the output width was known
    #[error("width not set")]
    WidthNotSet,

    /// `h` unit used before the output height was known
    #[error("height not set")]
    HeightNotSet,

    /// No grid layout beat the waste tolerance
    #[error("can't find acceptable layout for {0}-up")]
    NoLayout(u32),

    /// A `%%Page:` line had an unterminated label
    #[error("bad page label while seeking page {0}")]
    BadPageLabel(usize),

    /// A page offset did not lead to a `%%Page:` line
    #[error("I/O error seeking page {0}")]
    PageSeek(usize),

    /// Input ended before a section copy reached its target offset
    #[error("I/O error in {0}")]
    Truncated(&'static str),
}

/// Result type for imposition operations.
pub type Result<T> = std::result::Result<T, Error>;
