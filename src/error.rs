//! Error type shared across the crate.

use std::io;

use thiserror::Error;

/// Everything that can go wrong while building a catalog, matching, or
/// reading and writing match files.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The primary catalog must contain at least one point.
    #[error("ra/dec must have size > 0")]
    EmptyCatalog,

    /// A companion array does not line up with the ra array.
    #[error("{what} must be same length as ra,dec ({expected}), got {got}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// The HEALPix resolution parameter is out of range.
    #[error("nside must be >= 1, got {0}")]
    BadNside(i64),

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate: ra={ra}, dec={dec}")]
    BadCoordinate { ra: f64, dec: f64 },

    /// A match-file line did not hold `cat_ind input_ind cosdist`.
    #[error("line {line}: expected `cat_ind input_ind cosdist`")]
    Parse { line: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
