//! HEALPix-indexed cross-matching of spherical catalogs.
//!
//! skymatch matches two lists of celestial coordinates: a primary catalog
//! carrying a per-point search radius, and a secondary catalog queried
//! against it. For each primary point it reports the secondary points
//! inside the search disc, optionally limited to the K closest, either
//! in memory or streamed to a plain-text match file.

pub mod catalog;
pub mod error;
pub mod healpix;
pub mod matcher;
pub mod matches;
pub mod matchfile;
pub mod tree;
