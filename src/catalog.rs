//! Primary catalog: points with precomputed unit vectors, cap cosines and
//! disc pixel sets.

use crate::error::MatchError;
use crate::healpix::{self, HealPix};
use crate::matches::Match;

/// A point on the unit sphere with its search cap. Built once at catalog
/// construction and immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Search radius in radians.
    pub radius: f64,
    /// cos(radius); a candidate matches iff its dot product exceeds this.
    pub cos_radius: f64,
}

/// One catalog entry: the point, every HEALPix pixel its search disc
/// touches, and the match buffer the engine fills for it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub point: Point,
    pub disc_pixels: Vec<i64>,
    pub matches: Vec<Match>,
}

/// Ordered, fixed-size sequence of entries. `cat_ind` in any emitted
/// match is an index into this sequence.
#[derive(Debug)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from parallel coordinate arrays, radii in degrees.
    pub fn from_arrays(
        hpix: &HealPix,
        ra: &[f64],
        dec: &[f64],
        radius_deg: &[f64],
    ) -> Result<Self, MatchError> {
        if ra.is_empty() {
            return Err(MatchError::EmptyCatalog);
        }
        if dec.len() != ra.len() {
            return Err(MatchError::SizeMismatch {
                what: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }
        if radius_deg.len() != ra.len() {
            return Err(MatchError::SizeMismatch {
                what: "radii",
                expected: ra.len(),
                got: radius_deg.len(),
            });
        }

        let mut entries = Vec::with_capacity(ra.len());
        for i in 0..ra.len() {
            let [x, y, z] = healpix::eq2xyz(ra[i], dec[i])?;
            let radius = radius_deg[i].to_radians();
            let point = Point {
                x,
                y,
                z,
                radius,
                cos_radius: radius.cos(),
            };
            let disc_pixels = hpix.disc_intersect(x, y, z, radius);
            entries.push(CatalogEntry {
                point,
                disc_pixels,
                matches: Vec::new(),
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [CatalogEntry] {
        &mut self.entries
    }

    pub fn entry(&self, cat_ind: usize) -> &CatalogEntry {
        &self.entries[cat_ind]
    }

    pub fn entry_mut(&mut self, cat_ind: usize) -> &mut CatalogEntry {
        &mut self.entries[cat_ind]
    }
}
