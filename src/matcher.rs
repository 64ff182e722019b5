//! Cross-matching engine.
//!
//! A [`Matcher`] owns the primary catalog (points with search radii) and
//! matches secondary coordinate arrays against it, either into per-entry
//! in-memory buffers or streamed straight to a match file.
//!
//! In-memory path: a pixel tree is built over the secondary points, then
//! each primary walks its disc pixels, tests every candidate in those
//! pixels exactly, and accumulates hits in its bounded buffer. Streaming
//! unbounded path: the tree is inverted (primaries indexed under their
//! disc pixels) and the secondary is traversed once, writing each hit
//! immediately without retaining it.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::MatchError;
use crate::healpix::{self, HealPix};
use crate::matches::{self, Match};
use crate::matchfile;
use crate::tree::PixelTree;

/// Cross-matching engine holding the primary catalog.
///
/// The intended workflow is one catalog matched against many secondaries:
/// per-entry buffers are reused across successive match calls. A failed
/// match call leaves the buffers in a consistent but meaningless state;
/// discard its results and call again.
pub struct Matcher {
    hpix: HealPix,
    cat: Catalog,
    /// Cap on matches kept per entry; 0 keeps everything.
    maxmatch: usize,
    /// Consulted only by the streaming unbounded path.
    self_match: bool,
    nmatches: u64,
}

impl Matcher {
    /// Build the engine: HEALPix grid plus primary catalog.
    ///
    /// `ra`/`dec` in degrees, one search radius per point in degrees.
    pub fn new(
        nside: i64,
        ra: &[f64],
        dec: &[f64],
        radius_deg: &[f64],
    ) -> Result<Self, MatchError> {
        let hpix = HealPix::new(nside)?;
        let cat = Catalog::from_arrays(&hpix, ra, dec, radius_deg)?;
        Ok(Self {
            hpix,
            cat,
            maxmatch: 0,
            self_match: false,
            nmatches: 0,
        })
    }

    /// Matches accepted by the most recent match call.
    ///
    /// Replacements in a full bounded buffer do not count; the total
    /// equals the summed buffer sizes (or lines written when streaming).
    pub fn nmatches(&self) -> u64 {
        self.nmatches
    }

    /// Resolution of the underlying grid.
    pub fn hpix_nside(&self) -> i64 {
        self.hpix.nside()
    }

    /// Pixel solid angle of the underlying grid, steradians.
    pub fn hpix_area(&self) -> f64 {
        self.hpix.area()
    }

    /// Number of primary entries.
    pub fn catalog_len(&self) -> usize {
        self.cat.len()
    }

    /// Match secondary points against the catalog, filling the per-entry
    /// buffers.
    ///
    /// `maxmatch` caps the matches kept per entry (0 = unbounded; when
    /// capped, the K closest are kept). `self_match` is recorded but not
    /// consulted on this path: when matching a catalog against itself
    /// the identity pairs are reported like any other match; only the
    /// streaming unbounded path filters them.
    pub fn match_points(
        &mut self,
        maxmatch: usize,
        self_match: bool,
        ra: &[f64],
        dec: &[f64],
    ) -> Result<(), MatchError> {
        if dec.len() != ra.len() {
            return Err(MatchError::SizeMismatch {
                what: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }

        self.maxmatch = maxmatch;
        self.self_match = self_match;
        self.match_prep();

        // one tree node per occupied secondary pixel
        let mut tree = PixelTree::new(self.hpix.npix());
        for (i, (&r, &d)) in ra.iter().zip(dec.iter()).enumerate() {
            tree.insert(self.hpix.eq2pix(r, d)?, i);
        }

        self.nmatches = 0;
        for cat_ind in 0..self.cat.len() {
            self.match_one(&tree, cat_ind, ra, dec)?;
        }

        Ok(())
    }

    /// Match and write the results to `path` instead of keeping them.
    ///
    /// Unbounded (`maxmatch == 0`): each accepted match is written the
    /// moment it is found and nothing is buffered; `self_match` skips
    /// identical indices. Bounded: the in-memory match runs to completion
    /// first, then every buffer is streamed out in buffer order (heap
    /// order when full, not sorted).
    ///
    /// A failed call may leave a partial file on disk.
    pub fn match_to_file(
        &mut self,
        maxmatch: usize,
        self_match: bool,
        ra: &[f64],
        dec: &[f64],
        path: &Path,
    ) -> Result<(), MatchError> {
        if dec.len() != ra.len() {
            return Err(MatchError::SizeMismatch {
                what: "dec",
                expected: ra.len(),
                got: dec.len(),
            });
        }

        let mut w = BufWriter::new(File::create(path)?);

        if maxmatch == 0 {
            self.maxmatch = 0;
            self.self_match = self_match;
            self.nmatches = 0;
            self.stream_matches(ra, dec, &mut w)?;
        } else {
            self.match_points(maxmatch, self_match, ra, dec)?;
            for entry in self.cat.entries() {
                for m in &entry.matches {
                    matchfile::write_match(&mut w, m)?;
                }
            }
        }

        w.flush()?;
        Ok(())
    }

    /// Drain all buffers into one list, in catalog-entry order.
    ///
    /// Within an entry the matches come out in buffer order: insertion
    /// order when unbounded, heap order when the cap was reached. Sort
    /// externally if order matters. Buffers are emptied as they are
    /// copied.
    pub fn take_matches(&mut self) -> Vec<Match> {
        let mut out = Vec::with_capacity(self.nmatches as usize);
        for entry in self.cat.entries_mut() {
            out.extend_from_slice(&entry.matches);
            if entry.matches.capacity() > 1 {
                entry.matches = Vec::new();
            } else {
                entry.matches.clear();
            }
        }
        out
    }

    /// Reset every buffer for a fresh match call, reusing capacity where
    /// the mode allows it.
    fn match_prep(&mut self) {
        let maxmatch = self.maxmatch;
        for entry in self.cat.entries_mut() {
            let buf = &mut entry.matches;
            if maxmatch == 0 {
                // release anything a previous bounded call reserved
                if buf.capacity() > 1 {
                    *buf = Vec::new();
                } else {
                    buf.clear();
                }
            } else {
                buf.clear();
                if buf.capacity() < maxmatch {
                    buf.reserve_exact(maxmatch - buf.capacity());
                }
            }
        }
    }

    /// Test every secondary under one primary's disc pixels.
    fn match_one(
        &mut self,
        tree: &PixelTree,
        cat_ind: usize,
        ra: &[f64],
        dec: &[f64],
    ) -> Result<(), MatchError> {
        let maxmatch = self.maxmatch;
        let mut appended = 0u64;

        let CatalogEntry {
            point,
            disc_pixels,
            matches: buf,
        } = self.cat.entry_mut(cat_ind);
        let pt = *point;

        for &pixel_id in disc_pixels.iter() {
            let Some(candidates) = tree.find(pixel_id) else {
                continue;
            };

            for &input_ind in candidates {
                let [x, y, z] = healpix::eq2xyz(ra[input_ind], dec[input_ind])?;
                let cos_angle = pt.x * x + pt.y * y + pt.z * z;

                if cos_angle > pt.cos_radius {
                    let m = Match {
                        cat_ind: cat_ind as i64,
                        input_ind: input_ind as i64,
                        cosdist: cos_angle,
                    };

                    if maxmatch == 0 || buf.len() < maxmatch {
                        appended += 1;
                        buf.push(m);
                        // a single-slot buffer is already a heap
                        if maxmatch > 1 && buf.len() == maxmatch {
                            matches::build_heap(buf);
                        }
                    } else {
                        // replacements leave the count alone
                        matches::heap_insert(buf, m);
                    }
                }
            }
        }

        self.nmatches += appended;
        Ok(())
    }

    /// Unbounded streaming: one pass over the secondary against an
    /// inverted tree of the primaries' disc pixels.
    fn stream_matches(
        &mut self,
        ra: &[f64],
        dec: &[f64],
        w: &mut impl Write,
    ) -> Result<(), MatchError> {
        let mut tree = PixelTree::new(self.hpix.npix());
        for (cat_ind, entry) in self.cat.entries().iter().enumerate() {
            for &pixel_id in &entry.disc_pixels {
                tree.insert(pixel_id, cat_ind);
            }
        }

        for (input_ind, (&r, &d)) in ra.iter().zip(dec.iter()).enumerate() {
            let pix = self.hpix.eq2pix(r, d)?;
            let Some(candidates) = tree.find(pix) else {
                continue;
            };
            let [x, y, z] = healpix::eq2xyz(r, d)?;

            for &cat_ind in candidates {
                if self.self_match && cat_ind == input_ind {
                    continue;
                }
                let pt = self.cat.entry(cat_ind).point;
                let cos_angle = pt.x * x + pt.y * y + pt.z * z;

                if cos_angle > pt.cos_radius {
                    matchfile::write_match(
                        w,
                        &Match {
                            cat_ind: cat_ind as i64,
                            input_ind: input_ind as i64,
                            cosdist: cos_angle,
                        },
                    )?;
                    self.nmatches += 1;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Catalog")?;
        writeln!(f, "    entries: {}", self.cat.len())?;
        writeln!(f, "    hpix nside: {}", self.hpix.nside())?;
        write!(f, "    hpix area: {:.6e} sr", self.hpix.area())
    }
}
