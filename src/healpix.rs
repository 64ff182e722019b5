//! HEALPix (Hierarchical Equal Area isoLatitude Pixelisation) grid,
//! ring scheme.
//!
//! Pixels are numbered along iso-latitude rings from the north pole:
//! a north polar cap (rings `1..nside`), an equatorial belt
//! (rings `nside..=3*nside`) and a south polar cap. Unlike the nested
//! scheme, `nside` may be any positive integer, not just a power of two.
//!
//! The grid provides the three geometric primitives the matcher needs:
//! equatorial-to-Cartesian conversion, point-to-pixel assignment, and
//! conservative enumeration of the pixels covering a spherical cap.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::MatchError;

/// Maximum angular distance from a pixel centre to its farthest corner,
/// scaled by nside. Equal to acos(2/3), attained by the polar pixels at
/// nside = 1; higher resolutions shrink roughly as 1/nside.
const MAX_PIXRAD_NSIDE1: f64 = 0.841_068_670_567_930_3;

/// Convert (RA, Dec) in degrees to a unit vector `[x, y, z]`.
///
/// Fails with [`MatchError::BadCoordinate`] on non-finite input. RA is
/// unrestricted in range; the trigonometry handles any wrap.
pub fn eq2xyz(ra: f64, dec: f64) -> Result<[f64; 3], MatchError> {
    if !ra.is_finite() || !dec.is_finite() {
        return Err(MatchError::BadCoordinate { ra, dec });
    }
    let phi = ra.to_radians();
    let theta = dec.to_radians();
    let cos_dec = theta.cos();
    Ok([cos_dec * phi.cos(), cos_dec * phi.sin(), theta.sin()])
}

/// Ring-scheme HEALPix grid parameters.
#[derive(Debug, Clone)]
pub struct HealPix {
    nside: i64,
    npix: i64,
    ncap: i64,
    area: f64,
}

impl HealPix {
    /// Create a grid. `nside` must be a positive integer.
    pub fn new(nside: i64) -> Result<Self, MatchError> {
        if nside < 1 {
            return Err(MatchError::BadNside(nside));
        }
        let npix = 12 * nside * nside;
        Ok(Self {
            nside,
            npix,
            // pixels above the northernmost equatorial-belt ring
            ncap: 2 * nside * (nside - 1),
            area: 4.0 * PI / npix as f64,
        })
    }

    /// The resolution parameter.
    pub fn nside(&self) -> i64 {
        self.nside
    }

    /// Total number of pixels: `12 * nside^2`.
    pub fn npix(&self) -> i64 {
        self.npix
    }

    /// Solid angle of a single pixel, in steradians.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Ring-scheme pixel index for (RA, Dec) in degrees.
    ///
    /// Fails with [`MatchError::BadCoordinate`] on non-finite input only;
    /// out-of-range declinations saturate through the trigonometry.
    pub fn eq2pix(&self, ra: f64, dec: f64) -> Result<i64, MatchError> {
        if !ra.is_finite() || !dec.is_finite() {
            return Err(MatchError::BadCoordinate { ra, dec });
        }
        Ok(self.zphi2pix(dec.to_radians().sin(), ra.to_radians()))
    }

    /// Pixels covering the spherical cap of `radius` radians around the
    /// unit vector `(x, y, z)`, sorted ascending, duplicate-free.
    ///
    /// The enumeration is conservative: the radius is enlarged by the
    /// maximum pixel circumradius and the ring range padded by one, so
    /// every pixel whose area intersects the cap is present. Extra
    /// pixels are harmless; callers re-test candidates exactly.
    ///
    /// A zero radius yields the single containing pixel; a radius of at
    /// least pi yields every pixel.
    pub fn disc_intersect(&self, x: f64, y: f64, z: f64, radius: f64) -> Vec<i64> {
        if radius == 0.0 {
            let phi = if x != 0.0 || y != 0.0 { y.atan2(x) } else { 0.0 };
            return vec![self.zphi2pix(z.clamp(-1.0, 1.0), phi)];
        }
        if radius >= PI {
            return (0..self.npix).collect();
        }
        let fudge = MAX_PIXRAD_NSIDE1 / self.nside as f64;
        let mut pixels = self.disc_contains(x, y, z, (radius.max(0.0) + fudge).min(PI));
        pixels.sort_unstable();
        pixels.dedup();
        pixels
    }

    /// Pixel index from z = sin(dec) and phi in radians.
    fn zphi2pix(&self, z: f64, phi: f64) -> i64 {
        let nside = self.nside;
        // longitude in units of quarter turns, in [0, 4)
        let tt = phi.rem_euclid(TAU) / FRAC_PI_2;
        let za = z.abs();

        if za <= 2.0 / 3.0 {
            // Equatorial belt: locate the crossing of the two edge lines
            // through the point.
            let temp1 = nside as f64 * (0.5 + tt);
            let temp2 = nside as f64 * z * 0.75;
            let jp = (temp1 - temp2).floor() as i64; // ascending edge line
            let jm = (temp1 + temp2).floor() as i64; // descending edge line

            let ir = nside + 1 + jp - jm; // ring counted from z = 2/3
            let kshift = 1 - (ir & 1); // 1 on even rings

            let nl4 = 4 * nside;
            let ip = ((jp + jm - nside + kshift + 1) / 2).rem_euclid(nl4);

            self.ncap + nl4 * (ir - 1) + ip
        } else {
            // Polar caps.
            let tp = tt.fract();
            let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();

            // clamp guards rounding right at the |z| = 2/3 boundary
            let jp = ((tp * tmp).floor() as i64).min(nside - 1);
            let jm = (((1.0 - tp) * tmp).floor() as i64).min(nside - 1);

            let ir = jp + jm + 1; // ring counted from the nearest pole
            let ip = ((tt * ir as f64).floor() as i64).rem_euclid(4 * ir);

            if z > 0.0 {
                2 * ir * (ir - 1) + ip
            } else {
                self.npix - 2 * ir * (ir + 1) + ip
            }
        }
    }

    /// Ring index (1-based from the north pole) of latitude z.
    fn ring_num(&self, z: f64) -> i64 {
        let nside = self.nside;
        if z > 2.0 / 3.0 {
            let ir = (nside as f64 * (3.0 * (1.0 - z)).sqrt()).round() as i64;
            ir.max(1)
        } else if z < -2.0 / 3.0 {
            let ir = (nside as f64 * (3.0 * (1.0 + z)).sqrt()).round() as i64;
            4 * nside - ir.max(1)
        } else {
            (nside as f64 * (2.0 - 1.5 * z)).round() as i64
        }
    }

    /// Pixels whose centre lies within `radius` of `(x, y, z)`, walked
    /// ring by ring with one ring of padding on each side.
    fn disc_contains(&self, x: f64, y: f64, z0: f64, radius: f64) -> Vec<i64> {
        let nside = self.nside;
        let cosang = radius.cos();

        let dth1 = 1.0 / (3.0 * (nside * nside) as f64);
        let dth2 = 2.0 / (3.0 * nside as f64);

        let phi0 = if x != 0.0 || y != 0.0 { y.atan2(x) } else { 0.0 };
        let a = x * x + y * y;

        // z extent of the cap
        let rlat0 = z0.clamp(-1.0, 1.0).asin();
        let rlat1 = rlat0 + radius;
        let rlat2 = rlat0 - radius;

        let zmax = if rlat1 >= FRAC_PI_2 { 1.0 } else { rlat1.sin() };
        let irmin = (self.ring_num(zmax) - 1).max(1);

        let zmin = if rlat2 <= -FRAC_PI_2 { -1.0 } else { rlat2.sin() };
        let irmax = (self.ring_num(zmin) + 1).min(4 * nside - 1);

        let mut pixels = Vec::new();

        for iz in irmin..=irmax {
            let zring = if iz < nside {
                1.0 - (iz * iz) as f64 * dth1
            } else if iz <= 3 * nside {
                (2 * nside - iz) as f64 * dth2
            } else {
                let t = (4 * nside - iz) as f64;
                -1.0 + t * t * dth1
            };

            // half-width in phi of the cap at this ring's latitude
            let b = cosang - zring * z0;
            let c = 1.0 - zring * zring;

            let dphi = if a == 0.0 {
                // centred on a pole: rings are entirely in or out
                if b > 0.0 {
                    continue;
                }
                PI
            } else {
                let cosdphi = b / (a * c).sqrt();
                if cosdphi > 1.0 {
                    continue; // ring outside the cap
                }
                if cosdphi < -1.0 {
                    PI // ring entirely inside
                } else {
                    cosdphi.acos()
                }
            };

            self.in_ring(iz, phi0, dphi, &mut pixels);
        }

        pixels
    }

    /// Append the pixels of ring `iz` whose centre longitude lies within
    /// `dphi` of `phi0`, handling wrap around the ring.
    fn in_ring(&self, iz: i64, phi0: f64, dphi: f64, pixels: &mut Vec<i64>) {
        let nside = self.nside;

        let (nr, ipix1, shift) = if iz < nside {
            // north polar cap
            (4 * iz, 2 * iz * (iz - 1), 0.5)
        } else if iz > 3 * nside {
            // south polar cap
            let ir = 4 * nside - iz;
            (4 * ir, self.npix - 2 * ir * (ir + 1), 0.5)
        } else {
            // equatorial belt: alternate rings are offset by half a pixel
            let ir = iz - nside + 1;
            let shift = 0.5 * (ir % 2) as f64;
            (4 * nside, self.ncap + (ir - 1) * 4 * nside, shift)
        };

        let ipix2 = ipix1 + nr - 1;

        if dphi > PI - 1e-7 {
            pixels.extend(ipix1..=ipix2);
            return;
        }

        let scale = nr as f64 / TAU;
        let ip_lo = ((scale * (phi0 - dphi) - shift).floor() as i64) + 1;
        let ip_hi = (scale * (phi0 + dphi) - shift).floor() as i64;

        let mut pixnum = ip_lo + ipix1;
        if pixnum < ipix1 {
            pixnum += nr;
        }
        for _ in ip_lo..=ip_hi {
            if pixnum > ipix2 {
                pixnum -= nr;
            }
            pixels.push(pixnum);
            pixnum += 1;
        }
    }
}
