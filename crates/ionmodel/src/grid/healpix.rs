//! Equal-area HEALPix sphere partition in RING ordering.
//!
//! Pixel centers sit on `4·nside - 1` iso-latitude rings. The polar caps
//! (`|z| > 2/3`) hold rings with `4·i` pixels, the equatorial belt holds
//! rings with `4·nside` pixels, alternately shifted by half a pixel.

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};

use crate::error::{IonModelError, Result};
use crate::types::GeoPoint;

/// Largest accepted resolution parameter.
pub const MAX_NSIDE: u32 = 1 << 13;

/// HEALPix grid at a power-of-two resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SpatialGrid {
    nside: u32,
}

impl SpatialGrid {
    /// Create a grid. `nside` must be a power of two in `[1, MAX_NSIDE]`.
    pub fn new(nside: u32) -> Result<Self> {
        if nside == 0 || !nside.is_power_of_two() {
            return Err(IonModelError::configuration(format!(
                "nside must be a power of two, got {}",
                nside
            )));
        }
        if nside > MAX_NSIDE {
            return Err(IonModelError::configuration(format!(
                "nside {} exceeds the maximum of {}",
                nside, MAX_NSIDE
            )));
        }
        Ok(Self { nside })
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    /// Total number of pixels, `12·nside²`.
    pub fn npix(&self) -> u64 {
        12 * (self.nside as u64) * (self.nside as u64)
    }

    /// Square root of the pixel solid angle in degrees.
    pub fn resolution_deg(&self) -> f64 {
        (4.0 * PI / self.npix() as f64).sqrt().to_degrees()
    }

    /// Largest distance between any pixel center and its boundary, in degrees.
    pub fn max_pixel_radius_deg(&self) -> f64 {
        let n = self.nside as f64;
        let va = unit_vector(2.0 / 3.0, PI / (4.0 * n));
        let t1 = (1.0 - 1.0 / n).powi(2);
        let vb = unit_vector(1.0 - t1 / 3.0, 0.0);
        vector_angle(va, vb).to_degrees()
    }

    /// Pixel containing the geographic point.
    ///
    /// Latitude is clamped to [-90, 90]; any finite longitude is accepted.
    pub fn resolve(&self, lat: f64, lon: f64) -> u64 {
        let z = lat.clamp(-90.0, 90.0).to_radians().sin();
        self.ang2pix(z, lon.to_radians())
    }

    /// Pixel containing a [`GeoPoint`].
    pub fn resolve_point(&self, point: &GeoPoint) -> u64 {
        self.resolve(point.lat, point.lon)
    }

    /// Center of a pixel, longitude in (-180, 180].
    pub fn center(&self, pix: u64) -> GeoPoint {
        let (z, phi) = self.pix2ang(pix.min(self.npix() - 1));
        GeoPoint::new(z.clamp(-1.0, 1.0).asin().to_degrees(), phi.to_degrees()).normalized()
    }

    /// Pixels whose area may intersect the disc of `radius_deg` around `center`.
    ///
    /// Inclusive: a pixel is kept when its center lies within
    /// `radius + max_pixel_radius`. `None`, non-positive or >= 180° radii
    /// select the whole sphere. Returned indices are ascending.
    pub fn query_disc(&self, center: &GeoPoint, radius_deg: Option<f64>) -> Vec<u64> {
        let radius = match radius_deg {
            Some(r) if r > 0.0 && r < 180.0 => r,
            _ => return (0..self.npix()).collect(),
        };
        let reach = radius + self.max_pixel_radius_deg();
        let center_colat = 90.0 - center.lat.clamp(-90.0, 90.0);

        let mut pixels = Vec::new();
        for ring in 1..4 * self.nside as u64 {
            let (first, count, z) = self.ring_info(ring);
            let ring_colat = z.clamp(-1.0, 1.0).acos().to_degrees();
            if (ring_colat - center_colat).abs() > reach {
                continue;
            }
            for pix in first..first + count {
                if self.center(pix).angular_distance_deg(center) <= reach {
                    pixels.push(pix);
                }
            }
        }
        pixels
    }

    /// The four pixels around a point and their bilinear weights.
    ///
    /// Pixels come in pairs from the rings above and below the point; each
    /// pair is weighted by longitude, the rings by colatitude. Above the
    /// first ring (or below the last) the four polar pixels stand in for the
    /// missing ring. Weights are non-negative and sum to one.
    pub fn interpolation_weights(&self, lat: f64, lon: f64) -> [(u64, f64); 4] {
        let last_ring = 4 * self.nside as u64;
        let theta = (90.0 - lat.clamp(-90.0, 90.0)).to_radians();
        let phi = lon.to_radians().rem_euclid(TAU);
        let above = self.ring_above(theta.cos());
        let below = above + 1;

        let mut pix = [0u64; 4];
        let mut wgt = [0.0f64; 4];
        let (mut theta1, mut theta2) = (0.0, PI);
        if above > 0 {
            let (t, p, w) = self.ring_neighbours(above, phi);
            theta1 = t;
            pix[..2].copy_from_slice(&p);
            wgt[..2].copy_from_slice(&w);
        }
        if below < last_ring {
            let (t, p, w) = self.ring_neighbours(below, phi);
            theta2 = t;
            pix[2..].copy_from_slice(&p);
            wgt[2..].copy_from_slice(&w);
        }

        if above == 0 {
            let wtheta = (theta / theta2).clamp(0.0, 1.0);
            let fac = (1.0 - wtheta) * 0.25;
            wgt = [fac, fac, wgt[2] * wtheta + fac, wgt[3] * wtheta + fac];
            pix[0] = (pix[2] + 2) & 3;
            pix[1] = (pix[3] + 2) & 3;
        } else if below == last_ring {
            let wtheta = ((theta - theta1) / (PI - theta1)).clamp(0.0, 1.0);
            let fac = wtheta * 0.25;
            wgt = [wgt[0] * (1.0 - wtheta) + fac, wgt[1] * (1.0 - wtheta) + fac, fac, fac];
            pix[2] = ((pix[0] + 2) & 3) + self.npix() - 4;
            pix[3] = ((pix[1] + 2) & 3) + self.npix() - 4;
        } else {
            let wtheta = ((theta - theta1) / (theta2 - theta1)).clamp(0.0, 1.0);
            wgt[0] *= 1.0 - wtheta;
            wgt[1] *= 1.0 - wtheta;
            wgt[2] *= wtheta;
            wgt[3] *= wtheta;
        }

        [(pix[0], wgt[0]), (pix[1], wgt[1]), (pix[2], wgt[2]), (pix[3], wgt[3])]
    }

    /// Index of the ring just north of `z` (0 above the first ring).
    fn ring_above(&self, z: f64) -> u64 {
        let n = self.nside as f64;
        let za = z.abs();
        if za <= 2.0 / 3.0 {
            return (n * (2.0 - 1.5 * z)) as u64;
        }
        let ring = (n * (3.0 * (1.0 - za)).sqrt()) as u64;
        if z > 0.0 {
            ring
        } else {
            4 * self.nside as u64 - ring - 1
        }
    }

    /// Colatitude of a ring and the two pixels of it bracketing `phi`,
    /// with their longitude weights.
    fn ring_neighbours(&self, ring: u64, phi: f64) -> (f64, [u64; 2], [f64; 2]) {
        let (start, count, theta, shifted) = self.ring_geometry(ring);
        let dphi = TAU / count as f64;
        let shift = if shifted { 0.5 } else { 0.0 };
        let i1 = (phi / dphi - shift).floor() as i64;
        let w1 = ((phi - (i1 as f64 + shift) * dphi) / dphi).clamp(0.0, 1.0);
        let count = count as i64;
        let p1 = start + i1.rem_euclid(count) as u64;
        let p2 = start + (i1 + 1).rem_euclid(count) as u64;
        (theta, [p1, p2], [1.0 - w1, w1])
    }

    /// First pixel, pixel count, colatitude and half-pixel shift of a ring.
    fn ring_geometry(&self, ring: u64) -> (u64, u64, f64, bool) {
        let n = self.nside as u64;
        let npix = self.npix();
        let fact2 = 4.0 / npix as f64;
        let north = if ring > 2 * n { 4 * n - ring } else { ring };

        let (mut start, count, mut theta, shifted) = if north < n {
            let tmp = (north * north) as f64 * fact2;
            let theta = (tmp * (2.0 - tmp)).sqrt().atan2(1.0 - tmp);
            (2 * north * (north - 1), 4 * north, theta, true)
        } else {
            let fact1 = 2.0 * n as f64 * fact2;
            let theta = ((2 * n - north) as f64 * fact1).clamp(-1.0, 1.0).acos();
            (self.ncap() as u64 + (north - n) * 4 * n, 4 * n, theta, (north - n) % 2 == 0)
        };
        if north != ring {
            theta = PI - theta;
            start = npix - start - count;
        }
        (start, count, theta, shifted)
    }

    fn ncap(&self) -> i64 {
        let n = self.nside as i64;
        2 * n * (n - 1)
    }

    /// First pixel, pixel count and `z = cos(colatitude)` of a ring (1-based).
    fn ring_info(&self, ring: u64) -> (u64, u64, f64) {
        let n = self.nside as u64;
        let fact2 = 4.0 / self.npix() as f64;
        if ring < n {
            (2 * ring * (ring - 1), 4 * ring, 1.0 - (ring * ring) as f64 * fact2)
        } else if ring <= 3 * n {
            let fact1 = 2.0 * n as f64 * fact2;
            (
                self.ncap() as u64 + (ring - n) * 4 * n,
                4 * n,
                (2 * n) as f64 * fact1 - ring as f64 * fact1,
            )
        } else {
            let south = 4 * n - ring;
            (
                self.npix() - 2 * south * (south + 1),
                4 * south,
                -1.0 + (south * south) as f64 * fact2,
            )
        }
    }

    fn ang2pix(&self, z: f64, phi: f64) -> u64 {
        let n = self.nside as i64;
        let npix = self.npix() as i64;
        let za = z.abs();
        let tt = phi.rem_euclid(TAU) * FRAC_2_PI;

        let pix = if za <= 2.0 / 3.0 {
            let nl4 = 4 * n;
            let temp1 = n as f64 * (0.5 + tt);
            let temp2 = n as f64 * z * 0.75;
            let jp = (temp1 - temp2) as i64;
            let jm = (temp1 + temp2) as i64;
            let ir = n + 1 + jp - jm;
            let kshift = 1 - (ir & 1);
            let ip = ((jp + jm - n + kshift + 1) / 2).rem_euclid(nl4);
            self.ncap() + (ir - 1) * nl4 + ip
        } else {
            let tp = tt - tt.floor();
            let tmp = n as f64 * (3.0 * (1.0 - za)).sqrt();
            let jp = (tp * tmp) as i64;
            let jm = ((1.0 - tp) * tmp) as i64;
            let ir = jp + jm + 1;
            let ip = ((tt * ir as f64) as i64).rem_euclid(4 * ir);
            if z > 0.0 {
                2 * ir * (ir - 1) + ip
            } else {
                npix - 2 * ir * (ir + 1) + ip
            }
        };
        pix.clamp(0, npix - 1) as u64
    }

    fn pix2ang(&self, pix: u64) -> (f64, f64) {
        let n = self.nside as i64;
        let npix = self.npix() as i64;
        let ncap = self.ncap();
        let fact2 = 4.0 / npix as f64;
        let p = pix as i64;

        if p < ncap {
            let iring = (1 + isqrt(1 + 2 * p)) >> 1;
            let iphi = p + 1 - 2 * iring * (iring - 1);
            let z = 1.0 - (iring * iring) as f64 * fact2;
            let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
            (z, phi)
        } else if p < npix - ncap {
            let fact1 = 2.0 * n as f64 * fact2;
            let ip = p - ncap;
            let iring = ip / (4 * n) + n;
            let iphi = ip % (4 * n) + 1;
            let fodd = if (iring + n) & 1 == 1 { 1.0 } else { 0.5 };
            let z = (2 * n - iring) as f64 * fact1;
            let phi = (iphi as f64 - fodd) * PI / (2.0 * n as f64);
            (z, phi)
        } else {
            let ip = npix - p;
            let iring = (1 + isqrt(2 * ip - 1)) >> 1;
            let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
            let z = -1.0 + (iring * iring) as f64 * fact2;
            let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
            (z, phi)
        }
    }
}

impl TryFrom<u32> for SpatialGrid {
    type Error = IonModelError;

    fn try_from(nside: u32) -> Result<Self> {
        Self::new(nside)
    }
}

impl From<SpatialGrid> for u32 {
    fn from(grid: SpatialGrid) -> Self {
        grid.nside
    }
}

/// Integer square root, exact for the pixel index range.
fn isqrt(v: i64) -> i64 {
    let mut r = (v as f64).sqrt() as i64;
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

fn unit_vector(z: f64, phi: f64) -> [f64; 3] {
    let st = (1.0 - z * z).max(0.0).sqrt();
    [st * phi.cos(), st * phi.sin(), z]
}

fn vector_angle(a: [f64; 3], b: [f64; 3]) -> f64 {
    let cross = [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ];
    let sin = (cross[0].powi(2) + cross[1].powi(2) + cross[2].powi(2)).sqrt();
    let cos = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    sin.atan2(cos)
}
