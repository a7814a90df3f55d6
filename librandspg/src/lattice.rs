// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use log::warn;
use ndarray::{arr2, Array2};
use rand::Rng;

use crate::Float;

/// The six lattice parameters; angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub a: Float,
    pub b: Float,
    pub c: Float,
    pub alpha: Float,
    pub beta: Float,
    pub gamma: Float,
}

impl Default for Lattice {
    fn default() -> Self {
        Self::zero()
    }
}

impl Lattice {
    pub fn new(a: Float, b: Float, c: Float, alpha: Float, beta: Float, gamma: Float) -> Self {
        Lattice {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    /// The all-zero failure sentinel.
    pub fn zero() -> Self {
        Lattice::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// A lattice is usable iff every parameter is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.a > 0.0
            && self.b > 0.0
            && self.c > 0.0
            && self.alpha > 0.0
            && self.beta > 0.0
            && self.gamma > 0.0
    }

    /// Row-vector basis matrix (a along +x, b in the xy plane).
    pub fn to_matrix(&self) -> Array2<Float> {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let sg = self.gamma.to_radians().sin();
        let v = (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg)
            .max(0.0)
            .sqrt();
        arr2(&[
            [self.a, 0.0, 0.0],
            [self.b * cg, self.b * sg, 0.0],
            [self.c * cb, self.c * (ca - cb * cg) / sg, self.c * v / sg],
        ])
    }

    pub fn volume(&self) -> Float {
        if !self.is_valid() {
            return 0.0;
        }
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let v = (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg)
            .max(0.0)
            .sqrt();
        self.a * self.b * self.c * v
    }

    /// Isotropic rescale of (a, b, c) to hit a target volume; angles and any
    /// forced equalities survive.
    pub fn rescaled_to_volume(&self, target: Float) -> Lattice {
        let vol = self.volume();
        if vol <= 0.0 || target <= 0.0 {
            return *self;
        }
        let f = (target / vol).cbrt();
        Lattice::new(
            self.a * f,
            self.b * f,
            self.c * f,
            self.alpha,
            self.beta,
            self.gamma,
        )
    }
}

fn rand_in<R: Rng>(rng: &mut R, lo: Float, hi: Float) -> Float {
    if lo >= hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

fn angle_window_allows(lo: Float, hi: Float, required: Float) -> bool {
    lo <= required && required <= hi
}

/// Shared window of two parameters that are forced equal.
fn joint_window(lo1: Float, hi1: Float, lo2: Float, hi2: Float) -> Option<(Float, Float)> {
    let lo = lo1.max(lo2);
    let hi = hi1.min(hi2);
    if lo > hi {
        None
    } else {
        Some((lo, hi))
    }
}

/// Draw a lattice uniformly inside `[mins, maxes]` under the crystal-system
/// constraints of `spg`. Returns the zero sentinel when the constraints cannot
/// be met; the caller must treat that as a non-retryable configuration error.
pub fn generate_lattice_for_spg<R: Rng>(
    spg: usize,
    mins: &Lattice,
    maxes: &Lattice,
    rng: &mut R,
) -> Lattice {
    if spg < 1 || spg > 230 {
        warn!("generate_lattice_for_spg() was called for a non-real spacegroup: {}", spg);
        return Lattice::zero();
    }

    // Triclinic
    if spg <= 2 {
        return Lattice::new(
            rand_in(rng, mins.a, maxes.a),
            rand_in(rng, mins.b, maxes.b),
            rand_in(rng, mins.c, maxes.c),
            rand_in(rng, mins.alpha, maxes.alpha),
            rand_in(rng, mins.beta, maxes.beta),
            rand_in(rng, mins.gamma, maxes.gamma),
        );
    }

    // Monoclinic: alpha = gamma = 90, beta free
    if spg <= 15 {
        if !angle_window_allows(mins.alpha, maxes.alpha, 90.0)
            || !angle_window_allows(mins.gamma, maxes.gamma, 90.0)
        {
            warn!(
                "spacegroup {} constrains alpha and gamma to be 90 degrees, \
                 but the provided windows exclude that",
                spg
            );
            return Lattice::zero();
        }
        return Lattice::new(
            rand_in(rng, mins.a, maxes.a),
            rand_in(rng, mins.b, maxes.b),
            rand_in(rng, mins.c, maxes.c),
            90.0,
            rand_in(rng, mins.beta, maxes.beta),
            90.0,
        );
    }

    // Orthorhombic: all angles 90
    if spg <= 74 {
        for (lo, hi) in [
            (mins.alpha, maxes.alpha),
            (mins.beta, maxes.beta),
            (mins.gamma, maxes.gamma),
        ] {
            if !angle_window_allows(lo, hi, 90.0) {
                warn!(
                    "spacegroup {} constrains all angles to be 90 degrees, \
                     but the provided windows exclude that",
                    spg
                );
                return Lattice::zero();
            }
        }
        return Lattice::new(
            rand_in(rng, mins.a, maxes.a),
            rand_in(rng, mins.b, maxes.b),
            rand_in(rng, mins.c, maxes.c),
            90.0,
            90.0,
            90.0,
        );
    }

    // Tetragonal: all angles 90, a = b
    if spg <= 142 {
        for (lo, hi) in [
            (mins.alpha, maxes.alpha),
            (mins.beta, maxes.beta),
            (mins.gamma, maxes.gamma),
        ] {
            if !angle_window_allows(lo, hi, 90.0) {
                warn!(
                    "spacegroup {} constrains all angles to be 90 degrees, \
                     but the provided windows exclude that",
                    spg
                );
                return Lattice::zero();
            }
        }
        let ab = match joint_window(mins.a, maxes.a, mins.b, maxes.b) {
            Some(w) => w,
            None => {
                warn!(
                    "spacegroup {} constrains a and b to be equal, \
                     but the provided windows do not overlap",
                    spg
                );
                return Lattice::zero();
            }
        };
        let ab = rand_in(rng, ab.0, ab.1);
        return Lattice::new(ab, ab, rand_in(rng, mins.c, maxes.c), 90.0, 90.0, 90.0);
    }

    // Trigonal (hexagonal setting) and hexagonal: alpha = beta = 90,
    // gamma = 120, a = b
    if spg <= 194 {
        if !angle_window_allows(mins.alpha, maxes.alpha, 90.0)
            || !angle_window_allows(mins.beta, maxes.beta, 90.0)
        {
            warn!(
                "spacegroup {} constrains alpha and beta to be 90 degrees, \
                 but the provided windows exclude that",
                spg
            );
            return Lattice::zero();
        }
        if !angle_window_allows(mins.gamma, maxes.gamma, 120.0) {
            warn!(
                "spacegroup {} constrains gamma to be 120 degrees, \
                 but the provided window excludes that",
                spg
            );
            return Lattice::zero();
        }
        let ab = match joint_window(mins.a, maxes.a, mins.b, maxes.b) {
            Some(w) => w,
            None => {
                warn!(
                    "spacegroup {} constrains a and b to be equal, \
                     but the provided windows do not overlap",
                    spg
                );
                return Lattice::zero();
            }
        };
        let ab = rand_in(rng, ab.0, ab.1);
        return Lattice::new(ab, ab, rand_in(rng, mins.c, maxes.c), 90.0, 90.0, 120.0);
    }

    // Cubic: all angles 90, a = b = c
    for (lo, hi) in [
        (mins.alpha, maxes.alpha),
        (mins.beta, maxes.beta),
        (mins.gamma, maxes.gamma),
    ] {
        if !angle_window_allows(lo, hi, 90.0) {
            warn!(
                "spacegroup {} constrains all angles to be 90 degrees, \
                 but the provided windows exclude that",
                spg
            );
            return Lattice::zero();
        }
    }
    let lo = mins.a.max(mins.b).max(mins.c);
    let hi = maxes.a.min(maxes.b).min(maxes.c);
    if lo > hi {
        warn!(
            "spacegroup {} constrains a, b and c to be equal, \
             but the provided windows do not overlap",
            spg
        );
        return Lattice::zero();
    }
    let abc = rand_in(rng, lo, hi);
    Lattice::new(abc, abc, abc, 90.0, 90.0, 90.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn windows() -> (Lattice, Lattice) {
        (
            Lattice::new(3.0, 3.0, 3.0, 60.0, 60.0, 60.0),
            Lattice::new(10.0, 10.0, 10.0, 120.0, 120.0, 120.0),
        )
    }

    #[test]
    fn cubic_volume() {
        let l = Lattice::new(3.0, 3.0, 3.0, 90.0, 90.0, 90.0);
        assert!((l.volume() - 27.0).abs() < 1e-9);
        let m = l.to_matrix();
        assert!((m[[0, 0]] - 3.0).abs() < 1e-9);
        assert!(m[[2, 2]] > 0.0);
    }

    #[test]
    fn system_constraints_enforced() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mins, maxes) = windows();
        for (spg, check) in [
            (14, false),
            (62, false),
            (100, true),
            (150, true),
            (180, true),
            (200, true),
        ] {
            let l = generate_lattice_for_spg(spg, &mins, &maxes, &mut rng);
            assert!(l.is_valid());
            if check {
                assert_eq!(l.a, l.b);
            }
            if spg >= 143 && spg <= 194 {
                assert_eq!(l.gamma, 120.0);
            }
        }
        let cubic = generate_lattice_for_spg(225, &mins, &maxes, &mut rng);
        assert!(cubic.a == cubic.b && cubic.b == cubic.c);
        assert_eq!((cubic.alpha, cubic.beta, cubic.gamma), (90.0, 90.0, 90.0));
    }

    #[test]
    fn draws_stay_inside_windows() {
        let mut rng = StdRng::seed_from_u64(11);
        let (mins, maxes) = windows();
        for _ in 0..50 {
            let l = generate_lattice_for_spg(1, &mins, &maxes, &mut rng);
            for v in [l.a, l.b, l.c] {
                assert!((3.0..=10.0).contains(&v));
            }
            for v in [l.alpha, l.beta, l.gamma] {
                assert!((60.0..=120.0).contains(&v));
            }
        }
    }

    #[test]
    fn infeasible_windows_yield_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mins = Lattice::new(3.0, 3.0, 3.0, 91.0, 60.0, 60.0);
        let maxes = Lattice::new(10.0, 10.0, 10.0, 120.0, 120.0, 120.0);
        // monoclinic requires alpha = 90 but the window starts at 91
        assert!(!generate_lattice_for_spg(3, &mins, &maxes, &mut rng).is_valid());

        // disjoint a/b windows for a tetragonal group
        let mins = Lattice::new(3.0, 6.0, 3.0, 60.0, 60.0, 60.0);
        let maxes = Lattice::new(5.0, 10.0, 10.0, 120.0, 120.0, 120.0);
        assert!(!generate_lattice_for_spg(75, &mins, &maxes, &mut rng).is_valid());

        assert!(!generate_lattice_for_spg(0, &mins, &maxes, &mut rng).is_valid());
        assert!(!generate_lattice_for_spg(231, &mins, &maxes, &mut rng).is_valid());
    }

    #[test]
    fn rescale_preserves_shape() {
        let l = Lattice::new(2.0, 3.0, 4.0, 90.0, 90.0, 90.0);
        let r = l.rescaled_to_volume(48.0);
        assert!((r.volume() - 48.0).abs() < 1e-9);
        assert!((r.b / r.a - 1.5).abs() < 1e-9);
        assert_eq!(r.gamma, 90.0);
    }
}
