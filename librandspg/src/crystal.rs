// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use ndarray::Array2;

use crate::elements::{element_symbol, RadiusTable};
use crate::wyckoff::fill_cell_info;
use crate::Float;
use crate::Lattice;

/// Two fractional coordinates closer than this (after wrapping) are the same
/// orbit site.
const SAME_SITE_TOL: Float = 1e-6;

pub fn wrap_frac(v: Float) -> Float {
    let w = v.rem_euclid(1.0);
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// One atom of the cell, in fractional coordinates wrapped to [0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub atomic_num: usize,
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Atom {
    pub fn new(atomic_num: usize, x: Float, y: Float, z: Float) -> Self {
        Atom {
            atomic_num,
            x: wrap_frac(x),
            y: wrap_frac(y),
            z: wrap_frac(z),
        }
    }

    fn frac(&self) -> [Float; 3] {
        [self.x, self.y, self.z]
    }

    fn same_site(&self, other: &Atom) -> bool {
        self.frac().iter().zip(other.frac().iter()).all(|(a, b)| {
            let d = (a - b).abs();
            d < SAME_SITE_TOL || (1.0 - d) < SAME_SITE_TOL
        })
    }
}

/// A periodic unit cell under construction.
#[derive(Debug, Clone)]
pub struct Crystal {
    lattice: Lattice,
    basis: Array2<Float>,
    atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(lattice: Lattice) -> Self {
        let basis = lattice.to_matrix();
        Crystal {
            lattice,
            basis,
            atoms: Vec::new(),
        }
    }

    /// The zero-volume failure sentinel.
    pub fn zero() -> Self {
        Crystal {
            lattice: Lattice::zero(),
            basis: Array2::zeros((3, 3)),
            atoms: Vec::new(),
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn volume(&self) -> Float {
        self.lattice.volume()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    /// Remove the most recently added atom equal to `atom`.
    pub fn remove_atom(&mut self, atom: &Atom) -> bool {
        if let Some(i) = self
            .atoms
            .iter()
            .rposition(|a| a.atomic_num == atom.atomic_num && a.same_site(atom))
        {
            self.atoms.remove(i);
            true
        } else {
            false
        }
    }

    pub fn truncate_atoms(&mut self, len: usize) {
        self.atoms.truncate(len);
    }

    /// Minimum-image distance between two fractional positions.
    pub fn min_image_distance(&self, a: &Atom, b: &Atom) -> Float {
        let df = [
            wrap_frac(a.x - b.x),
            wrap_frac(a.y - b.y),
            wrap_frac(a.z - b.z),
        ];
        let mut best = Float::INFINITY;
        for ix in -1..=1 {
            for iy in -1..=1 {
                for iz in -1..=1 {
                    let f = [
                        df[0] + ix as Float,
                        df[1] + iy as Float,
                        df[2] + iz as Float,
                    ];
                    let mut d2 = 0.0;
                    for k in 0..3 {
                        let cart = f[0] * self.basis[[0, k]]
                            + f[1] * self.basis[[1, k]]
                            + f[2] * self.basis[[2, k]];
                        d2 += cart * cart;
                    }
                    if d2 < best {
                        best = d2;
                    }
                }
            }
        }
        best.sqrt()
    }

    /// Check the atom at `index` against every other atom in the cell.
    pub fn are_iads_okay(&self, index: usize, radii: &RadiusTable) -> bool {
        let atom = &self.atoms[index];
        for (i, other) in self.atoms.iter().enumerate() {
            if i == index {
                continue;
            }
            let min_dist = match radii.min_iad(atom.atomic_num, other.atomic_num) {
                Ok(d) => d,
                Err(_) => return false,
            };
            if self.min_image_distance(atom, other) < min_dist {
                return false;
            }
        }
        true
    }

    /// Expand the orbit of the atom at `index` with the fill-cell info of
    /// `spg`: every (duplication, coset representative) image is inserted
    /// unless an atom of the same species already claims that site, and each
    /// insertion re-checks the IAD constraints. On failure every site added
    /// here is removed again and the whole cell is restored.
    pub fn fill_cell_with_atom(&mut self, spg: usize, index: usize, radii: &RadiusTable) -> bool {
        let info = fill_cell_info(spg);
        if info.positions.is_empty() {
            return false;
        }
        let base = self.atoms[index];
        let len_before = self.atoms.len();
        for dup in info.duplications.iter() {
            for pos in info.positions.iter() {
                let site = Atom::new(
                    base.atomic_num,
                    dup[0] + pos[0].evaluate(base.x, base.y, base.z),
                    dup[1] + pos[1].evaluate(base.x, base.y, base.z),
                    dup[2] + pos[2].evaluate(base.x, base.y, base.z),
                );
                if self
                    .atoms
                    .iter()
                    .any(|a| a.atomic_num == site.atomic_num && a.same_site(&site))
                {
                    continue;
                }
                self.atoms.push(site);
                if !self.are_iads_okay(self.atoms.len() - 1, radii) {
                    self.atoms.truncate(len_before);
                    return false;
                }
            }
        }
        true
    }

    pub fn atom_info_string(&self) -> String {
        let mut s = String::from("Atom info (atomic num, fractional coords):\n");
        for a in self.atoms.iter() {
            let sym = element_symbol(a.atomic_num).unwrap_or("?");
            s.push_str(&format!(
                "  {:>3} ({:>2})  {:>9.5} {:>9.5} {:>9.5}\n",
                a.atomic_num, sym, a.x, a.y, a.z
            ));
        }
        s
    }

    pub fn print_atom_info(&self) {
        print!("{}", self.atom_info_string());
    }
}
