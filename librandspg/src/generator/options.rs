// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::Float;
use crate::Lattice;
use crate::Verbosity;

/// Everything [`init_crystal`](crate::init_crystal) needs for one generation
/// call.
///
/// [`SpgInitInput::new`] fills the optional knobs with their conventional
/// defaults: no volume window (`-1.0` disables a bound), IAD scaling 1.0, no
/// forced assignments, up to 100 whole-assignment attempts, and the most
/// general Wyckoff position forced into the cell so the result actually has
/// the requested space group rather than a supergroup.
#[derive(Debug, Clone)]
pub struct SpgInitInput {
    pub spg: usize,
    /// one atomic number per atom, so TiO2 is `[22, 8, 8]`
    pub atoms: Vec<usize>,
    pub lattice_mins: Lattice,
    pub lattice_maxes: Lattice,
    pub iad_scaling_factor: Float,
    pub min_radius: Float,
    pub manual_atomic_radii: Vec<(usize, Float)>,
    pub min_volume: Float,
    pub max_volume: Float,
    pub forced_wyck_assignments: Vec<(usize, char)>,
    pub verbosity: Verbosity,
    pub max_attempts: usize,
    pub force_most_general_wyck_pos: bool,
    pub log_file: Option<PathBuf>,
}

impl SpgInitInput {
    pub fn new(spg: usize, atoms: &[usize], mins: Lattice, maxes: Lattice) -> Self {
        SpgInitInput {
            spg,
            atoms: atoms.to_vec(),
            lattice_mins: mins,
            lattice_maxes: maxes,
            iad_scaling_factor: 1.0,
            min_radius: 0.0,
            manual_atomic_radii: Vec::new(),
            min_volume: -1.0,
            max_volume: -1.0,
            forced_wyck_assignments: Vec::new(),
            verbosity: Verbosity::Silent,
            max_attempts: 100,
            force_most_general_wyck_pos: true,
            log_file: None,
        }
    }
}
