// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

//! Random crystal structure generation constrained to a given space group.
//!
//! Given a composition (a list of atomic numbers) and windows for the six
//! lattice parameters, [`init_crystal`] produces a periodic unit cell that
//! belongs to the requested space group: its sites are unions of fully
//! populated Wyckoff orbits, every pair of atoms respects a minimum
//! interatomic distance derived from covalent radii, and the cell volume can
//! be constrained to a window. [`is_spg_possible`] answers the cheaper
//! question of whether a composition can be distributed over the group's
//! Wyckoff positions at all.

#[macro_use]
extern crate lazy_static;

mod combinatorics;
mod crystal;
mod elements;
mod error;
mod expr;
mod generator;
mod lattice;
mod log_ctx;
mod wyckoff;

pub use combinatorics::*;
pub use crystal::*;
pub use elements::*;
pub use error::*;
pub use expr::*;
pub use generator::*;
pub use lattice::*;
pub use log_ctx::*;
pub use wyckoff::*;

#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(not(feature = "f32"))]
pub type Float = f64;

/// Space group type for all 230 space groups.
pub const SPG_TYPES: [char; 230] = [
    'P', 'P', 'P', 'P', 'C', 'P', 'P', 'C', 'C', 'P', 'P', 'C', 'P', 'P', 'C', 'P', 'P', 'P', 'P',
    'C', 'C', 'F', 'I', 'I', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'C', 'C', 'C', 'A',
    'A', 'A', 'A', 'F', 'F', 'I', 'I', 'I', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P',
    'P', 'P', 'P', 'P', 'P', 'C', 'C', 'C', 'C', 'C', 'C', 'F', 'F', 'I', 'I', 'I', 'I', 'P', 'P',
    'P', 'P', 'I', 'I', 'P', 'I', 'P', 'P', 'P', 'P', 'I', 'I', 'P', 'P', 'P', 'P', 'P', 'P', 'P',
    'P', 'I', 'I', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'I', 'I', 'I', 'I', 'P', 'P', 'P', 'P',
    'P', 'P', 'P', 'P', 'I', 'I', 'I', 'I', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P',
    'P', 'P', 'P', 'P', 'P', 'I', 'I', 'I', 'I', 'P', 'P', 'P', 'R', 'P', 'R', 'P', 'P', 'P', 'P',
    'P', 'P', 'R', 'P', 'P', 'P', 'P', 'R', 'R', 'P', 'P', 'P', 'P', 'R', 'R', 'P', 'P', 'P', 'P',
    'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P', 'P',
    'P', 'P', 'P', 'P', 'P', 'F', 'I', 'P', 'I', 'P', 'P', 'F', 'F', 'I', 'P', 'I', 'P', 'P', 'F',
    'F', 'I', 'P', 'P', 'I', 'P', 'F', 'I', 'P', 'F', 'I', 'P', 'P', 'P', 'P', 'F', 'F', 'F', 'F',
    'I', 'I',
];

/// Wyckoff table for all 230 space groups.
const WYCKOFFS: &'static str = std::include_str!("external/wyckoffs.json");
lazy_static! {
    pub(crate) static ref WY: Vec<Vec<(char, usize, String)>> =
        serde_json::from_str(WYCKOFFS).unwrap();
}

/// Fill-cell coset representatives for all 230 space groups.
const FILL_CELL: &'static str = std::include_str!("external/fill_cell.json");
lazy_static! {
    pub(crate) static ref FILL: Vec<Vec<String>> = serde_json::from_str(FILL_CELL).unwrap();
}

// Covalent radius for element H (Z=1) to Cm (Z=96)
pub(crate) const COVALENT_RADIUS: &'static str =
    std::include_str!("external/covalent_radius.json");
