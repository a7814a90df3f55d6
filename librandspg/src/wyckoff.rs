// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use log::warn;

use crate::expr::{parse_coords, Component};
use crate::Float;
use crate::{FILL, SPG_TYPES, WY};

/// One Wyckoff position of a space group: a letter, the orbit size within the
/// conventional cell, and the coordinate triplet of the representative site.
#[derive(Debug, Clone, PartialEq)]
pub struct WyckPos {
    letter: char,
    multiplicity: usize,
    coords: [Component; 3],
    raw: String,
    unique: bool,
}

impl WyckPos {
    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn coords_str(&self) -> &str {
        &self.raw
    }

    /// A unique position pins a single point of the cell: none of its three
    /// coordinates mention x, y or z. It can hold at most one atom.
    pub fn unique(&self) -> bool {
        self.unique
    }

    /// Instantiate the representative site for the free parameters (x, y, z).
    pub fn evaluate(&self, x: Float, y: Float, z: Float) -> [Float; 3] {
        [
            self.coords[0].evaluate(x, y, z),
            self.coords[1].evaluate(x, y, z),
            self.coords[2].evaluate(x, y, z),
        ]
    }
}

/// Centering duplications plus coset representatives used to expand one site
/// into its full orbit.
#[derive(Debug, Clone)]
pub struct FillInfo {
    pub duplications: Vec<[Float; 3]>,
    pub positions: Vec<[Component; 3]>,
}

fn duplications_for(centering: char) -> Option<Vec<[Float; 3]>> {
    let mut dups = vec![[0.0, 0.0, 0.0]];
    match centering {
        'P' => {}
        'A' => dups.push([0.0, 0.5, 0.5]),
        'C' => dups.push([0.5, 0.5, 0.0]),
        'I' => dups.push([0.5, 0.5, 0.5]),
        'F' => {
            dups.push([0.0, 0.5, 0.5]);
            dups.push([0.5, 0.0, 0.5]);
            dups.push([0.5, 0.5, 0.0]);
        }
        'R' => {
            // hexagonal (obverse) setting
            dups.push([2.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
            dups.push([1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0]);
        }
        _ => return None,
    }
    Some(dups)
}

lazy_static! {
    static ref WYCKOFF_TABLES: Vec<Vec<WyckPos>> = WY
        .iter()
        .map(|table| {
            table
                .iter()
                .map(|(letter, multiplicity, coords)| {
                    let parsed =
                        parse_coords(coords).expect("embedded wyckoff table is malformed");
                    let unique = !parsed.iter().any(|c| c.mentions_variable());
                    WyckPos {
                        letter: *letter,
                        multiplicity: *multiplicity,
                        coords: parsed,
                        raw: coords.clone(),
                        unique,
                    }
                })
                .collect()
        })
        .collect();
    static ref FILL_TABLES: Vec<FillInfo> = FILL
        .iter()
        .enumerate()
        .map(|(spg, positions)| FillInfo {
            duplications: if spg == 0 {
                Vec::new()
            } else {
                duplications_for(SPG_TYPES[spg - 1])
                    .expect("embedded centering-type table is malformed")
            },
            positions: positions
                .iter()
                .map(|p| parse_coords(p).expect("embedded fill-cell table is malformed"))
                .collect(),
        })
        .collect();
}

/// Ordered Wyckoff table of a space group; the most general position is last.
/// An out-of-range `spg` yields the empty sentinel entry.
pub fn wyckoff_positions(spg: usize) -> &'static [WyckPos] {
    if spg < 1 || spg > 230 {
        warn!(
            "wyckoff_positions() was called for a spacegroup that does not exist: {}",
            spg
        );
        return &WYCKOFF_TABLES[0];
    }
    &WYCKOFF_TABLES[spg]
}

/// Centering duplications and coset representatives of a space group.
pub fn fill_cell_info(spg: usize) -> &'static FillInfo {
    if spg < 1 || spg > 230 {
        warn!(
            "fill_cell_info() was called for a spacegroup that does not exist: {}",
            spg
        );
        return &FILL_TABLES[0];
    }
    &FILL_TABLES[spg]
}

pub fn wyck_pos_from_letter(spg: usize, letter: char) -> Option<&'static WyckPos> {
    wyckoff_positions(spg).iter().find(|w| w.letter == letter)
}

/// The most general position (the last table entry).
pub fn most_general_wyck_pos(spg: usize) -> Option<&'static WyckPos> {
    wyckoff_positions(spg).last()
}
