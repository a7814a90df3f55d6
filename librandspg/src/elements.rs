// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::Deserialize;

use crate::CrystalGeneratorError;
use crate::Float;
use crate::COVALENT_RADIUS;

/// Highest atomic number covered by the radius table (Cm).
pub const MAX_ATOMIC_NUM: usize = 96;

#[derive(Deserialize)]
struct RadiusFile {
    symbols: Vec<String>,
    radii: HashMap<String, Float>,
}

lazy_static! {
    static ref RADIUS: RadiusFile = serde_json::from_str(COVALENT_RADIUS).unwrap();
    static ref BASE_RADII: Vec<Float> = {
        // index 0 is a sentinel so the table is addressed by atomic number
        let mut v = vec![0.0];
        for sym in RADIUS.symbols.iter() {
            v.push(RADIUS.radii[sym]);
        }
        v
    };
}

pub fn element_symbol(atomic_num: usize) -> Option<&'static str> {
    if atomic_num < 1 || atomic_num > MAX_ATOMIC_NUM {
        return None;
    }
    Some(&RADIUS.symbols[atomic_num - 1])
}

/// Covalent radii used for the minimum interatomic-distance checks.
///
/// Each generation call owns its table: the caller-supplied scaling factor,
/// manual overrides and radius floor are applied to a copy, never to the
/// compiled-in data.
#[derive(Debug, Clone)]
pub struct RadiusTable {
    radii: Vec<Float>,
}

impl Default for RadiusTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RadiusTable {
    pub fn new() -> Self {
        RadiusTable {
            radii: BASE_RADII.clone(),
        }
    }

    pub fn radius(&self, atomic_num: usize) -> Result<Float, CrystalGeneratorError> {
        self.radii
            .get(atomic_num)
            .copied()
            .filter(|_| atomic_num >= 1)
            .ok_or_else(|| {
                CrystalGeneratorError(format!(
                    "no covalent radius for atomic number {}",
                    atomic_num
                ))
            })
    }

    pub fn apply_scaling_factor(&mut self, factor: Float) {
        for r in self.radii.iter_mut().skip(1) {
            *r *= factor;
        }
    }

    /// Manual override; exempt from any scaling applied earlier.
    pub fn set_radius(&mut self, atomic_num: usize, radius: Float) {
        if let Some(r) = self.radii.get_mut(atomic_num) {
            if atomic_num >= 1 {
                *r = radius;
            }
        }
    }

    /// Floor every radius at `min_radius`.
    pub fn set_min_radius(&mut self, min_radius: Float) {
        for r in self.radii.iter_mut().skip(1) {
            if *r < min_radius {
                *r = min_radius;
            }
        }
    }

    /// Smallest allowed distance between two species.
    pub fn min_iad(&self, z1: usize, z2: usize) -> Result<Float, CrystalGeneratorError> {
        Ok(self.radius(z1)? + self.radius(z2)?)
    }
}
