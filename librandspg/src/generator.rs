// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

mod options;

pub use self::options::*;

use rand::Rng;

use crate::combinatorics::{
    atom_assignments_string, get_num_of_each_type, get_random_atom_assignments,
    get_system_possibilities, get_system_possibilities_excluding,
    retain_possibilities_with_letter, system_possibilities_string,
};
use crate::crystal::{Atom, Crystal};
use crate::elements::RadiusTable;
use crate::error::CrystalGeneratorError;
use crate::lattice::generate_lattice_for_spg;
use crate::log_ctx::{LogCtx, LogSink};
use crate::wyckoff::{most_general_wyck_pos, wyck_pos_from_letter, wyckoff_positions, WyckPos};
use crate::Lattice;

/// Per-Wyckoff-position placement attempts before the whole assignment is
/// given up on.
const WYCKOFF_PLACEMENT_ATTEMPTS: usize = 1000;

fn spg_mults_are_all_even(spg: usize) -> bool {
    let table = wyckoff_positions(spg);
    !table.is_empty() && table.iter().all(|w| w.multiplicity() % 2 == 0)
}

/// Can this composition be distributed over the Wyckoff positions of `spg`
/// at all? Purely combinatoric: no lattice or distance checks.
pub fn is_spg_possible(spg: usize, atoms: &[usize]) -> bool {
    if spg < 1 || spg > 230 {
        return false;
    }
    // cheap reject: all multiplicities even but some species count is odd
    let contains_odd = get_num_of_each_type(atoms).iter().any(|(n, _)| n % 2 == 1);
    if contains_odd && spg_mults_are_all_even(spg) {
        return false;
    }
    !get_system_possibilities(spg, atoms, true, false).is_empty()
}

/// Try to place one Wyckoff atom with random free parameters and expand its
/// orbit. A unique position gets a single attempt: retrying a fixed point
/// would redo the exact same thing.
fn add_wyckoff_atom_randomly<R: Rng>(
    crystal: &mut Crystal,
    wp: &WyckPos,
    atomic_num: usize,
    spg: usize,
    radii: &RadiusTable,
    rng: &mut R,
    max_attempts: usize,
) -> bool {
    let attempts = if wp.unique() { 1 } else { max_attempts };
    for _ in 0..attempts {
        let (x, y, z) = (
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.0..1.0),
        );
        let site = wp.evaluate(x, y, z);
        if site.iter().any(|v| !v.is_finite()) {
            // malformed table entry; surfaces as a failed attempt
            return false;
        }
        let atom = Atom::new(atomic_num, site[0], site[1], site[2]);
        let before = crystal.num_atoms();
        crystal.add_atom(atom);
        if crystal.are_iads_okay(before, radii) && crystal.fill_cell_with_atom(spg, before, radii)
        {
            if crystal.num_atoms() == before + wp.multiplicity() {
                return true;
            }
            // the random draw landed on a special point and the orbit
            // collapsed; start over
            crystal.truncate_atoms(before);
            continue;
        }
        crystal.truncate_atoms(before);
    }
    false
}

struct ForcedAssignments {
    assignments: Vec<(WyckPos, usize)>,
    remaining_atoms: Vec<usize>,
    consumed_unique: Vec<char>,
}

fn resolve_forced_assignments(
    input: &SpgInitInput,
) -> Result<ForcedAssignments, CrystalGeneratorError> {
    let mut remaining = input.atoms.clone();
    let mut consumed_unique = Vec::new();
    let mut assignments = Vec::new();
    for &(z, letter) in input.forced_wyck_assignments.iter() {
        let wp = wyck_pos_from_letter(input.spg, letter).ok_or_else(|| {
            CrystalGeneratorError(format!(
                "forced Wyckoff letter '{}' does not exist in spacegroup {}",
                letter, input.spg
            ))
        })?;
        if wp.unique() {
            if consumed_unique.contains(&letter) {
                return Err(CrystalGeneratorError(format!(
                    "forced Wyckoff letter '{}' is unique but was requested twice",
                    letter
                )));
            }
            consumed_unique.push(letter);
        }
        for _ in 0..wp.multiplicity() {
            let i = remaining.iter().position(|&a| a == z).ok_or_else(|| {
                CrystalGeneratorError(format!(
                    "forced assignment {} -> '{}' needs more atoms of type {} than provided",
                    z, letter, z
                ))
            })?;
            remaining.swap_remove(i);
        }
        assignments.push((wp.clone(), z));
    }
    Ok(ForcedAssignments {
        assignments,
        remaining_atoms: remaining,
        consumed_unique,
    })
}

fn apply_volume_window<R: Rng>(lattice: Lattice, input: &SpgInitInput, rng: &mut R) -> Lattice {
    let vol = lattice.volume();
    let below = input.min_volume > 0.0 && vol < input.min_volume;
    let above = input.max_volume > 0.0 && vol > input.max_volume;
    if !below && !above {
        return lattice;
    }
    let target = if input.min_volume > 0.0
        && input.max_volume > 0.0
        && input.min_volume < input.max_volume
    {
        rng.gen_range(input.min_volume..=input.max_volume)
    } else if below {
        input.min_volume
    } else {
        input.max_volume
    };
    lattice.rescaled_to_volume(target)
}

/// Generate a crystal of the requested space group, or the zero-volume
/// sentinel when the configuration is unsatisfiable or every attempt failed.
/// One diagnostic line goes to stdout on failure; the audit trail goes to the
/// sink configured in `input`.
pub fn init_crystal<R: Rng>(input: &SpgInitInput, rng: &mut R) -> Crystal {
    let sink = match &input.log_file {
        Some(path) => LogSink::File(path.clone()),
        None => LogSink::Null,
    };
    let log = LogCtx::new(input.verbosity, sink);
    init_crystal_with_log(input, rng, &log)
}

/// [`init_crystal`] with an explicit audit sink (tests use an in-memory one).
pub fn init_crystal_with_log<R: Rng>(
    input: &SpgInitInput,
    rng: &mut R,
    log: &LogCtx,
) -> Crystal {
    let spg = input.spg;
    if spg < 1 || spg > 230 {
        println!("Error in init_crystal: {} is not a real spacegroup", spg);
        return Crystal::zero();
    }

    let mut radii = RadiusTable::new();
    radii.apply_scaling_factor(input.iad_scaling_factor);
    for &(z, r) in input.manual_atomic_radii.iter() {
        radii.set_radius(z, r);
    }
    if input.min_radius > 0.0 {
        radii.set_min_radius(input.min_radius);
    }
    for &z in input.atoms.iter() {
        if radii.radius(z).is_err() {
            println!(
                "Error in init_crystal: no radius is available for atomic number {}",
                z
            );
            return Crystal::zero();
        }
    }

    let lattice = generate_lattice_for_spg(spg, &input.lattice_mins, &input.lattice_maxes, rng);
    if !lattice.is_valid() {
        println!(
            "Error in init_crystal: an invalid lattice was generated for spacegroup {}",
            spg
        );
        return Crystal::zero();
    }
    let lattice = apply_volume_window(lattice, input, rng);

    let forced = match resolve_forced_assignments(input) {
        Ok(f) => f,
        Err(e) => {
            println!("Error in init_crystal: {}", e);
            return Crystal::zero();
        }
    };

    let mut possibilities = if forced.remaining_atoms.is_empty() {
        Vec::new()
    } else {
        get_system_possibilities_excluding(
            spg,
            &forced.remaining_atoms,
            false,
            false,
            &forced.consumed_unique,
        )
    };
    if possibilities.is_empty() && !forced.remaining_atoms.is_empty() {
        println!(
            "Error in init_crystal: spacegroup {} cannot be generated with this composition",
            spg
        );
        return Crystal::zero();
    }

    // guarantee the most general position so the cell cannot end up in a
    // supergroup of the request
    let mut force_letter = None;
    if input.force_most_general_wyck_pos {
        let general = match most_general_wyck_pos(spg) {
            Some(g) => g,
            None => return Crystal::zero(),
        };
        let already_forced = forced
            .assignments
            .iter()
            .any(|(wp, _)| wp.letter() == general.letter());
        if !already_forced {
            if forced.remaining_atoms.is_empty() {
                println!(
                    "Error in init_crystal: the most general Wyckoff position of spacegroup {} \
                     cannot be occupied by this configuration",
                    spg
                );
                return Crystal::zero();
            }
            possibilities = retain_possibilities_with_letter(possibilities, general.letter());
            if possibilities.is_empty() {
                println!(
                    "Error in init_crystal: the most general Wyckoff position of spacegroup {} \
                     cannot be occupied by this composition",
                    spg
                );
                return Crystal::zero();
            }
            force_letter = Some(general.letter());
        }
    }

    if log.verbose_enabled() {
        log.append(&system_possibilities_string(&possibilities));
    }

    for attempt in 0..input.max_attempts {
        let mut assignments = forced.assignments.clone();
        if !forced.remaining_atoms.is_empty() {
            let realized = get_random_atom_assignments(rng, &possibilities, force_letter);
            if realized.is_empty() {
                continue;
            }
            assignments.extend(realized);
        }
        if log.results_enabled() {
            log.append(&atom_assignments_string(&assignments));
        }

        let mut crystal = Crystal::new(lattice);
        let mut ok = true;
        for (wp, z) in assignments.iter() {
            if !add_wyckoff_atom_randomly(
                &mut crystal,
                wp,
                *z,
                spg,
                &radii,
                rng,
                WYCKOFF_PLACEMENT_ATTEMPTS,
            ) {
                ok = false;
                break;
            }
        }
        if ok {
            log.append("*** Success! ***\n");
            return crystal;
        }
        if log.results_enabled() {
            log.append(&format!(
                "Failed to add atoms while satisfying the minimum IADs.\n\
                 Obtaining new atom assignments and trying again. \
                 Failure count: {}\n\n",
                attempt + 1
            ));
        }
    }

    println!(
        "After {} attempts: failed to generate a crystal of spacegroup {}.",
        input.max_attempts, spg
    );
    Crystal::zero()
}
