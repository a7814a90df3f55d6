// Copyright 2024 TsumiNa.
// SPDX-License-Identifier: Apache-2.0

//! Distribution of a composition across the Wyckoff positions of a space
//! group.
//!
//! The solver works on groups of "similar" positions (same multiplicity, same
//! uniqueness) instead of individual letters: handing N atoms to k
//! indistinguishable letters reduces to choosing how many of the k letters to
//! consume. A species-at-a-time depth-first search enumerates the single-atom
//! possibilities, which are then crossed into system possibilities under the
//! cross-species uniqueness budget.

use rand::Rng;

use crate::wyckoff::{wyckoff_positions, WyckPos};

/// Count per species, most abundant first (ties: larger atomic number first).
pub fn get_num_of_each_type(atoms: &[usize]) -> Vec<(usize, usize)> {
    let mut counted: Vec<usize> = Vec::new();
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &z in atoms {
        if counted.contains(&z) {
            continue;
        }
        counted.push(z);
        let n = atoms.iter().filter(|&&a| a == z).count();
        out.push((n, z));
    }
    out.sort_by(|a, b| b.cmp(a));
    out
}

/// "Pick `num_to_choose` letters out of `choosable`"; for a unique group the
/// letters must be distinct, otherwise a letter may be reused with fresh free
/// parameters.
#[derive(Debug, Clone)]
pub struct SimilarWyckPick {
    pub num_to_choose: usize,
    pub choosable: Vec<WyckPos>,
}

impl SimilarWyckPick {
    pub fn unique(&self) -> bool {
        self.choosable.first().map_or(false, |w| w.unique())
    }

    fn letters(&self) -> Vec<char> {
        self.choosable.iter().map(|w| w.letter()).collect()
    }
}

/// A complete distribution of one species.
#[derive(Debug, Clone)]
pub struct SingleAtomPossibility {
    pub atomic_num: usize,
    pub picks: Vec<SimilarWyckPick>,
}

/// One distribution per species.
pub type SystemPossibility = Vec<SingleAtomPossibility>;

#[derive(Debug, Clone)]
struct TrackInfo {
    positions: Vec<WyckPos>,
    num_times_used: usize,
    keep_using: bool,
    unique: bool,
    multiplicity: usize,
}

#[derive(Debug, Clone, Copy)]
struct CombinationSettings {
    num_atoms: usize,
    find_only_one: bool,
    find_only_non_unique: bool,
}

fn wyck_positions_are_similar(a: &WyckPos, b: &WyckPos) -> bool {
    a.unique() == b.unique() && a.multiplicity() == b.multiplicity()
}

fn group_similar_wyck_positions(table: &[WyckPos]) -> Vec<Vec<WyckPos>> {
    let mut used: Vec<char> = Vec::new();
    let mut out = Vec::new();
    for (i, wp) in table.iter().enumerate() {
        if used.contains(&wp.letter()) {
            continue;
        }
        used.push(wp.letter());
        let mut group = vec![wp.clone()];
        for other in table[i + 1..].iter() {
            if wyck_positions_are_similar(wp, other) && !used.contains(&other.letter()) {
                used.push(other.letter());
                group.push(other.clone());
            }
        }
        out.push(group);
    }
    out
}

fn create_usage_tracker(table: &[WyckPos], excluded: &[char]) -> Vec<TrackInfo> {
    group_similar_wyck_positions(table)
        .into_iter()
        .filter_map(|mut group| {
            group.retain(|w| !excluded.contains(&w.letter()));
            if group.is_empty() {
                return None;
            }
            Some(TrackInfo {
                unique: group[0].unique(),
                multiplicity: group[0].multiplicity(),
                positions: group,
                num_times_used: 0,
                keep_using: true,
            })
        })
        .collect()
}

fn num_atoms_used(tracker: &[TrackInfo]) -> usize {
    tracker
        .iter()
        .map(|t| t.multiplicity * t.num_times_used)
        .sum()
}

fn num_atoms_left(tracker: &[TrackInfo], num_atoms: usize) -> usize {
    num_atoms - num_atoms_used(tracker)
}

fn first_available_index(tracker: &[TrackInfo]) -> Option<usize> {
    tracker.iter().position(|t| t.keep_using)
}

fn position_is_usable(info: &TrackInfo, left: usize, find_only_non_unique: bool) -> bool {
    if find_only_non_unique && info.unique {
        return false;
    }
    info.multiplicity <= left
        && info.keep_using
        && (!info.unique || info.num_times_used < info.positions.len())
}

fn convert_to_possibility(tracker: &[TrackInfo], atomic_num: usize) -> SingleAtomPossibility {
    SingleAtomPossibility {
        atomic_num,
        picks: tracker
            .iter()
            .filter(|t| t.num_times_used > 0)
            .map(|t| SimilarWyckPick {
                num_to_choose: t.num_times_used,
                choosable: t.positions.clone(),
            })
            .collect(),
    }
}

/// Depth-first search over the usage tracker. With `find_only_one` set the
/// first full possibility short-circuits out through the return value.
fn find_all_combinations(
    append: &mut Vec<SingleAtomPossibility>,
    mut tracker: Vec<TrackInfo>,
    atomic_num: usize,
    sets: &CombinationSettings,
) -> Option<SingleAtomPossibility> {
    if sets.num_atoms == 0 {
        return None;
    }
    let left = num_atoms_left(&tracker, sets.num_atoms);
    let idx = first_available_index(&tracker)?;

    if position_is_usable(&tracker[idx], left, sets.find_only_non_unique) {
        let mut tmp = tracker.clone();
        tmp[idx].num_times_used += 1;
        if num_atoms_left(&tmp, sets.num_atoms) == 0 {
            let poss = convert_to_possibility(&tmp, atomic_num);
            if sets.find_only_one {
                return Some(poss);
            }
            append.push(poss);
        } else if let Some(p) = find_all_combinations(append, tmp, atomic_num, sets) {
            return Some(p);
        }
    }

    // and everything that never touches this group again
    tracker[idx].keep_using = false;
    find_all_combinations(append, tracker, atomic_num, sets)
}

/// Prefer a combination that spends no unique positions; only the last
/// species (or an explicit override) may consume them, and the full search is
/// the fallback when the restricted one comes up empty.
fn find_only_one_combination_if_possible(
    append: &mut Vec<SingleAtomPossibility>,
    tracker: &[TrackInfo],
    atomic_num: usize,
    sets: &CombinationSettings,
    final_atom: bool,
) {
    let mut tmp = *sets;
    tmp.find_only_one = true;
    tmp.find_only_non_unique = true;
    if sets.find_only_non_unique {
        // the caller's restriction stands
    } else if final_atom {
        tmp.find_only_non_unique = false;
    }
    if let Some(p) = find_all_combinations(append, tracker.to_vec(), atomic_num, &tmp) {
        append.clear();
        append.push(p);
        return;
    }
    if append.is_empty() {
        tmp.find_only_one = false;
        tmp.find_only_non_unique = sets.find_only_non_unique;
        find_all_combinations(append, tracker.to_vec(), atomic_num, &tmp);
    }
}

fn pick_is_unique(pick: &SimilarWyckPick) -> bool {
    pick.unique()
}

fn more_unique_positions_used_than_available(poss: &SingleAtomPossibility) -> bool {
    poss.picks
        .iter()
        .any(|p| pick_is_unique(p) && p.num_to_choose > p.choosable.len())
}

fn num_times_a_position_is_used(poss: &SingleAtomPossibility, letters: &[char]) -> usize {
    poss.picks
        .iter()
        .filter(|p| p.letters() == letters)
        .map(|p| p.num_to_choose)
        .sum()
}

/// Cross-species uniqueness budget: no unique similar-group may be consumed
/// more times in total than it has letters.
fn too_many_of_a_unique_position_used(sys: &SystemPossibility) -> bool {
    for (i, sap) in sys.iter().enumerate() {
        if more_unique_positions_used_than_available(sap) {
            return true;
        }
        for pick in sap.picks.iter().filter(|p| pick_is_unique(p)) {
            let letters = pick.letters();
            let mut used = pick.num_to_choose;
            for other in sys[i + 1..].iter() {
                used += num_times_a_position_is_used(other, &letters);
            }
            if used > pick.choosable.len() {
                return true;
            }
        }
    }
    false
}

fn join_single_with_system(
    single: &[SingleAtomPossibility],
    system: Vec<SystemPossibility>,
) -> Vec<SystemPossibility> {
    if system.is_empty() {
        return single.iter().map(|s| vec![s.clone()]).collect();
    }
    let mut out = Vec::new();
    for sys in system.iter() {
        for sap in single.iter() {
            let mut candidate = sys.clone();
            candidate.push(sap.clone());
            if !too_many_of_a_unique_position_used(&candidate) {
                out.push(candidate);
            }
        }
    }
    out
}

/// Every way (or with `find_only_one`, some way) to distribute `atoms` over
/// the Wyckoff positions of `spg`. Empty when the composition cannot fit.
pub fn get_system_possibilities(
    spg: usize,
    atoms: &[usize],
    find_only_one: bool,
    find_only_non_unique: bool,
) -> Vec<SystemPossibility> {
    get_system_possibilities_excluding(spg, atoms, find_only_one, find_only_non_unique, &[])
}

/// Like [`get_system_possibilities`], with some letters withdrawn from the
/// table beforehand (unique positions already consumed by forced
/// assignments).
pub fn get_system_possibilities_excluding(
    spg: usize,
    atoms: &[usize],
    find_only_one: bool,
    find_only_non_unique: bool,
    excluded: &[char],
) -> Vec<SystemPossibility> {
    let table = wyckoff_positions(spg);
    if table.is_empty() {
        return Vec::new();
    }
    let num_of_each = get_num_of_each_type(atoms);
    let mut system: Vec<SystemPossibility> = Vec::new();

    for (i, &(num_atoms, atomic_num)) in num_of_each.iter().enumerate() {
        let tracker = create_usage_tracker(table, excluded);
        let sets = CombinationSettings {
            num_atoms,
            find_only_one,
            find_only_non_unique,
        };
        let mut single = Vec::new();
        if find_only_one {
            let last = i == num_of_each.len() - 1;
            find_only_one_combination_if_possible(&mut single, &tracker, atomic_num, &sets, last);
        } else {
            find_all_combinations(&mut single, tracker, atomic_num, &sets);
        }
        if single.is_empty() {
            return Vec::new();
        }
        system = join_single_with_system(&single, system);
        if system.is_empty() {
            return Vec::new();
        }
    }
    system
}

/// Drop possibilities that can never produce `letter` (used to force the most
/// general position into the cell).
pub fn retain_possibilities_with_letter(
    possibilities: Vec<SystemPossibility>,
    letter: char,
) -> Vec<SystemPossibility> {
    possibilities
        .into_iter()
        .filter(|sys| {
            sys.iter().any(|sap| {
                sap.picks
                    .iter()
                    .any(|p| p.choosable.iter().any(|w| w.letter() == letter))
            })
        })
        .collect()
}

/// Once a unique letter is spent it must disappear from every remaining pick
/// (uniqueness is a whole-cell constraint, not per species).
fn remove_position_from_system_possibility(sys: &mut SystemPossibility, letter: char) {
    for sap in sys.iter_mut() {
        for pick in sap.picks.iter_mut() {
            pick.choosable.retain(|w| w.letter() != letter);
        }
    }
}

pub fn get_random_system_possibility<'a, R: Rng>(
    rng: &mut R,
    possibilities: &'a [SystemPossibility],
) -> &'a SystemPossibility {
    &possibilities[rng.gen_range(0..possibilities.len())]
}

/// Realize one randomly chosen possibility into a flat per-atom assignment.
///
/// When `force_letter` is set, the first pick able to produce that letter has
/// its first draw pinned to it, so the most general position is guaranteed
/// rather than merely likely.
pub fn get_random_atom_assignments<R: Rng>(
    rng: &mut R,
    possibilities: &[SystemPossibility],
    force_letter: Option<char>,
) -> Vec<(WyckPos, usize)> {
    let mut assignments = Vec::new();
    if possibilities.is_empty() {
        return assignments;
    }
    let mut sys = get_random_system_possibility(rng, possibilities).clone();
    let mut pending_force = force_letter;

    for i in 0..sys.len() {
        let atomic_num = sys[i].atomic_num;
        for j in 0..sys[i].picks.len() {
            let mut atoms_left = sys[i].picks[j].num_to_choose;
            while atoms_left > 0 {
                let (wp, unique) = {
                    let choosable = &sys[i].picks[j].choosable;
                    if choosable.is_empty() {
                        return Vec::new();
                    }
                    let idx = match pending_force {
                        Some(letter) => {
                            match choosable.iter().position(|w| w.letter() == letter) {
                                Some(k) => {
                                    pending_force = None;
                                    k
                                }
                                None => rng.gen_range(0..choosable.len()),
                            }
                        }
                        None => rng.gen_range(0..choosable.len()),
                    };
                    (choosable[idx].clone(), choosable[idx].unique())
                };
                if Some(wp.letter()) == pending_force {
                    pending_force = None;
                }
                assignments.push((wp.clone(), atomic_num));
                atoms_left -= 1;
                if unique {
                    remove_position_from_system_possibility(&mut sys, wp.letter());
                }
            }
        }
    }
    assignments
}

pub fn similar_wyck_pick_string(pick: &SimilarWyckPick) -> String {
    let letters: String = pick
        .choosable
        .iter()
        .map(|w| format!("{} ", w.letter()))
        .collect();
    format!(
        "   numToChoose: {}, unique: {}, letters: {{ {}}}\n",
        pick.num_to_choose,
        pick.unique(),
        letters
    )
}

pub fn single_atom_possibility_string(poss: &SingleAtomPossibility) -> String {
    let mut s = format!("  atomicNum: {}\n", poss.atomic_num);
    for pick in poss.picks.iter() {
        s.push_str(&similar_wyck_pick_string(pick));
    }
    s
}

pub fn system_possibility_string(sys: &SystemPossibility) -> String {
    let mut s = String::from(" system possibility:\n");
    for sap in sys.iter() {
        s.push_str(&single_atom_possibility_string(sap));
    }
    s
}

pub fn system_possibilities_string(all: &[SystemPossibility]) -> String {
    let mut s = String::from("system possibilities:\n");
    for sys in all.iter() {
        s.push_str(&system_possibility_string(sys));
    }
    s
}

pub fn atom_assignments_string(assignments: &[(WyckPos, usize)]) -> String {
    let mut s = String::from("atom assignments (atomic num : wyckoff letter):\n");
    for (wp, z) in assignments.iter() {
        s.push_str(&format!("  {} : {}\n", z, wp.letter()));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn atoms_used(sap: &SingleAtomPossibility) -> usize {
        sap.picks
            .iter()
            .map(|p| p.num_to_choose * p.choosable[0].multiplicity())
            .sum()
    }

    #[test]
    fn counts_sort_most_abundant_first() {
        let n = get_num_of_each_type(&[8, 22, 8]);
        assert_eq!(n, vec![(2, 8), (1, 22)]);
    }

    #[test]
    fn atom_counts_are_conserved() {
        // Na4 Cl4 in Fm-3m
        let atoms = vec![11, 11, 11, 11, 17, 17, 17, 17];
        let poss = get_system_possibilities(225, &atoms, false, false);
        assert!(!poss.is_empty());
        for sys in poss.iter() {
            for sap in sys.iter() {
                assert_eq!(atoms_used(sap), 4);
            }
        }
    }

    #[test]
    fn uniqueness_budget_holds_across_species() {
        let atoms = vec![11, 11, 11, 11, 17, 17, 17, 17];
        for sys in get_system_possibilities(225, &atoms, false, false) {
            // collect total uses of every unique similar group
            for (i, sap) in sys.iter().enumerate() {
                for pick in sap.picks.iter().filter(|p| p.unique()) {
                    let letters: Vec<char> =
                        pick.choosable.iter().map(|w| w.letter()).collect();
                    let mut used = pick.num_to_choose;
                    for other in sys[i + 1..].iter() {
                        used += num_times_a_position_is_used(other, &letters);
                    }
                    assert!(used <= pick.choosable.len());
                }
            }
        }
    }

    #[test]
    fn impossible_compositions_are_rejected() {
        // P2_1/c only has even multiplicities
        assert!(get_system_possibilities(14, &[6], false, false).is_empty());
        assert!(get_system_possibilities(14, &[6], true, false).is_empty());
        // P-1 can hold a single atom on an inversion center
        assert!(!get_system_possibilities(2, &[6], true, false).is_empty());
        // out of range
        assert!(get_system_possibilities(0, &[6], false, false).is_empty());
    }

    #[test]
    fn general_position_reuse() {
        // two atoms in P1: the general position must be taken twice
        let poss = get_system_possibilities(1, &[1, 1], false, false);
        assert_eq!(poss.len(), 1);
        assert_eq!(poss[0][0].picks[0].num_to_choose, 2);
    }

    #[test]
    fn random_assignments_cover_the_composition() {
        let mut rng = StdRng::seed_from_u64(42);
        let atoms = vec![11, 11, 11, 11, 17, 17, 17, 17];
        let poss = get_system_possibilities(225, &atoms, false, false);
        for _ in 0..20 {
            let assignments = get_random_atom_assignments(&mut rng, &poss, None);
            let total: usize = assignments.iter().map(|(wp, _)| wp.multiplicity()).sum();
            assert_eq!(total, 8);

            // a unique letter may appear at most once in the whole cell
            let mut unique_letters: Vec<char> = assignments
                .iter()
                .filter(|(wp, _)| wp.unique())
                .map(|(wp, _)| wp.letter())
                .collect();
            let before = unique_letters.len();
            unique_letters.sort_unstable();
            unique_letters.dedup();
            assert_eq!(before, unique_letters.len());
        }
    }

    #[test]
    fn forced_letter_is_realized() {
        let mut rng = StdRng::seed_from_u64(9);
        // one atom in P-1 can sit on 1a..1h or 2i cannot hold one atom;
        // forcing is exercised with the general letter of P1 instead
        let poss = get_system_possibilities(1, &[1], false, false);
        let assignments = get_random_atom_assignments(&mut rng, &poss, Some('a'));
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].0.letter(), 'a');
    }

    #[test]
    fn retain_filter_keeps_only_reachable_general() {
        let atoms = vec![6];
        let poss = get_system_possibilities(2, &atoms, false, false);
        // one atom can never reach the two-fold general position of P-1
        assert!(retain_possibilities_with_letter(poss, 'i').is_empty());
    }
}
