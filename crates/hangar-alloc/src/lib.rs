// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Hangar-Alloc: exact, incremental craft-to-hangar assignment
//!
//! Given one base, the engine decides whether its craft (stationed, in
//! transit, being built) fit into its hangars under per-type compatibility,
//! places new craft, and writes back every placement that has become forced.
//! The problem is a bipartite matching over at most 16 craft slots and 16
//! hangar slots, so every relation fits in a `u16` mask.
//!
//! Core flow
//! - Build a `hangar_model::Ruleset` and a `hangar_model::base::Base`.
//! - Create an `allocation::HangarAllocation` over the base, optionally with a
//!   `registry::Skip` leaving one craft, transfer, production or facility out.
//! - Ask for placements (`add_craft`, `add_craft_transfer`, ...) or call
//!   `assign_all` to commit forced pairings.
//!
//! Design highlights
//! - Minimal disruption: craft keep their current facility whenever any
//!   assignment allows it; only then is every default restored.
//! - Exact: a Hall-style reducer splits the craft into independent groups
//!   and a canonical-order backtracking search matches each group.
//! - Deterministic: the same base and requests give the same placements.
//!
//! Module map
//! - `allocation`: the engine and its retry policy.
//! - `registry`: base objects to compact slot positions.
//! - `mask`: the compatibility relation with cached populations.
//! - `reduce`: saturated-group detection.
//! - `matcher`: systems of distinct representatives.
//! - `result`: allocation errors.
//! - `slot`: positions, bounds and craft sources.
//! - `stats`: lightweight counters.

pub mod allocation;
pub mod mask;
pub mod matcher;
pub mod reduce;
pub mod registry;
pub mod result;
pub mod slot;
pub mod stats;

use crate::{allocation::HangarAllocation, registry::Skip};
use hangar_model::{base::Base, index::FacilityIndex, rules::Ruleset};

/// Returns `true` if `facility` can be dismantled without leaving any craft
/// of `base` without a hangar.
///
/// Facilities that are not hangars can always be removed. The answer only
/// covers the craft that fit into the slot bounds.
pub fn can_remove_facility(rules: &Ruleset, base: &Base, facility: FacilityIndex) -> bool {
    HangarAllocation::new(rules, base, Skip::new().facility(facility)).is_feasible()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        allocation::AllocationPolicy,
        slot::{CraftPos, HangarPos, MAX_HANGAR_SLOTS},
    };
    use hangar_model::{
        base::{BaseBuilder, Craft, Production, Transfer},
        index::{CraftRuleIndex, FacilityRuleIndex},
        rules::{FacilityRule, RulesetBuilder},
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const NUM_CRAFT_TYPES: usize = 3;

    fn random_rules(rng: &mut ChaCha8Rng) -> Ruleset {
        let mut rb = RulesetBuilder::new();
        let crafts: Vec<CraftRuleIndex> = (0..NUM_CRAFT_TYPES)
            .map(|i| rb.add_craft_rule(format!("STR_CRAFT_{}", i)))
            .collect();
        for i in 0..4 {
            let capacity = rng.random_range(1..=3);
            let allowed: Vec<CraftRuleIndex> = crafts
                .iter()
                .copied()
                .filter(|_| rng.random_bool(0.6))
                .collect();
            rb.add_facility_rule(
                FacilityRule::hangar(format!("STR_HANGAR_{}", i), capacity).allowing(allowed),
            );
        }
        rb.add_facility_rule(FacilityRule::new("STR_LIVING_QUARTERS"));
        rb.build()
    }

    fn random_base(rng: &mut ChaCha8Rng, rules: &Ruleset) -> Base {
        let mut bb = BaseBuilder::new("Random");
        for _ in 0..rng.random_range(1..=5) {
            let rule = FacilityRuleIndex::new(rng.random_range(0..rules.num_facility_rules()));
            if rng.random_bool(0.1) {
                bb.add_facility_under_construction(rule, 10);
            } else {
                bb.add_facility(rule);
            }
        }
        for _ in 0..rng.random_range(0..=8) {
            let rule = CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES));
            match rng.random_range(0..3) {
                0 => {
                    bb.add_craft(Craft::new(rule));
                }
                1 => {
                    bb.add_transfer(Transfer::of_craft(Craft::new(rule)));
                }
                _ => {
                    bb.add_production(Production::of_craft(rule));
                }
            }
        }
        bb.build(rules).unwrap()
    }

    /// Kuhn's augmenting paths over the default relation.
    fn brute_force_feasible<B: std::borrow::Borrow<Base>>(alloc: &HangarAllocation<'_, B>) -> bool {
        fn augment(
            craft: usize,
            adjacency: &[Vec<usize>],
            seen: &mut [bool],
            owner: &mut [Option<usize>],
        ) -> bool {
            for &h in &adjacency[craft] {
                if seen[h] {
                    continue;
                }
                seen[h] = true;
                let current = owner[h];
                if current.is_none_or(|o| augment(o, adjacency, seen, owner)) {
                    owner[h] = Some(craft);
                    return true;
                }
            }
            false
        }

        let registry = alloc.registry();
        let adjacency: Vec<Vec<usize>> = registry
            .live_craft_positions()
            .map(|c| {
                registry
                    .hangar_positions()
                    .filter(|&h| registry.allows(alloc.rules(), alloc.base(), c, h))
                    .map(|h| h.get())
                    .collect()
            })
            .collect();

        let mut owner = vec![None; MAX_HANGAR_SLOTS];
        (0..adjacency.len()).all(|craft| {
            let mut seen = vec![false; MAX_HANGAR_SLOTS];
            augment(craft, &adjacency, &mut seen, &mut owner)
        })
    }

    fn assert_matching_is_valid<B: std::borrow::Borrow<Base>>(alloc: &HangarAllocation<'_, B>) {
        let registry = alloc.registry();
        let mut used: Vec<HangarPos> = Vec::new();
        for c in registry.live_craft_positions() {
            let h = alloc.matched_hangar(c).expect("live craft slot left unmatched");
            assert!(registry.allows(alloc.rules(), alloc.base(), c, h));
            assert!(!used.contains(&h), "{} matched twice", h);
            used.push(h);
        }
    }

    #[test]
    fn test_feasibility_agrees_with_augmenting_paths() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x4841_4e47);
        for _ in 0..300 {
            let rules = random_rules(&mut rng);
            let base = random_base(&mut rng, &rules);

            let mut alloc = HangarAllocation::new(&rules, &base, Skip::new());
            let expected = brute_force_feasible(&alloc);
            assert_eq!(alloc.is_feasible(), expected, "{}", base);
            assert!(alloc.mask().is_consistent());
            if expected {
                assert_matching_is_valid(&alloc);
            }
        }
    }

    #[test]
    fn test_random_requests_keep_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let rules = random_rules(&mut rng);
            let base = random_base(&mut rng, &rules);
            let mut alloc = HangarAllocation::new(&rules, &base, Skip::new());

            for _ in 0..12 {
                let rule = CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES));
                if rng.random_bool(0.2) {
                    alloc.remove_craft_type(rule);
                } else if alloc.add_craft_type(rule) {
                    assert_matching_is_valid(&alloc);
                }
                assert!(alloc.mask().is_consistent());
                assert!(alloc.num_craft_slots() <= alloc.registry().num_craft_slots());
            }
        }
    }

    #[test]
    fn test_free_placement_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..200 {
            let rules = random_rules(&mut rng);
            let base = random_base(&mut rng, &rules);
            let rule = CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES));

            // The same request expressed as one more production order.
            let mut extended = base.clone();
            extended.push_production(Production::of_craft(rule));
            let expected =
                brute_force_feasible(&HangarAllocation::new(&rules, &extended, Skip::new()));

            let mut alloc = HangarAllocation::new(&rules, &base, Skip::new())
                .with_policy(AllocationPolicy::FreeOnly);
            assert_eq!(alloc.add_craft_type(rule), expected, "{}", base);
        }
    }

    #[test]
    fn test_assign_all_never_overfills_a_facility() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for _ in 0..200 {
            let rules = random_rules(&mut rng);
            let mut base = random_base(&mut rng, &rules);

            let mut alloc = HangarAllocation::new(&rules, &mut base, Skip::new());
            alloc.assign_all();
            drop(alloc);

            for (i, facility) in base.facilities().iter().enumerate() {
                let capacity = if facility.is_built() {
                    rules.facility_rule(facility.rule()).crafts()
                } else {
                    0
                };
                assert!(base.hangar_occupancy(FacilityIndex::new(i)) <= capacity);
            }
        }
    }

    #[test]
    fn test_identical_inputs_give_identical_placements() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let rules = random_rules(&mut rng);
            let base = random_base(&mut rng, &rules);
            let requests: Vec<CraftRuleIndex> = (0..6)
                .map(|_| CraftRuleIndex::new(rng.random_range(0..NUM_CRAFT_TYPES)))
                .collect();

            let run = |base: &Base| {
                let mut alloc = HangarAllocation::new(&rules, base, Skip::new());
                requests
                    .iter()
                    .map(|&rule| alloc.try_add_craft_type(rule))
                    .collect::<Vec<_>>()
            };
            assert_eq!(run(&base), run(&base));
        }
    }

    #[test]
    fn test_can_remove_facility() {
        let mut rb = RulesetBuilder::new();
        let interceptor = rb.add_craft_rule("STR_INTERCEPTOR");
        let hangar = rb.add_facility_rule(FacilityRule::hangar("STR_HANGAR", 1));
        let lab = rb.add_facility_rule(FacilityRule::new("STR_LABORATORY"));
        let rules = rb.build();

        let mut bb = BaseBuilder::new("Dismantle");
        let h0 = bb.add_facility(hangar);
        let h1 = bb.add_facility(hangar);
        let l = bb.add_facility(lab);
        bb.add_craft(Craft::new(interceptor).with_hangar(h0));
        let mut base = bb.build(&rules).unwrap();

        assert!(can_remove_facility(&rules, &base, h0));
        assert!(can_remove_facility(&rules, &base, h1));

        base.push_craft(Craft::new(interceptor).with_hangar(h1));
        assert!(!can_remove_facility(&rules, &base, h0));
        assert!(!can_remove_facility(&rules, &base, h1));
        assert!(can_remove_facility(&rules, &base, l));

        let alloc = HangarAllocation::new(&rules, &base, Skip::new());
        assert_eq!(alloc.candidates(CraftPos::new(0)).len(), 2);
    }
}
