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

//! Exact search for a system of distinct representatives.
//!
//! The group is sorted by candidate population, then searched depth first in
//! canonical order: depth `i` takes the lowest unused candidate of craft `i`
//! strictly above whatever depth `i` held before. When a depth runs dry the
//! search backs up one level and tries that level's next candidate. The
//! canonical order means no assignment is visited twice, so the search is
//! bounded by the number of injective maps from the group to its candidates.

use crate::{
    mask::CompatibilityMask,
    slot::{CraftPos, HangarPos, MAX_CRAFT_SLOTS, UseMask},
    stats::AllocationStatistics,
};
use tracing::trace;

/// The hangar slot picked for each craft slot by the last successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Matching {
    hangars: [Option<HangarPos>; MAX_CRAFT_SLOTS],
}

impl Default for Matching {
    fn default() -> Self {
        Self::new()
    }
}

impl Matching {
    #[inline]
    pub fn new() -> Self {
        Self {
            hangars: [None; MAX_CRAFT_SLOTS],
        }
    }

    #[inline]
    pub fn get(&self, craft: CraftPos) -> Option<HangarPos> {
        self.hangars[craft.get()]
    }

    #[inline]
    pub fn set(&mut self, craft: CraftPos, hangar: Option<HangarPos>) {
        self.hangars[craft.get()] = hangar;
    }

    #[inline]
    pub fn clear(&mut self) {
        self.hangars = [None; MAX_CRAFT_SLOTS];
    }

    /// Every matched `(craft, hangar)` pair in craft order.
    pub fn pairs(&self) -> impl Iterator<Item = (CraftPos, HangarPos)> + '_ {
        self.hangars
            .iter()
            .enumerate()
            .filter_map(|(c, h)| h.map(|h| (CraftPos::new(c), h)))
    }
}

/// Depth-first matcher with reusable scratch space.
#[derive(Debug, Clone)]
pub struct BacktrackingMatcher {
    selected: [UseMask; MAX_CRAFT_SLOTS],
}

impl Default for BacktrackingMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BacktrackingMatcher {
    #[inline]
    pub fn new() -> Self {
        Self {
            selected: [UseMask::empty(); MAX_CRAFT_SLOTS],
        }
    }

    /// Gives every craft slot of `group` its own candidate hangar slot.
    ///
    /// On success the chosen slots are recorded in `matching` and excluded
    /// from every craft slot in `others`. On failure nothing is changed apart
    /// from the order of `group`.
    pub fn solve<I>(
        &mut self,
        mask: &mut CompatibilityMask,
        group: &mut [CraftPos],
        others: I,
        matching: &mut Matching,
        stats: &mut AllocationStatistics,
    ) -> bool
    where
        I: IntoIterator<Item = CraftPos>,
    {
        debug_assert!(
            group.len() <= MAX_CRAFT_SLOTS,
            "called `BacktrackingMatcher::solve` with group out of bounds: the len is {} but the group is {}",
            MAX_CRAFT_SLOTS,
            group.len()
        );

        let n = group.len();
        if n == 0 {
            return true;
        }

        group.sort_by_key(|&c| mask.craft_population(c));
        self.selected[..n].fill(UseMask::empty());

        let mut used = UseMask::empty();
        let mut depth = 0;
        loop {
            let craft = group[depth];
            used = used.difference(self.selected[depth]);
            let next = mask
                .candidates(craft)
                .difference(used)
                .intersection(self.selected[depth].above())
                .lowest();

            if !next.is_empty() {
                stats.on_node_explored();
                used |= next;
                self.selected[depth] = next;
                depth += 1;
                if depth == n {
                    break;
                }
            } else {
                self.selected[depth] = UseMask::empty();
                if depth == 0 {
                    trace!(size = n, "group has no distinct representatives");
                    return false;
                }
                stats.on_backtrack();
                depth -= 1;
            }
        }

        for (&craft, selected) in group.iter().zip(&self.selected[..n]) {
            matching.set(craft, selected.first().map(HangarPos::new));
        }
        for other in others {
            mask.exclude(other, used);
        }

        stats.on_group_solved();
        trace!(size = n, hangars = %used, "group matched");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: usize) -> CraftPos {
        CraftPos::new(i)
    }

    fn mask_of(rows: &[&[usize]]) -> CompatibilityMask {
        let mut m = CompatibilityMask::new();
        for (craft, row) in rows.iter().enumerate() {
            for &hangar in row.iter() {
                m.init_use(c(craft), HangarPos::new(hangar), true);
            }
        }
        m
    }

    fn assert_distinct_representatives(
        m: &CompatibilityMask,
        group: &[CraftPos],
        matching: &Matching,
    ) {
        let mut seen = UseMask::empty();
        for &craft in group {
            let hangar = matching.get(craft).expect("craft left unmatched");
            assert!(m.get_use(craft, hangar), "{} is not a candidate of {}", hangar, craft);
            assert!(!seen.contains(hangar.get()), "{} used twice", hangar);
            seen.insert(hangar.get());
        }
    }

    #[test]
    fn test_matches_scarce_crafts_first() {
        let mut m = mask_of(&[&[0, 1], &[0, 2], &[0]]);
        let mut group = [c(0), c(1), c(2)];
        let mut matching = Matching::new();
        let mut stats = AllocationStatistics::default();

        let mut matcher = BacktrackingMatcher::new();
        assert!(matcher.solve(&mut m, &mut group, std::iter::empty(), &mut matching, &mut stats));
        assert_distinct_representatives(&m, &group, &matching);
        assert_eq!(matching.get(c(2)), Some(HangarPos::new(0)));
        assert_eq!(stats.groups_solved, 1);
    }

    #[test]
    fn test_backtracks_through_earlier_depths() {
        // c0 -> 0, c1 -> 1 leaves c2 stranded; only c0 -> 2 works.
        let mut m = mask_of(&[&[0, 2], &[0, 1], &[0, 1]]);
        let mut group = [c(0), c(1), c(2)];
        let mut matching = Matching::new();
        let mut stats = AllocationStatistics::default();

        let mut matcher = BacktrackingMatcher::new();
        assert!(matcher.solve(&mut m, &mut group, std::iter::empty(), &mut matching, &mut stats));
        assert_distinct_representatives(&m, &group, &matching);
        assert_eq!(matching.get(c(0)), Some(HangarPos::new(2)));
        assert!(stats.backtracks >= 2);
    }

    #[test]
    fn test_fails_without_touching_the_mask() {
        let mut m = mask_of(&[&[0, 1], &[0, 1], &[1, 0], &[2]]);
        let before = m.clone();
        let mut group = [c(0), c(1), c(2)];
        let mut matching = Matching::new();
        let mut stats = AllocationStatistics::default();

        let mut matcher = BacktrackingMatcher::new();
        assert!(!matcher.solve(&mut m, &mut group, [c(3)], &mut matching, &mut stats));
        assert_eq!(m, before);
        assert_eq!(matching.pairs().count(), 0);
        assert!(stats.backtracks > 0);
    }

    #[test]
    fn test_excludes_chosen_hangars_from_others_only() {
        let mut m = mask_of(&[&[0, 1], &[0, 1], &[0, 1, 2]]);
        let mut group = [c(0), c(1)];
        let mut matching = Matching::new();
        let mut stats = AllocationStatistics::default();

        let mut matcher = BacktrackingMatcher::new();
        assert!(matcher.solve(&mut m, &mut group, [c(2)], &mut matching, &mut stats));
        assert_eq!(m.candidates(c(0)), UseMask::from_iter([0, 1]));
        assert_eq!(m.candidates(c(1)), UseMask::from_iter([0, 1]));
        assert_eq!(m.candidates(c(2)), UseMask::single(2));
        assert!(m.is_consistent());
    }

    #[test]
    fn test_empty_group_is_trivially_matched() {
        let mut m = CompatibilityMask::new();
        let mut matching = Matching::new();
        let mut stats = AllocationStatistics::default();
        let mut matcher = BacktrackingMatcher::new();
        assert!(matcher.solve(&mut m, &mut [], std::iter::empty(), &mut matching, &mut stats));
    }
}
