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

//! Craft-to-hangar compatibility with cached populations.
//!
//! `CompatibilityMask` keeps two views of the same bipartite relation: one
//! `UseMask` row per craft slot listing its candidate hangar slots, and one
//! column per hangar slot listing the craft slots that may use it. Every
//! mutation goes through `set_use`, which flips the bit in both views and
//! adjusts both population counters together.
//!
//! A third table holds the default relation computed from the ruleset. The
//! solver narrows the live relation while it works; `reset_use` and
//! `reset_all` restore it.

use crate::{
    registry::SlotRegistry,
    slot::{CraftPos, CraftSource, HangarPos, MAX_CRAFT_SLOTS, MAX_HANGAR_SLOTS, UseMask},
};
use hangar_model::index::FacilityIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityMask {
    craft_rows: [UseMask; MAX_CRAFT_SLOTS],
    hangar_columns: [UseMask; MAX_HANGAR_SLOTS],
    hangar_defaults: [UseMask; MAX_HANGAR_SLOTS],
    craft_populations: [u8; MAX_CRAFT_SLOTS],
    hangar_populations: [u8; MAX_HANGAR_SLOTS],
}

impl Default for CompatibilityMask {
    fn default() -> Self {
        Self::new()
    }
}

impl CompatibilityMask {
    /// An empty relation: nothing is compatible with anything.
    #[inline]
    pub fn new() -> Self {
        Self {
            craft_rows: [UseMask::empty(); MAX_CRAFT_SLOTS],
            hangar_columns: [UseMask::empty(); MAX_HANGAR_SLOTS],
            hangar_defaults: [UseMask::empty(); MAX_HANGAR_SLOTS],
            craft_populations: [0; MAX_CRAFT_SLOTS],
            hangar_populations: [0; MAX_HANGAR_SLOTS],
        }
    }

    #[inline(always)]
    fn check_bounds(method: &str, craft: CraftPos, hangar: HangarPos) {
        debug_assert!(
            craft.get() < MAX_CRAFT_SLOTS,
            "called `CompatibilityMask::{}` with craft position out of bounds: the len is {} but the index is {}",
            method,
            MAX_CRAFT_SLOTS,
            craft.get()
        );
        debug_assert!(
            hangar.get() < MAX_HANGAR_SLOTS,
            "called `CompatibilityMask::{}` with hangar position out of bounds: the len is {} but the index is {}",
            method,
            MAX_HANGAR_SLOTS,
            hangar.get()
        );
    }

    #[inline]
    pub fn get_use(&self, craft: CraftPos, hangar: HangarPos) -> bool {
        Self::check_bounds("get_use", craft, hangar);
        self.hangar_columns[hangar.get()].contains(craft.get())
    }

    /// Sets or clears one pair in both views.
    pub fn set_use(&mut self, craft: CraftPos, hangar: HangarPos, value: bool) {
        Self::check_bounds("set_use", craft, hangar);

        let (c, h) = (craft.get(), hangar.get());
        match (self.get_use(craft, hangar), value) {
            (false, true) => {
                self.craft_populations[c] += 1;
                self.hangar_populations[h] += 1;
                self.craft_rows[c].insert(h);
                self.hangar_columns[h].insert(c);
            }
            (true, false) => {
                self.craft_populations[c] -= 1;
                self.hangar_populations[h] -= 1;
                self.craft_rows[c].remove(h);
                self.hangar_columns[h].remove(c);
            }
            _ => {}
        }
    }

    /// Stores the default for one pair and applies it.
    pub fn init_use(&mut self, craft: CraftPos, hangar: HangarPos, allowed: bool) {
        Self::check_bounds("init_use", craft, hangar);
        self.hangar_defaults[hangar.get()].set(craft.get(), allowed);
        self.reset_use(craft, hangar);
    }

    #[inline]
    pub fn default_use(&self, craft: CraftPos, hangar: HangarPos) -> bool {
        Self::check_bounds("default_use", craft, hangar);
        self.hangar_defaults[hangar.get()].contains(craft.get())
    }

    /// Restores one pair to its default.
    #[inline]
    pub fn reset_use(&mut self, craft: CraftPos, hangar: HangarPos) {
        self.set_use(craft, hangar, self.default_use(craft, hangar));
    }

    /// Clears every pair of `craft` whose hangar is in `hangars`.
    pub fn exclude(&mut self, craft: CraftPos, hangars: UseMask) {
        for h in (self.craft_rows[craft.get()] & hangars).iter() {
            self.set_use(craft, HangarPos::new(h), false);
        }
    }

    /// Candidate hangar slots of `craft`.
    #[inline]
    pub fn candidates(&self, craft: CraftPos) -> UseMask {
        self.craft_rows[craft.get()]
    }

    /// Craft slots that may still use `hangar`.
    #[inline]
    pub fn claimants(&self, hangar: HangarPos) -> UseMask {
        self.hangar_columns[hangar.get()]
    }

    #[inline]
    pub fn craft_population(&self, craft: CraftPos) -> usize {
        self.craft_populations[craft.get()] as usize
    }

    #[inline]
    pub fn hangar_population(&self, hangar: HangarPos) -> usize {
        self.hangar_populations[hangar.get()] as usize
    }

    /// Restores every registered pair to its default: maximum freedom.
    pub fn reset_all(&mut self, registry: &SlotRegistry) {
        for c in registry.craft_positions() {
            for h in registry.hangar_positions() {
                self.reset_use(c, h);
            }
        }
    }

    /// Pins craft slots to the facility they already occupy.
    ///
    /// For every live craft slot whose `previous` facility owns at least one
    /// registered hangar slot, the hangar slots of every other facility are
    /// cleared. Slots of the same facility stay open. Never widens a row.
    pub fn reset_all_by_previous_match<F>(&mut self, registry: &SlotRegistry, mut previous: F)
    where
        F: FnMut(CraftSource) -> Option<FacilityIndex>,
    {
        let registered = UseMask::prefix(registry.num_hangar_slots());
        for c in registry.live_craft_positions() {
            let Some(facility) = previous(registry.craft_slot(c).source) else {
                continue;
            };
            let own = registry.hangars_of(facility);
            if own.is_empty() {
                continue;
            }
            self.exclude(c, registered.difference(own));
        }
    }

    /// Returns `true` if both views are transposes of each other and every
    /// cached population matches its bit count.
    pub fn is_consistent(&self) -> bool {
        for c in 0..MAX_CRAFT_SLOTS {
            if self.craft_rows[c].len() != self.craft_populations[c] as usize {
                return false;
            }
            for h in 0..MAX_HANGAR_SLOTS {
                if self.craft_rows[c].contains(h) != self.hangar_columns[h].contains(c) {
                    return false;
                }
            }
        }
        (0..MAX_HANGAR_SLOTS)
            .all(|h| self.hangar_columns[h].len() == self.hangar_populations[h] as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_model::index::{CraftIndex, CraftRuleIndex};

    fn c(i: usize) -> CraftPos {
        CraftPos::new(i)
    }

    fn h(i: usize) -> HangarPos {
        HangarPos::new(i)
    }

    #[test]
    fn test_set_use_updates_both_views() {
        let mut m = CompatibilityMask::new();
        m.set_use(c(2), h(5), true);
        m.set_use(c(2), h(5), true);
        m.set_use(c(3), h(5), true);

        assert!(m.get_use(c(2), h(5)));
        assert_eq!(m.candidates(c(2)), UseMask::single(5));
        assert_eq!(m.claimants(h(5)), UseMask::from_iter([2, 3]));
        assert_eq!(m.craft_population(c(2)), 1);
        assert_eq!(m.hangar_population(h(5)), 2);

        m.set_use(c(2), h(5), false);
        m.set_use(c(2), h(5), false);
        assert_eq!(m.hangar_population(h(5)), 1);
        assert!(m.is_consistent());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut m = CompatibilityMask::new();
        m.init_use(c(0), h(0), true);
        m.init_use(c(0), h(1), false);
        assert_eq!(m.candidates(c(0)), UseMask::single(0));

        m.set_use(c(0), h(0), false);
        m.set_use(c(0), h(1), true);
        m.reset_use(c(0), h(0));
        m.reset_use(c(0), h(1));
        assert_eq!(m.candidates(c(0)), UseMask::single(0));
        assert!(m.is_consistent());
    }

    #[test]
    fn test_reset_all_by_previous_match_keeps_same_facility_open() {
        let mut r = SlotRegistry::new();
        let a = r
            .register_craft(CraftRuleIndex::new(0), CraftSource::Craft(CraftIndex::new(0)))
            .unwrap();
        let probe = r.register_craft(CraftRuleIndex::new(0), CraftSource::Probe).unwrap();
        // Facility 0 has two slots, facility 1 has one.
        r.register_hangar(FacilityIndex::new(0));
        r.register_hangar(FacilityIndex::new(1));
        r.register_hangar(FacilityIndex::new(0));

        let mut m = CompatibilityMask::new();
        for craft in r.craft_positions() {
            for hangar in r.hangar_positions() {
                m.init_use(craft, hangar, true);
            }
        }

        m.reset_all_by_previous_match(&r, |source| match source {
            CraftSource::Craft(_) => Some(FacilityIndex::new(0)),
            _ => None,
        });
        assert_eq!(m.candidates(a), UseMask::from_iter([0, 2]));
        assert_eq!(m.candidates(probe), UseMask::from_iter([0, 1, 2]));

        // A previous facility without registered slots pins nothing.
        m.reset_all(&r);
        m.reset_all_by_previous_match(&r, |_| Some(FacilityIndex::new(7)));
        assert_eq!(m.candidates(a), UseMask::prefix(3));
        assert!(m.is_consistent());
    }

    #[test]
    fn test_previous_match_never_widens() {
        let mut r = SlotRegistry::new();
        let a = r
            .register_craft(CraftRuleIndex::new(0), CraftSource::Craft(CraftIndex::new(0)))
            .unwrap();
        r.register_hangar(FacilityIndex::new(0));
        r.register_hangar(FacilityIndex::new(0));

        let mut m = CompatibilityMask::new();
        m.init_use(a, h(0), true);
        m.init_use(a, h(1), true);
        m.set_use(a, h(0), false);

        m.reset_all_by_previous_match(&r, |_| Some(FacilityIndex::new(0)));
        assert_eq!(m.candidates(a), UseMask::single(1));
    }
}
