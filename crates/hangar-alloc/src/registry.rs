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

//! Mapping from base objects to compact slot positions.
//!
//! # Craft slots
//!
//! Stationed craft are registered first, then craft-producing orders, then
//! craft-carrying transfers, each in base order. Removing a craft slot leaves a
//! tombstone behind; the next registration reuses the highest tombstone below
//! the high-water mark before extending it.
//!
//! # Hangar slots
//!
//! Every finished hangar contributes one slot per unit of capacity. Slots are
//! handed out in layers: layer `k` gives one slot to each hangar whose
//! capacity exceeds `k`, smallest hangars first (ties keep base order). When the
//! bound truncates the expansion every hangar has still received a fair share.

use crate::slot::{
    CraftPos, CraftSlot, CraftSource, HangarPos, HangarSlot, MAX_CRAFT_SLOTS, MAX_HANGAR_SLOTS,
    UseMask,
};
use hangar_model::{
    base::Base,
    index::{CraftIndex, CraftRuleIndex, FacilityIndex, ProductionIndex, TransferIndex},
    rules::Ruleset,
};
use smallvec::SmallVec;
use tracing::debug;

/// Objects left out of the registration.
///
/// ```rust
/// use hangar_alloc::registry::Skip;
/// use hangar_model::index::{CraftIndex, FacilityIndex};
///
/// let skip = Skip::new().craft(CraftIndex::new(2)).facility(FacilityIndex::new(0));
/// assert_eq!(skip.skipped_facility(), Some(FacilityIndex::new(0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Skip {
    craft: Option<CraftIndex>,
    transfer: Option<TransferIndex>,
    production: Option<ProductionIndex>,
    facility: Option<FacilityIndex>,
}

impl Skip {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn craft(mut self, craft: CraftIndex) -> Self {
        self.craft = Some(craft);
        self
    }

    #[inline]
    pub fn transfer(mut self, transfer: TransferIndex) -> Self {
        self.transfer = Some(transfer);
        self
    }

    #[inline]
    pub fn production(mut self, production: ProductionIndex) -> Self {
        self.production = Some(production);
        self
    }

    #[inline]
    pub fn facility(mut self, facility: FacilityIndex) -> Self {
        self.facility = Some(facility);
        self
    }

    #[inline]
    pub fn skipped_craft(&self) -> Option<CraftIndex> {
        self.craft
    }

    #[inline]
    pub fn skipped_transfer(&self) -> Option<TransferIndex> {
        self.transfer
    }

    #[inline]
    pub fn skipped_production(&self) -> Option<ProductionIndex> {
        self.production
    }

    #[inline]
    pub fn skipped_facility(&self) -> Option<FacilityIndex> {
        self.facility
    }
}

/// Bounded registry of craft slots and hangar slots.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    crafts: SmallVec<[CraftSlot; MAX_CRAFT_SLOTS]>,
    live: usize,
    hangars: SmallVec<[HangarSlot; MAX_HANGAR_SLOTS]>,
}

impl SlotRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the craft-related objects and finished hangars of `base`.
    pub fn from_base(rules: &Ruleset, base: &Base, skip: &Skip) -> Self {
        let mut registry = Self::new();
        registry.register_base_crafts(base, skip);
        registry.register_base_hangars(rules, base, skip);

        debug!(
            craft_slots = registry.num_live_crafts(),
            hangar_slots = registry.num_hangar_slots(),
            "registered base {}",
            base.name()
        );
        registry
    }

    fn register_base_crafts(&mut self, base: &Base, skip: &Skip) {
        let crafts = base
            .crafts()
            .iter()
            .enumerate()
            .map(|(i, c)| (CraftIndex::new(i), c.rule()))
            .filter(|(i, _)| skip.craft != Some(*i))
            .map(|(i, rule)| (rule, CraftSource::Craft(i)));
        let productions = base
            .productions()
            .iter()
            .enumerate()
            .map(|(i, p)| (ProductionIndex::new(i), p.produced_craft()))
            .filter(|(i, _)| skip.production != Some(*i))
            .filter_map(|(i, rule)| rule.map(|r| (r, CraftSource::Production(i))));
        let transfers = base
            .transfers()
            .iter()
            .enumerate()
            .map(|(i, t)| (TransferIndex::new(i), t.craft_rule()))
            .filter(|(i, _)| skip.transfer != Some(*i))
            .filter_map(|(i, rule)| rule.map(|r| (r, CraftSource::Transfer(i))));

        for (rule, source) in crafts.chain(productions).chain(transfers) {
            if self.register_craft(rule, source).is_none() {
                debug!("craft slots exhausted, ignoring {} and the rest", source);
                return;
            }
        }
    }

    fn register_base_hangars(&mut self, rules: &Ruleset, base: &Base, skip: &Skip) {
        let mut hangars: SmallVec<[(FacilityIndex, usize); MAX_HANGAR_SLOTS]> = base
            .facilities()
            .iter()
            .enumerate()
            .map(|(i, f)| (FacilityIndex::new(i), f))
            .filter(|(i, f)| skip.facility != Some(*i) && f.is_built())
            .map(|(i, f)| (i, rules.facility_rule(f.rule()).crafts()))
            .filter(|(_, capacity)| *capacity > 0)
            .collect();
        // Stable: equal capacities keep base order.
        hangars.sort_by_key(|(_, capacity)| *capacity);

        for layer in 0..MAX_HANGAR_SLOTS {
            let first = hangars.partition_point(|(_, capacity)| *capacity <= layer);
            if first == hangars.len() {
                return;
            }
            for &(facility, _) in &hangars[first..] {
                if self.register_hangar(facility).is_none() {
                    debug!(%facility, layer, "hangar slots exhausted");
                    return;
                }
            }
        }
    }

    /// Registers a craft slot, reusing a tombstone when one exists.
    ///
    /// Returns `None` once `MAX_CRAFT_SLOTS` live slots exist.
    pub fn register_craft(
        &mut self,
        rule: CraftRuleIndex,
        source: CraftSource,
    ) -> Option<CraftPos> {
        let slot = CraftSlot::new(rule, source);

        if self.live != self.crafts.len() {
            let pos = self.crafts.iter().rposition(|s| !s.is_live())?;
            self.crafts[pos] = slot;
            self.live += 1;
            return Some(CraftPos::new(pos));
        }

        if self.crafts.len() < MAX_CRAFT_SLOTS {
            let pos = CraftPos::new(self.crafts.len());
            self.crafts.push(slot);
            self.live += 1;
            return Some(pos);
        }

        None
    }

    /// Turns a live craft slot into a tombstone and returns what it held.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    pub fn release_craft(&mut self, pos: CraftPos) -> CraftSlot {
        debug_assert!(
            pos.get() < self.crafts.len(),
            "called `SlotRegistry::release_craft` with craft position out of bounds: the len is {} but the index is {}",
            self.crafts.len(),
            pos.get()
        );

        let slot = std::mem::replace(&mut self.crafts[pos.get()], CraftSlot::TOMBSTONE);
        if slot.is_live() {
            self.live -= 1;
        }
        slot
    }

    /// Appends one unit of capacity of `facility`.
    ///
    /// Returns `None` once `MAX_HANGAR_SLOTS` slots exist.
    pub fn register_hangar(&mut self, facility: FacilityIndex) -> Option<HangarPos> {
        if self.hangars.len() >= MAX_HANGAR_SLOTS {
            return None;
        }
        let pos = HangarPos::new(self.hangars.len());
        self.hangars.push(HangarSlot { facility });
        Some(pos)
    }

    /// Number of craft positions in use, tombstones included.
    #[inline]
    pub fn num_craft_slots(&self) -> usize {
        self.crafts.len()
    }

    #[inline]
    pub fn num_live_crafts(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn num_hangar_slots(&self) -> usize {
        self.hangars.len()
    }

    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    pub fn craft_slot(&self, pos: CraftPos) -> &CraftSlot {
        debug_assert!(
            pos.get() < self.crafts.len(),
            "called `SlotRegistry::craft_slot` with craft position out of bounds: the len is {} but the index is {}",
            self.crafts.len(),
            pos.get()
        );

        &self.crafts[pos.get()]
    }

    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    pub fn hangar_slot(&self, pos: HangarPos) -> &HangarSlot {
        debug_assert!(
            pos.get() < self.hangars.len(),
            "called `SlotRegistry::hangar_slot` with hangar position out of bounds: the len is {} but the index is {}",
            self.hangars.len(),
            pos.get()
        );

        &self.hangars[pos.get()]
    }

    #[inline]
    pub fn craft_positions(
        &self,
    ) -> impl DoubleEndedIterator<Item = CraftPos> + ExactSizeIterator + use<> {
        CraftPos::range(self.crafts.len())
    }

    /// Craft positions that are not tombstones, ascending.
    pub fn live_craft_positions(&self) -> impl Iterator<Item = CraftPos> + '_ {
        self.craft_positions().filter(|&c| self.crafts[c.get()].is_live())
    }

    #[inline]
    pub fn hangar_positions(
        &self,
    ) -> impl DoubleEndedIterator<Item = HangarPos> + ExactSizeIterator + use<> {
        HangarPos::range(self.hangars.len())
    }

    /// All hangar slots carved out of `facility`.
    pub fn hangars_of(&self, facility: FacilityIndex) -> UseMask {
        self.hangar_positions()
            .filter(|h| self.hangars[h.get()].facility == facility)
            .map(|h| h.get())
            .collect()
    }

    /// Whether the craft in `craft` may park in `hangar` according to `rules`.
    ///
    /// Tombstones are compatible with nothing.
    pub fn allows(&self, rules: &Ruleset, base: &Base, craft: CraftPos, hangar: HangarPos) -> bool {
        let facility = base.facility(self.hangar_slot(hangar).facility);
        self.craft_slot(craft)
            .rule
            .is_some_and(|rule| rules.is_craft_allowed(facility.rule(), rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_model::{
        base::{BaseBuilder, Craft, Production, Transfer},
        index::FacilityRuleIndex,
        rules::{FacilityRule, RulesetBuilder},
    };

    fn rule(i: usize) -> CraftRuleIndex {
        CraftRuleIndex::new(i)
    }

    fn f(i: usize) -> FacilityIndex {
        FacilityIndex::new(i)
    }

    fn facilities_of(registry: &SlotRegistry) -> Vec<usize> {
        registry
            .hangar_positions()
            .map(|h| registry.hangar_slot(h).facility.get())
            .collect()
    }

    fn hangar_rules(capacities: &[usize]) -> (Ruleset, Vec<FacilityRuleIndex>) {
        let mut b = RulesetBuilder::new();
        b.add_craft_rule("STR_INTERCEPTOR");
        let ids = capacities
            .iter()
            .map(|&c| b.add_facility_rule(FacilityRule::hangar(format!("STR_HANGAR_{}", c), c)))
            .collect();
        (b.build(), ids)
    }

    #[test]
    fn test_craft_registration_extends_then_refuses() {
        let mut r = SlotRegistry::new();
        for i in 0..MAX_CRAFT_SLOTS {
            assert_eq!(r.register_craft(rule(0), CraftSource::Probe), Some(CraftPos::new(i)));
        }
        assert_eq!(r.register_craft(rule(0), CraftSource::Probe), None);
        assert_eq!(r.num_live_crafts(), MAX_CRAFT_SLOTS);
    }

    #[test]
    fn test_craft_registration_reuses_highest_tombstone() {
        let mut r = SlotRegistry::new();
        for _ in 0..5 {
            r.register_craft(rule(0), CraftSource::Probe);
        }
        r.release_craft(CraftPos::new(1));
        r.release_craft(CraftPos::new(3));
        assert_eq!(r.num_live_crafts(), 3);
        assert_eq!(r.num_craft_slots(), 5);

        assert_eq!(r.register_craft(rule(1), CraftSource::Probe), Some(CraftPos::new(3)));
        assert_eq!(r.register_craft(rule(1), CraftSource::Probe), Some(CraftPos::new(1)));
        assert_eq!(r.register_craft(rule(1), CraftSource::Probe), Some(CraftPos::new(5)));

        let live: Vec<usize> = r.live_craft_positions().map(|c| c.get()).collect();
        assert_eq!(live, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_hangar_layers_smallest_first() {
        // Capacities 3, 1, 2 in base order.
        let (rules, ids) = hangar_rules(&[3, 1, 2]);
        let mut bb = BaseBuilder::new("Layers");
        for &id in &ids {
            bb.add_facility(id);
        }
        let base = bb.build(&rules).unwrap();

        let r = SlotRegistry::from_base(&rules, &base, &Skip::new());
        assert_eq!(facilities_of(&r), vec![1, 2, 0, 2, 0, 0]);
        assert_eq!(r.hangars_of(f(0)), UseMask::from_iter([2, 4, 5]));
    }

    #[test]
    fn test_hangar_layers_keep_base_order_on_ties() {
        let (rules, ids) = hangar_rules(&[2]);
        let mut bb = BaseBuilder::new("Ties");
        for _ in 0..3 {
            bb.add_facility(ids[0]);
        }
        let base = bb.build(&rules).unwrap();

        let r = SlotRegistry::from_base(&rules, &base, &Skip::new());
        assert_eq!(facilities_of(&r), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_truncated_expansion_shares_fairly() {
        // 10 + 10 capacity, only 16 slots available.
        let (rules, ids) = hangar_rules(&[10]);
        let mut bb = BaseBuilder::new("Big");
        bb.add_facility(ids[0]);
        bb.add_facility(ids[0]);
        let base = bb.build(&rules).unwrap();

        let r = SlotRegistry::from_base(&rules, &base, &Skip::new());
        assert_eq!(r.num_hangar_slots(), MAX_HANGAR_SLOTS);
        assert_eq!(r.hangars_of(f(0)).len(), 8);
        assert_eq!(r.hangars_of(f(1)).len(), 8);
    }

    #[test]
    fn test_skip_and_unfinished_facilities_are_ignored() {
        let mut b = RulesetBuilder::new();
        let craft = b.add_craft_rule("STR_INTERCEPTOR");
        let hangar = b.add_facility_rule(FacilityRule::hangar("STR_HANGAR", 1));
        let lab = b.add_facility_rule(FacilityRule::new("STR_LABORATORY"));
        let rules = b.build();

        let mut bb = BaseBuilder::new("Skip");
        bb.add_facility(hangar);
        bb.add_facility_under_construction(hangar, 3);
        bb.add_facility(lab);
        bb.add_facility(hangar);
        bb.add_craft(Craft::new(craft));
        bb.add_craft(Craft::new(craft));
        bb.add_production(Production::new());
        bb.add_production(Production::of_craft(craft));
        bb.add_transfer(Transfer::of_craft(Craft::new(craft)));
        bb.add_transfer(Transfer::new());
        let base = bb.build(&rules).unwrap();

        let skip = Skip::new().craft(CraftIndex::new(0)).facility(f(0));
        let r = SlotRegistry::from_base(&rules, &base, &skip);

        assert_eq!(facilities_of(&r), vec![3]);
        let sources: Vec<CraftSource> = r
            .live_craft_positions()
            .map(|c| r.craft_slot(c).source)
            .collect();
        assert_eq!(
            sources,
            vec![
                CraftSource::Craft(CraftIndex::new(1)),
                CraftSource::Production(ProductionIndex::new(1)),
                CraftSource::Transfer(TransferIndex::new(0)),
            ]
        );
    }
}
