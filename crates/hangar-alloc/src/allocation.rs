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

//! The allocation engine.
//!
//! `HangarAllocation` is built over one base, answers a series of placement
//! requests, and is dropped afterwards. Each request runs the same pipeline:
//!
//! 1. Narrow the compatibility relation (sticky pass keeps craft where they
//!    are, free pass restores every default).
//! 2. Repeatedly ask the reducer for a saturated group among the craft slots
//!    not yet handled, and split off the craft slots whose candidates no
//!    longer touch the remaining work.
//! 3. Match each split-off group with the backtracking matcher.
//!
//! Placement requests (`add_*`) register a probe slot for the requested craft
//! type and keep it registered on success, so later requests on the same
//! engine see the space as taken. Probe slots are rolled back on failure.
//!
//! `assign_all` writes a facility back onto a craft, transfer or production
//! only when the pairing is forced: the craft slot has exactly one candidate
//! left and that hangar slot has exactly one claimant.

use crate::{
    mask::CompatibilityMask,
    matcher::{BacktrackingMatcher, Matching},
    reduce::{Reduction, reduce},
    registry::{Skip, SlotRegistry},
    result::AllocationError,
    slot::{CraftPos, CraftSource, HangarPos, MAX_CRAFT_SLOTS, UseMask},
    stats::AllocationStatistics,
};
use hangar_model::{
    base::{Base, Craft, Production, Transfer},
    index::{CraftRuleIndex, FacilityIndex},
    rules::Ruleset,
};
use smallvec::SmallVec;
use std::borrow::{Borrow, BorrowMut};
use tracing::{debug, instrument, trace, warn};

/// Which compatibility relation a placement request starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocationPolicy {
    /// Keep craft in the facility they already reference; if that leaves no
    /// assignment, retry with every default restored.
    #[default]
    StickyThenFree,
    /// Keep craft in the facility they already reference, or fail.
    StickyOnly,
    /// Ignore existing references.
    FreeOnly,
}

impl std::fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationPolicy::StickyThenFree => write!(f, "StickyThenFree"),
            AllocationPolicy::StickyOnly => write!(f, "StickyOnly"),
            AllocationPolicy::FreeOnly => write!(f, "FreeOnly"),
        }
    }
}

/// The facility a base object currently reserves, if any.
fn previous_hangar(base: &Base, source: CraftSource) -> Option<FacilityIndex> {
    match source {
        CraftSource::Probe => None,
        CraftSource::Craft(i) => base.craft(i).hangar(),
        CraftSource::Transfer(i) => base.transfer(i).hangar(),
        CraftSource::Production(i) => base.production(i).hangar(),
    }
}

/// Stable in-place partition: items satisfying `pred` first.
fn stable_partition<T, F>(items: &mut [T], mut pred: F) -> usize
where
    T: Copy,
    F: FnMut(T) -> bool,
{
    let mut buffer: SmallVec<[T; MAX_CRAFT_SLOTS]> = SmallVec::with_capacity(items.len());
    buffer.extend(items.iter().copied().filter(|&x| pred(x)));
    let split = buffer.len();
    buffer.extend(items.iter().copied().filter(|&x| !pred(x)));
    items.copy_from_slice(&buffer);
    split
}

/// Hangar allocation over one base.
///
/// `B` is how the base is held: `&Base` is enough for placement requests and
/// feasibility checks, `&mut Base` (or an owned `Base`) is required by
/// `assign_all`, which writes back-references.
///
/// ```rust
/// use hangar_alloc::{allocation::HangarAllocation, registry::Skip};
/// use hangar_model::base::BaseBuilder;
/// use hangar_model::rules::{FacilityRule, RulesetBuilder};
///
/// let mut rb = RulesetBuilder::new();
/// let interceptor = rb.add_craft_rule("STR_INTERCEPTOR");
/// let hangar = rb.add_facility_rule(FacilityRule::hangar("STR_HANGAR", 1));
/// let rules = rb.build();
///
/// let mut bb = BaseBuilder::new("Omega");
/// bb.add_facility(hangar);
/// let base = bb.build(&rules).unwrap();
///
/// let mut allocation = HangarAllocation::new(&rules, &base, Skip::new());
/// assert!(allocation.add_craft_type(interceptor));
/// assert!(!allocation.add_craft_type(interceptor));
/// ```
#[derive(Debug)]
pub struct HangarAllocation<'a, B> {
    rules: &'a Ruleset,
    base: B,
    registry: SlotRegistry,
    mask: CompatibilityMask,
    matcher: BacktrackingMatcher,
    matching: Matching,
    policy: AllocationPolicy,
    stats: AllocationStatistics,
}

impl<'a, B> HangarAllocation<'a, B>
where
    B: Borrow<Base>,
{
    /// Registers the base's craft and hangars, leaving out what `skip` names.
    pub fn new(rules: &'a Ruleset, base: B, skip: Skip) -> Self {
        let registry = SlotRegistry::from_base(rules, base.borrow(), &skip);

        let mut mask = CompatibilityMask::new();
        for c in registry.craft_positions() {
            for h in registry.hangar_positions() {
                mask.init_use(c, h, registry.allows(rules, base.borrow(), c, h));
            }
        }

        Self {
            rules,
            base,
            registry,
            mask,
            matcher: BacktrackingMatcher::new(),
            matching: Matching::new(),
            policy: AllocationPolicy::default(),
            stats: AllocationStatistics::default(),
        }
    }

    #[inline]
    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    #[inline]
    pub fn base(&self) -> &Base {
        self.base.borrow()
    }

    #[inline]
    pub fn rules(&self) -> &Ruleset {
        self.rules
    }

    #[inline]
    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    #[inline]
    pub fn mask(&self) -> &CompatibilityMask {
        &self.mask
    }

    #[inline]
    pub fn statistics(&self) -> &AllocationStatistics {
        &self.stats
    }

    /// Live craft slots, probes included.
    #[inline]
    pub fn num_craft_slots(&self) -> usize {
        self.registry.num_live_crafts()
    }

    #[inline]
    pub fn num_hangar_slots(&self) -> usize {
        self.registry.num_hangar_slots()
    }

    /// Current candidate hangar slots of `craft`.
    #[inline]
    pub fn candidates(&self, craft: CraftPos) -> UseMask {
        self.mask.candidates(craft)
    }

    /// Facility owning the hangar slot at `hangar`.
    #[inline]
    pub fn facility_of(&self, hangar: HangarPos) -> FacilityIndex {
        self.registry.hangar_slot(hangar).facility
    }

    /// Hangar slot picked for `craft` by the last successful solve.
    #[inline]
    pub fn matched_hangar(&self, craft: CraftPos) -> Option<HangarPos> {
        self.matching.get(craft)
    }

    /// Reserves a hangar for a craft of type `rule` that has no backing object.
    pub fn add_craft_type(&mut self, rule: CraftRuleIndex) -> bool {
        self.try_add_craft_type(rule).is_ok()
    }

    /// Reserves a hangar for a craft of type `rule` and returns its facility.
    #[instrument(skip_all, fields(rule = %rule))]
    pub fn try_add_craft_type(
        &mut self,
        rule: CraftRuleIndex,
    ) -> Result<FacilityIndex, AllocationError> {
        self.place(rule)
    }

    /// Places a craft joining the base and stores the facility on it.
    pub fn add_craft(&mut self, craft: &mut Craft) -> bool {
        self.try_add_craft(craft).is_ok()
    }

    #[instrument(skip_all, fields(rule = %craft.rule()))]
    pub fn try_add_craft(&mut self, craft: &mut Craft) -> Result<FacilityIndex, AllocationError> {
        let facility = self.place(craft.rule())?;
        craft.set_hangar(Some(facility));
        Ok(facility)
    }

    /// Places the craft carried by an incoming transfer.
    ///
    /// Transfers without a craft need no hangar and always succeed.
    pub fn add_craft_transfer(&mut self, transfer: &mut Transfer) -> bool {
        self.try_add_craft_transfer(transfer).is_ok()
    }

    /// Returns `Ok(None)` for a transfer that carries no craft.
    #[instrument(skip_all)]
    pub fn try_add_craft_transfer(
        &mut self,
        transfer: &mut Transfer,
    ) -> Result<Option<FacilityIndex>, AllocationError> {
        let Some(rule) = transfer.craft_rule() else {
            return Ok(None);
        };
        let facility = self.place(rule)?;
        transfer.set_hangar(Some(facility));
        Ok(Some(facility))
    }

    /// Places the craft a new production order will build.
    ///
    /// Orders that produce no craft need no hangar and always succeed.
    pub fn add_craft_production(&mut self, production: &mut Production) -> bool {
        self.try_add_craft_production(production).is_ok()
    }

    /// Returns `Ok(None)` for an order that produces no craft.
    #[instrument(skip_all)]
    pub fn try_add_craft_production(
        &mut self,
        production: &mut Production,
    ) -> Result<Option<FacilityIndex>, AllocationError> {
        let Some(rule) = production.produced_craft() else {
            return Ok(None);
        };
        let facility = self.place(rule)?;
        production.set_hangar(Some(facility));
        Ok(Some(facility))
    }

    /// Tombstones every craft slot of type `rule` and returns how many there were.
    #[instrument(skip_all, fields(rule = %rule))]
    pub fn remove_craft_type(&mut self, rule: CraftRuleIndex) -> usize {
        let mut removed = 0;
        for c in self.registry.craft_positions().rev() {
            if self.registry.craft_slot(c).rule == Some(rule) {
                self.release(c);
                removed += 1;
            }
        }
        debug!(removed, "removed craft type");
        removed
    }

    /// Returns `true` if every live craft slot can get its own compatible
    /// hangar slot when existing references are ignored.
    pub fn is_feasible(&mut self) -> bool {
        self.mask.reset_all(&self.registry);
        self.solve()
    }

    /// Registers a probe slot for `rule` and solves; rolls the probe back on failure.
    fn place(&mut self, rule: CraftRuleIndex) -> Result<FacilityIndex, AllocationError> {
        let saved_mask = self.mask.clone();
        let saved_matching = self.matching;
        let Some(probe) = self.registry.register_craft(rule, CraftSource::Probe) else {
            debug!("no free craft slot");
            return Err(AllocationError::CapacityExceeded);
        };
        self.init_craft(probe);

        if self.mask.craft_population(probe) == 0 {
            self.release(probe);
            debug!("no registered hangar accepts this craft type");
            return Err(AllocationError::NoCompatibleHangar);
        }

        if !self.solve_with_policy() {
            self.registry.release_craft(probe);
            self.mask = saved_mask;
            self.matching = saved_matching;
            debug!(%probe, "rolled back");
            return Err(AllocationError::Infeasible);
        }

        let Some(hangar) = self.matching.get(probe) else {
            unreachable!("successful solve left live craft slot {} unmatched", probe);
        };
        let facility = self.facility_of(hangar);
        debug!(%probe, %hangar, %facility, "placed");
        Ok(facility)
    }

    fn init_craft(&mut self, craft: CraftPos) {
        let base: &Base = self.base.borrow();
        for h in self.registry.hangar_positions() {
            let allowed = self.registry.allows(self.rules, base, craft, h);
            self.mask.init_use(craft, h, allowed);
        }
    }

    fn release(&mut self, craft: CraftPos) {
        self.registry.release_craft(craft);
        self.matching.set(craft, None);
        self.init_craft(craft);
    }

    fn solve_with_policy(&mut self) -> bool {
        match self.policy {
            AllocationPolicy::StickyThenFree => {
                if self.solve_sticky() {
                    return true;
                }
                self.stats.on_retry();
                debug!("sticky pass failed, retrying with maximum freedom");
                self.mask.reset_all(&self.registry);
                self.solve()
            }
            AllocationPolicy::StickyOnly => self.solve_sticky(),
            AllocationPolicy::FreeOnly => {
                self.mask.reset_all(&self.registry);
                self.solve()
            }
        }
    }

    fn solve_sticky(&mut self) -> bool {
        let base: &Base = self.base.borrow();
        self.mask
            .reset_all_by_previous_match(&self.registry, |source| previous_hangar(base, source));
        self.solve()
    }

    /// Reduce-and-match over every live craft slot.
    fn solve(&mut self) -> bool {
        self.stats.on_solve_attempt();
        self.matching.clear();

        let mut active: SmallVec<[CraftPos; MAX_CRAFT_SLOTS]> =
            self.registry.live_craft_positions().collect();
        let mut work = active
            .iter()
            .fold(UseMask::empty(), |acc, &c| acc | self.mask.candidates(c));

        let mut begin = 0;
        while begin < active.len() {
            match reduce(&mut self.mask, &mut active[begin..]) {
                Reduction::Infeasible => {
                    trace!(begin, "reducer proved infeasibility");
                    return false;
                }
                Reduction::Saturated(hangars) => {
                    self.stats.on_reduction();
                    work = work.difference(hangars);
                }
                Reduction::None => work = UseMask::empty(),
            }

            let mask = &self.mask;
            let split = begin
                + stable_partition(&mut active[begin..], |c| {
                    !mask.candidates(c).intersects(work)
                });
            if split == begin {
                unreachable!("reduction left no craft slot outside the remaining work {}", work);
            }

            let (done, rest) = active.split_at_mut(begin);
            let (group, pending) = rest.split_at_mut(split - begin);
            let others = done.iter().chain(pending.iter()).copied();
            if !self.matcher.solve(
                &mut self.mask,
                group,
                others,
                &mut self.matching,
                &mut self.stats,
            ) {
                return false;
            }
            begin = split;
        }

        true
    }
}

impl<'a, B> HangarAllocation<'a, B>
where
    B: BorrowMut<Base>,
{
    /// Solves the whole base and writes back every forced pairing.
    ///
    /// A craft, transfer or production gets a facility only if its craft slot
    /// has exactly one candidate left and nobody else claims that hangar slot.
    /// Returns the number of objects written. If no assignment exists at all,
    /// the pairings the last attempt still forced are written anyway.
    #[instrument(skip_all, fields(base = %self.base().name(), policy = %self.policy))]
    pub fn assign_all(&mut self) -> usize {
        if !self.solve_with_policy() {
            warn!(
                craft_slots = self.registry.num_live_crafts(),
                hangar_slots = self.registry.num_hangar_slots(),
                "no assignment exists; committing forced pairs only"
            );
        }

        let mut commits = 0;
        for c in self.registry.craft_positions() {
            let slot = *self.registry.craft_slot(c);
            if !slot.is_live() || self.mask.craft_population(c) != 1 {
                continue;
            }
            let Some(h) = self.mask.candidates(c).first().map(HangarPos::new) else {
                continue;
            };
            if self.mask.hangar_population(h) != 1 {
                continue;
            }

            let facility = Some(self.facility_of(h));
            let base: &mut Base = self.base.borrow_mut();
            match slot.source {
                CraftSource::Probe => continue,
                CraftSource::Craft(i) => base.craft_mut(i).set_hangar(facility),
                CraftSource::Transfer(i) => base.transfer_mut(i).set_hangar(facility),
                CraftSource::Production(i) => base.production_mut(i).set_hangar(facility),
            }

            self.stats.on_commit();
            commits += 1;
            debug!(source = %slot.source, hangar = %h, "committed");
        }

        debug!(commits, "assignment finished");
        commits
    }
}
