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

//! One base's craft-related state.
//!
//! A `Base` owns four arenas:
//!
//! - `crafts`: craft stationed at the base.
//! - `transfers`: shipments heading to the base, some of which carry a craft.
//! - `productions`: manufacturing orders, some of which produce a craft.
//! - `facilities`: buildings, some of which are hangars.
//!
//! Crafts, transfers and productions each carry a `hangar` back-reference: the
//! facility that has been set aside for them. The allocation engine reads these
//! references to keep existing placements stable and writes them when a
//! placement becomes forced. Nothing else in this crate interprets them beyond
//! the occupancy queries.

use crate::{
    error::BaseError,
    index::{
        CraftIndex, CraftRuleIndex, FacilityIndex, FacilityRuleIndex, ProductionIndex,
        TransferIndex,
    },
    rules::Ruleset,
};

/// A craft stationed at a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Craft {
    rule: CraftRuleIndex,
    hangar: Option<FacilityIndex>,
}

impl Craft {
    #[inline]
    pub fn new(rule: CraftRuleIndex) -> Self {
        Self { rule, hangar: None }
    }

    /// Returns the craft already parked in `hangar`.
    #[inline]
    pub fn with_hangar(mut self, hangar: FacilityIndex) -> Self {
        self.hangar = Some(hangar);
        self
    }

    #[inline]
    pub fn rule(&self) -> CraftRuleIndex {
        self.rule
    }

    #[inline]
    pub fn hangar(&self) -> Option<FacilityIndex> {
        self.hangar
    }

    #[inline]
    pub fn set_hangar(&mut self, hangar: Option<FacilityIndex>) {
        self.hangar = hangar;
    }
}

/// A shipment heading to a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transfer {
    craft: Option<Craft>,
    hangar: Option<FacilityIndex>,
}

impl Transfer {
    /// A shipment without a craft (personnel, items).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A shipment carrying `craft`.
    #[inline]
    pub fn of_craft(craft: Craft) -> Self {
        Self {
            craft: Some(craft),
            hangar: None,
        }
    }

    #[inline]
    pub fn with_hangar(mut self, hangar: FacilityIndex) -> Self {
        self.hangar = Some(hangar);
        self
    }

    #[inline]
    pub fn craft(&self) -> Option<&Craft> {
        self.craft.as_ref()
    }

    /// The type of the carried craft, if any.
    #[inline]
    pub fn craft_rule(&self) -> Option<CraftRuleIndex> {
        self.craft.map(|c| c.rule())
    }

    /// Unpacks the carried craft on arrival, handing over the reserved hangar.
    pub fn into_craft(self) -> Option<Craft> {
        self.craft.map(|mut craft| {
            craft.set_hangar(self.hangar);
            craft
        })
    }

    #[inline]
    pub fn hangar(&self) -> Option<FacilityIndex> {
        self.hangar
    }

    #[inline]
    pub fn set_hangar(&mut self, hangar: Option<FacilityIndex>) {
        self.hangar = hangar;
    }
}

/// A manufacturing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Production {
    produced_craft: Option<CraftRuleIndex>,
    hangar: Option<FacilityIndex>,
}

impl Production {
    /// An order that produces items only.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// An order that produces a craft of type `rule`.
    #[inline]
    pub fn of_craft(rule: CraftRuleIndex) -> Self {
        Self {
            produced_craft: Some(rule),
            hangar: None,
        }
    }

    #[inline]
    pub fn with_hangar(mut self, hangar: FacilityIndex) -> Self {
        self.hangar = Some(hangar);
        self
    }

    #[inline]
    pub fn produced_craft(&self) -> Option<CraftRuleIndex> {
        self.produced_craft
    }

    /// Completes the order, returning the finished craft in its reserved hangar.
    pub fn complete(self) -> Option<Craft> {
        self.produced_craft.map(|rule| Craft {
            rule,
            hangar: self.hangar,
        })
    }

    #[inline]
    pub fn hangar(&self) -> Option<FacilityIndex> {
        self.hangar
    }

    #[inline]
    pub fn set_hangar(&mut self, hangar: Option<FacilityIndex>) {
        self.hangar = hangar;
    }
}

/// A building inside a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Facility {
    rule: FacilityRuleIndex,
    build_time: u32,
}

impl Facility {
    /// A finished facility.
    #[inline]
    pub fn new(rule: FacilityRuleIndex) -> Self {
        Self {
            rule,
            build_time: 0,
        }
    }

    /// A facility that needs `days` more days of construction.
    #[inline]
    pub fn under_construction(rule: FacilityRuleIndex, days: u32) -> Self {
        Self {
            rule,
            build_time: days,
        }
    }

    #[inline]
    pub fn rule(&self) -> FacilityRuleIndex {
        self.rule
    }

    #[inline]
    pub fn build_time(&self) -> u32 {
        self.build_time
    }

    #[inline]
    pub fn set_build_time(&mut self, days: u32) {
        self.build_time = days;
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.build_time == 0
    }

    /// Advances construction by one day; returns `true` on the day it completes.
    pub fn advance_construction(&mut self) -> bool {
        if self.build_time == 0 {
            return false;
        }
        self.build_time -= 1;
        self.build_time == 0
    }
}

macro_rules! arena_accessors {
    ($field:ident, $ty:ty, $idx:ty, $num:ident, $get:ident, $get_mut:ident, $push:ident) => {
        #[inline]
        pub fn $field(&self) -> &[$ty] {
            &self.$field
        }

        #[inline]
        pub fn $num(&self) -> usize {
            self.$field.len()
        }

        /// # Panics
        ///
        /// Panics if the index is out of bounds.
        #[inline]
        pub fn $get(&self, index: $idx) -> &$ty {
            debug_assert!(
                index.get() < self.$field.len(),
                concat!(
                    "called `Base::",
                    stringify!($get),
                    "` with index out of bounds: the len is {} but the index is {}"
                ),
                self.$field.len(),
                index.get()
            );

            &self.$field[index.get()]
        }

        /// # Panics
        ///
        /// Panics if the index is out of bounds.
        #[inline]
        pub fn $get_mut(&mut self, index: $idx) -> &mut $ty {
            debug_assert!(
                index.get() < self.$field.len(),
                concat!(
                    "called `Base::",
                    stringify!($get_mut),
                    "` with index out of bounds: the len is {} but the index is {}"
                ),
                self.$field.len(),
                index.get()
            );

            &mut self.$field[index.get()]
        }

        #[inline]
        pub fn $push(&mut self, value: $ty) -> $idx {
            let index = <$idx>::new(self.$field.len());
            self.$field.push(value);
            index
        }
    };
    (
        $field:ident,
        $ty:ty,
        $idx:ty,
        $num:ident,
        $get:ident,
        $get_mut:ident,
        $push:ident,
        $remove:ident
    ) => {
        arena_accessors!($field, $ty, $idx, $num, $get, $get_mut, $push);

        /// Removes and returns the element, shifting every later index down by one.
        ///
        /// # Panics
        ///
        /// Panics if the index is out of bounds.
        #[inline]
        pub fn $remove(&mut self, index: $idx) -> $ty {
            self.$field.remove(index.get())
        }
    };
}

/// A base: crafts, incoming transfers, production orders and facilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Base {
    name: String,
    crafts: Vec<Craft>,
    transfers: Vec<Transfer>,
    productions: Vec<Production>,
    facilities: Vec<Facility>,
}

impl Base {
    /// An empty base. Prefer `BaseBuilder` when the contents come from outside.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    arena_accessors!(
        crafts,
        Craft,
        CraftIndex,
        num_crafts,
        craft,
        craft_mut,
        push_craft,
        remove_craft
    );
    arena_accessors!(
        transfers,
        Transfer,
        TransferIndex,
        num_transfers,
        transfer,
        transfer_mut,
        push_transfer,
        remove_transfer
    );
    arena_accessors!(
        productions,
        Production,
        ProductionIndex,
        num_productions,
        production,
        production_mut,
        push_production,
        remove_production
    );
    arena_accessors!(
        facilities,
        Facility,
        FacilityIndex,
        num_facilities,
        facility,
        facility_mut,
        push_facility
    );

    /// Total craft capacity of the finished hangars.
    pub fn available_hangars(&self, rules: &Ruleset) -> usize {
        self.facilities
            .iter()
            .filter(|f| f.is_built())
            .map(|f| rules.facility_rule(f.rule()).crafts())
            .sum()
    }

    /// Number of craft that need a hangar: stationed craft, craft in transit
    /// and craft being manufactured.
    pub fn used_hangars(&self) -> usize {
        self.crafts.len()
            + self.transfers.iter().filter(|t| t.craft().is_some()).count()
            + self
                .productions
                .iter()
                .filter(|p| p.produced_craft().is_some())
                .count()
    }

    /// Number of craft of type `rule` stationed, in transit, or in production.
    pub fn craft_count(&self, rule: CraftRuleIndex) -> usize {
        self.crafts.iter().filter(|c| c.rule() == rule).count()
            + self
                .transfers
                .iter()
                .filter(|t| t.craft_rule() == Some(rule))
                .count()
            + self
                .productions
                .iter()
                .filter(|p| p.produced_craft() == Some(rule))
                .count()
    }

    /// Number of crafts, transfers and productions whose back-reference is `facility`.
    pub fn hangar_occupancy(&self, facility: FacilityIndex) -> usize {
        let target = Some(facility);
        self.crafts.iter().filter(|c| c.hangar() == target).count()
            + self.transfers.iter().filter(|t| t.hangar() == target).count()
            + self
                .productions
                .iter()
                .filter(|p| p.hangar() == target)
                .count()
    }

    /// Clears every back-reference to `facility`.
    ///
    /// Call before dismantling a facility; the next allocation run will find
    /// new homes for the affected craft.
    pub fn release_hangar(&mut self, facility: FacilityIndex) {
        let target = Some(facility);
        for c in self.crafts.iter_mut().filter(|c| c.hangar() == target) {
            c.set_hangar(None);
        }
        for t in self.transfers.iter_mut().filter(|t| t.hangar() == target) {
            t.set_hangar(None);
        }
        for p in self.productions.iter_mut().filter(|p| p.hangar() == target) {
            p.set_hangar(None);
        }
    }

    /// Dismantles a facility.
    ///
    /// Back-references to it are cleared and back-references to later
    /// facilities are shifted down so they keep pointing at the same building.
    ///
    /// # Panics
    ///
    /// Panics if `facility` is out of bounds.
    pub fn remove_facility(&mut self, facility: FacilityIndex) -> Facility {
        self.release_hangar(facility);
        let removed = self.facilities.remove(facility.get());

        let shift = |hangar: Option<FacilityIndex>| {
            hangar.map(|h| {
                if h.get() > facility.get() {
                    FacilityIndex::new(h.get() - 1)
                } else {
                    h
                }
            })
        };
        for c in &mut self.crafts {
            c.set_hangar(shift(c.hangar()));
        }
        for t in &mut self.transfers {
            t.set_hangar(shift(t.hangar()));
        }
        for p in &mut self.productions {
            p.set_hangar(shift(p.hangar()));
        }

        removed
    }

    /// Checks every rule reference and hangar back-reference against `rules`.
    pub fn validate(&self, rules: &Ruleset) -> Result<(), BaseError> {
        for facility in &self.facilities {
            if !rules.contains_facility_rule(facility.rule()) {
                return Err(BaseError::UnknownFacilityRule(facility.rule()));
            }
        }

        let craft_rules = self
            .crafts
            .iter()
            .map(|c| Some(c.rule()))
            .chain(self.transfers.iter().map(|t| t.craft_rule()))
            .chain(self.productions.iter().map(|p| p.produced_craft()))
            .flatten();
        for rule in craft_rules {
            if !rules.contains_craft_rule(rule) {
                return Err(BaseError::UnknownCraftRule(rule));
            }
        }

        let hangars = self
            .crafts
            .iter()
            .map(|c| c.hangar())
            .chain(self.transfers.iter().map(|t| t.hangar()))
            .chain(self.productions.iter().map(|p| p.hangar()))
            .flatten();
        for hangar in hangars {
            let Some(facility) = self.facilities.get(hangar.get()) else {
                return Err(BaseError::UnknownFacility(hangar));
            };
            if !rules.facility_rule(facility.rule()).is_hangar() {
                return Err(BaseError::NotAHangar(hangar));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Base({}, crafts: {}, transfers: {}, productions: {}, facilities: {})",
            self.name,
            self.crafts.len(),
            self.transfers.len(),
            self.productions.len(),
            self.facilities.len()
        )
    }
}

/// Collects a base's contents and validates them against a `Ruleset`.
///
/// ```rust
/// use hangar_model::base::{BaseBuilder, Craft};
/// use hangar_model::rules::{FacilityRule, RulesetBuilder};
///
/// let mut rb = RulesetBuilder::new();
/// let interceptor = rb.add_craft_rule("STR_INTERCEPTOR");
/// let hangar = rb.add_facility_rule(FacilityRule::hangar("STR_HANGAR", 1));
/// let rules = rb.build();
///
/// let mut bb = BaseBuilder::new("Cydonia Watch");
/// let h = bb.add_facility(hangar);
/// bb.add_craft(Craft::new(interceptor).with_hangar(h));
/// let base = bb.build(&rules).unwrap();
///
/// assert_eq!(base.hangar_occupancy(h), 1);
/// assert_eq!(base.available_hangars(&rules), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaseBuilder {
    base: Base,
}

impl BaseBuilder {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name),
        }
    }

    /// Adds a finished facility.
    pub fn add_facility(&mut self, rule: FacilityRuleIndex) -> FacilityIndex {
        self.base.push_facility(Facility::new(rule))
    }

    /// Adds a facility still `days` away from completion.
    pub fn add_facility_under_construction(
        &mut self,
        rule: FacilityRuleIndex,
        days: u32,
    ) -> FacilityIndex {
        self.base
            .push_facility(Facility::under_construction(rule, days))
    }

    pub fn add_craft(&mut self, craft: Craft) -> CraftIndex {
        self.base.push_craft(craft)
    }

    pub fn add_transfer(&mut self, transfer: Transfer) -> TransferIndex {
        self.base.push_transfer(transfer)
    }

    pub fn add_production(&mut self, production: Production) -> ProductionIndex {
        self.base.push_production(production)
    }

    pub fn build(self, rules: &Ruleset) -> Result<Base, BaseError> {
        self.base.validate(rules)?;
        Ok(self.base)
    }
}
