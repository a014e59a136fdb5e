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

//! Craft and facility rules.
//!
//! A `Ruleset` is the immutable catalogue of craft types and facility types a
//! game session runs with. The allocation engine only needs two facts from it:
//! how many craft a facility type can hold (`FacilityRule::crafts`), and
//! whether a facility type accepts a given craft type (`FacilityRule::allows`).
//!
//! Compatibility is stored per facility rule as an optional `FixedBitSet` over
//! craft rule indices. `None` means the facility accepts every craft type,
//! which is the common case for a generic hangar.

use crate::index::{CraftRuleIndex, FacilityRuleIndex};
use fixedbitset::FixedBitSet;

/// A craft type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftRule {
    name: String,
}

impl CraftRule {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A facility type.
///
/// # Examples
///
/// ```rust
/// use hangar_model::index::CraftRuleIndex;
/// use hangar_model::rules::FacilityRule;
///
/// let interceptor = CraftRuleIndex::new(0);
/// let transport = CraftRuleIndex::new(1);
///
/// let small = FacilityRule::hangar("STR_SMALL_HANGAR", 1).allowing([interceptor]);
/// assert!(small.allows(interceptor));
/// assert!(!small.allows(transport));
///
/// let lab = FacilityRule::new("STR_LABORATORY");
/// assert!(!lab.is_hangar());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityRule {
    name: String,
    crafts: usize,
    allowed: Option<FixedBitSet>,
}

impl FacilityRule {
    /// A facility that stores no craft.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            crafts: 0,
            allowed: None,
        }
    }

    /// A facility that stores up to `crafts` craft of any type.
    #[inline]
    pub fn hangar(name: impl Into<String>, crafts: usize) -> Self {
        Self {
            name: name.into(),
            crafts,
            allowed: None,
        }
    }

    /// Restricts the facility to the given craft types.
    ///
    /// Calling this more than once widens the allowed set.
    pub fn allowing<I>(mut self, craft_rules: I) -> Self
    where
        I: IntoIterator<Item = CraftRuleIndex>,
    {
        let allowed = self.allowed.get_or_insert_with(FixedBitSet::new);
        for rule in craft_rules {
            let index = rule.get();
            if index >= allowed.len() {
                allowed.grow(index + 1);
            }
            allowed.insert(index);
        }
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of craft this facility holds; `0` if it is not a hangar.
    #[inline]
    pub fn crafts(&self) -> usize {
        self.crafts
    }

    #[inline]
    pub fn is_hangar(&self) -> bool {
        self.crafts > 0
    }

    /// Returns `true` if a craft of type `craft_rule` may be stored here.
    #[inline]
    pub fn allows(&self, craft_rule: CraftRuleIndex) -> bool {
        self.is_hangar()
            && self
                .allowed
                .as_ref()
                .is_none_or(|set| set.contains(craft_rule.get()))
    }
}

/// The immutable catalogue of craft and facility rules.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    craft_rules: Vec<CraftRule>,
    facility_rules: Vec<FacilityRule>,
}

impl Ruleset {
    #[inline]
    pub fn num_craft_rules(&self) -> usize {
        self.craft_rules.len()
    }

    #[inline]
    pub fn num_facility_rules(&self) -> usize {
        self.facility_rules.len()
    }

    #[inline]
    pub fn craft_rules(&self) -> &[CraftRule] {
        &self.craft_rules
    }

    #[inline]
    pub fn facility_rules(&self) -> &[FacilityRule] {
        &self.facility_rules
    }

    /// Returns the craft rule at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..num_craft_rules()`.
    #[inline]
    pub fn craft_rule(&self, index: CraftRuleIndex) -> &CraftRule {
        debug_assert!(
            index.get() < self.num_craft_rules(),
            "called `Ruleset::craft_rule` with craft rule index out of bounds: the len is {} but the index is {}",
            self.num_craft_rules(),
            index.get()
        );

        &self.craft_rules[index.get()]
    }

    /// Returns the facility rule at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `0..num_facility_rules()`.
    #[inline]
    pub fn facility_rule(&self, index: FacilityRuleIndex) -> &FacilityRule {
        debug_assert!(
            index.get() < self.num_facility_rules(),
            "called `Ruleset::facility_rule` with facility rule index out of bounds: the len is {} but the index is {}",
            self.num_facility_rules(),
            index.get()
        );

        &self.facility_rules[index.get()]
    }

    /// Looks up a craft rule by name.
    pub fn find_craft_rule(&self, name: &str) -> Option<CraftRuleIndex> {
        self.craft_rules
            .iter()
            .position(|r| r.name() == name)
            .map(CraftRuleIndex::new)
    }

    /// Looks up a facility rule by name.
    pub fn find_facility_rule(&self, name: &str) -> Option<FacilityRuleIndex> {
        self.facility_rules
            .iter()
            .position(|r| r.name() == name)
            .map(FacilityRuleIndex::new)
    }

    #[inline]
    pub fn contains_craft_rule(&self, index: CraftRuleIndex) -> bool {
        index.get() < self.num_craft_rules()
    }

    #[inline]
    pub fn contains_facility_rule(&self, index: FacilityRuleIndex) -> bool {
        index.get() < self.num_facility_rules()
    }

    /// Returns `true` if facilities of type `facility_rule` accept craft of type `craft_rule`.
    #[inline]
    pub fn is_craft_allowed(
        &self,
        facility_rule: FacilityRuleIndex,
        craft_rule: CraftRuleIndex,
    ) -> bool {
        self.facility_rule(facility_rule).allows(craft_rule)
    }
}

impl std::fmt::Display for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ruleset(craft_rules: {}, facility_rules: {})",
            self.num_craft_rules(),
            self.num_facility_rules()
        )
    }
}

/// Mutable construction of a `Ruleset`.
///
/// ```rust
/// use hangar_model::rules::{FacilityRule, RulesetBuilder};
///
/// let mut builder = RulesetBuilder::new();
/// let interceptor = builder.add_craft_rule("STR_INTERCEPTOR");
/// let hangar = builder.add_facility_rule(FacilityRule::hangar("STR_HANGAR", 1));
/// let rules = builder.build();
///
/// assert!(rules.is_craft_allowed(hangar, interceptor));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RulesetBuilder {
    craft_rules: Vec<CraftRule>,
    facility_rules: Vec<FacilityRule>,
}

impl RulesetBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a craft type and returns its key.
    pub fn add_craft_rule(&mut self, name: impl Into<String>) -> CraftRuleIndex {
        let index = CraftRuleIndex::new(self.craft_rules.len());
        self.craft_rules.push(CraftRule::new(name));
        index
    }

    /// Registers a facility type and returns its key.
    pub fn add_facility_rule(&mut self, rule: FacilityRule) -> FacilityRuleIndex {
        let index = FacilityRuleIndex::new(self.facility_rules.len());
        self.facility_rules.push(rule);
        index
    }

    #[inline]
    pub fn num_craft_rules(&self) -> usize {
        self.craft_rules.len()
    }

    #[inline]
    pub fn num_facility_rules(&self) -> usize {
        self.facility_rules.len()
    }

    pub fn build(self) -> Ruleset {
        Ruleset {
            craft_rules: self.craft_rules,
            facility_rules: self.facility_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cr(i: usize) -> CraftRuleIndex {
        CraftRuleIndex::new(i)
    }

    #[test]
    fn test_hangar_without_restriction_allows_everything() {
        let rule = FacilityRule::hangar("STR_HANGAR", 2);
        assert!(rule.is_hangar());
        assert_eq!(rule.crafts(), 2);
        assert!(rule.allows(cr(0)));
        assert!(rule.allows(cr(99)));
    }

    #[test]
    fn test_non_hangar_allows_nothing() {
        let rule = FacilityRule::new("STR_GENERAL_STORES");
        assert!(!rule.is_hangar());
        assert_eq!(rule.crafts(), 0);
        assert!(!rule.allows(cr(0)));
    }

    #[test]
    fn test_allowing_restricts_and_widens() {
        let rule = FacilityRule::hangar("STR_SMALL", 1).allowing([cr(2)]);
        assert!(rule.allows(cr(2)));
        assert!(!rule.allows(cr(0)));
        assert!(!rule.allows(cr(40)));

        let rule = rule.allowing([cr(0)]);
        assert!(rule.allows(cr(0)));
        assert!(rule.allows(cr(2)));
    }

    #[test]
    fn test_allowing_empty_set_rejects_everything() {
        let rule = FacilityRule::hangar("STR_SEALED", 1).allowing(std::iter::empty());
        assert!(!rule.allows(cr(0)));
    }

    #[test]
    fn test_builder_assigns_sequential_indices() {
        let mut b = RulesetBuilder::new();
        let a = b.add_craft_rule("A");
        let c = b.add_craft_rule("C");
        let h = b.add_facility_rule(FacilityRule::hangar("H", 1).allowing([c]));
        let rules = b.build();

        assert_eq!(a.get(), 0);
        assert_eq!(c.get(), 1);
        assert_eq!(rules.num_craft_rules(), 2);
        assert_eq!(rules.num_facility_rules(), 1);
        assert!(rules.is_craft_allowed(h, c));
        assert!(!rules.is_craft_allowed(h, a));
        assert_eq!(rules.find_craft_rule("C"), Some(c));
        assert_eq!(rules.find_facility_rule("H"), Some(h));
        assert_eq!(rules.find_craft_rule("missing"), None);
        assert_eq!(rules.to_string(), "Ruleset(craft_rules: 2, facility_rules: 1)");
    }
}
