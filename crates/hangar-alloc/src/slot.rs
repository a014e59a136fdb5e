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

//! Compact slot positions used by the allocation engine.
//!
//! The engine never touches more than `MAX_CRAFT_SLOTS` competing craft and
//! `MAX_HANGAR_SLOTS` units of hangar capacity. Both sides are addressed by
//! small typed positions so that a candidate set fits in one `UseMask`.

use hangar_core::{
    mask::BitMask,
    utils::index::{TypedIndex, TypedIndexTag},
};
use hangar_model::index::{
    CraftIndex, CraftRuleIndex, FacilityIndex, ProductionIndex, TransferIndex,
};

/// The bitset type holding one candidate row or column.
pub type UseMask = BitMask<u16>;

/// Upper bound on simultaneously registered craft slots.
pub const MAX_CRAFT_SLOTS: usize = UseMask::WIDTH;

/// Upper bound on simultaneously registered hangar slots.
pub const MAX_HANGAR_SLOTS: usize = UseMask::WIDTH;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CraftPosTag;

impl TypedIndexTag for CraftPosTag {
    const NAME: &'static str = "CraftPos";
}

/// A position in `[0, MAX_CRAFT_SLOTS)`.
pub type CraftPos = TypedIndex<CraftPosTag>;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct HangarPosTag;

impl TypedIndexTag for HangarPosTag {
    const NAME: &'static str = "HangarPos";
}

/// A position in `[0, MAX_HANGAR_SLOTS)`.
pub type HangarPos = TypedIndex<HangarPosTag>;

/// What a craft slot stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CraftSource {
    /// A type-only reservation with no backing object.
    Probe,
    /// A craft stationed at the base.
    Craft(CraftIndex),
    /// A shipment carrying a craft to the base.
    Transfer(TransferIndex),
    /// A manufacturing order producing a craft.
    Production(ProductionIndex),
}

impl CraftSource {
    /// Returns `true` if the slot maps back onto an object of the base.
    #[inline]
    pub fn is_backed(&self) -> bool {
        !matches!(self, Self::Probe)
    }
}

impl std::fmt::Display for CraftSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probe => write!(f, "Probe"),
            Self::Craft(i) => write!(f, "{}", i),
            Self::Transfer(i) => write!(f, "{}", i),
            Self::Production(i) => write!(f, "{}", i),
        }
    }
}

/// A registered craft slot.
///
/// `rule == None` marks a tombstone: the position is free and takes part in
/// no compatibility relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CraftSlot {
    pub rule: Option<CraftRuleIndex>,
    pub source: CraftSource,
}

impl CraftSlot {
    pub const TOMBSTONE: Self = Self {
        rule: None,
        source: CraftSource::Probe,
    };

    #[inline]
    pub fn new(rule: CraftRuleIndex, source: CraftSource) -> Self {
        Self {
            rule: Some(rule),
            source,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.rule.is_some()
    }
}

/// One unit of capacity of a hangar facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HangarSlot {
    pub facility: FacilityIndex,
}
