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

use hangar_core::utils::index::{TypedIndex, TypedIndexTag};

/// A tag type for craft rule indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CraftRuleIndexTag;

impl TypedIndexTag for CraftRuleIndexTag {
    const NAME: &'static str = "CraftRuleIndex";
}

/// A typed index into `Ruleset::craft_rules`. This is the craft type key.
pub type CraftRuleIndex = TypedIndex<CraftRuleIndexTag>;

/// A tag type for facility rule indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FacilityRuleIndexTag;

impl TypedIndexTag for FacilityRuleIndexTag {
    const NAME: &'static str = "FacilityRuleIndex";
}

/// A typed index into `Ruleset::facility_rules`.
pub type FacilityRuleIndex = TypedIndex<FacilityRuleIndexTag>;

/// A tag type for facility indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FacilityIndexTag;

impl TypedIndexTag for FacilityIndexTag {
    const NAME: &'static str = "FacilityIndex";
}

/// A typed index into `Base::facilities`.
pub type FacilityIndex = TypedIndex<FacilityIndexTag>;

/// A tag type for craft indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CraftIndexTag;

impl TypedIndexTag for CraftIndexTag {
    const NAME: &'static str = "CraftIndex";
}

/// A typed index into `Base::crafts`.
pub type CraftIndex = TypedIndex<CraftIndexTag>;

/// A tag type for transfer indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TransferIndexTag;

impl TypedIndexTag for TransferIndexTag {
    const NAME: &'static str = "TransferIndex";
}

/// A typed index into `Base::transfers`.
pub type TransferIndex = TypedIndex<TransferIndexTag>;

/// A tag type for production indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProductionIndexTag;

impl TypedIndexTag for ProductionIndexTag {
    const NAME: &'static str = "ProductionIndex";
}

/// A typed index into `Base::productions`.
pub type ProductionIndex = TypedIndex<ProductionIndexTag>;
