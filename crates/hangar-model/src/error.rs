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

//! Errors raised while assembling a `Base` against a `Ruleset`.

use crate::index::{CraftRuleIndex, FacilityIndex, FacilityRuleIndex};
use std::fmt::Display;

/// The error type for base validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseError {
    /// A craft, transfer or production names a craft rule the ruleset does not define.
    UnknownCraftRule(CraftRuleIndex),
    /// A facility names a facility rule the ruleset does not define.
    UnknownFacilityRule(FacilityRuleIndex),
    /// A hangar back-reference points past the end of the facility list.
    UnknownFacility(FacilityIndex),
    /// A hangar back-reference points at a facility that cannot hold craft.
    NotAHangar(FacilityIndex),
}

impl Display for BaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCraftRule(rule) => write!(f, "Unknown craft rule {}", rule),
            Self::UnknownFacilityRule(rule) => write!(f, "Unknown facility rule {}", rule),
            Self::UnknownFacility(facility) => {
                write!(f, "Hangar reference {} does not exist", facility)
            }
            Self::NotAHangar(facility) => {
                write!(f, "Hangar reference {} cannot hold craft", facility)
            }
        }
    }
}

impl std::error::Error for BaseError {}
