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

//! Hall-style deficiency reduction.
//!
//! A set of `k` craft slots whose candidates all lie inside one craft's
//! `k`-element candidate set `S` saturates `S`: those craft will use every
//! hangar slot of `S` between them. `S` can then be taken away from every
//! other craft slot. If some other craft slot has nowhere to go but `S`, no
//! assignment exists.
//!
//! One call finds at most one such group; the allocation loop calls again on
//! the remaining craft slots.

use crate::{
    mask::CompatibilityMask,
    slot::{CraftPos, UseMask},
};
use tracing::trace;

/// Outcome of one reduction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// No saturated group exists.
    None,
    /// The hangar slots claimed by a saturated group. They have been
    /// excluded from every craft slot outside the group.
    Saturated(UseMask),
    /// More craft slots than hangar slots compete for the same set.
    Infeasible,
}

/// Looks for one saturated group among `group`.
///
/// Sorts `group` ascending by candidate population (stable, so ties keep
/// slot order) and, on success, narrows the rows of the overlapping craft.
pub fn reduce(mask: &mut CompatibilityMask, group: &mut [CraftPos]) -> Reduction {
    group.sort_by_key(|&c| mask.craft_population(c));

    for &curr in group.iter() {
        let size = mask.craft_population(curr);
        let include = mask.candidates(curr);

        let mut subsets = 0;
        for &j in group.iter() {
            if mask.craft_population(j) > size {
                break;
            }
            let cand = mask.candidates(j);
            if cand.intersects(include) && cand.is_subset_of(include) {
                subsets += 1;
                if subsets == size {
                    return saturate(mask, group, include, size);
                }
            }
        }
    }

    Reduction::None
}

fn saturate(
    mask: &mut CompatibilityMask,
    group: &[CraftPos],
    include: UseMask,
    size: usize,
) -> Reduction {
    let mut protected = size;
    for &j in group {
        let cand = mask.candidates(j);
        if !cand.intersects(include) {
            continue;
        }
        if cand.is_subset_of(include) {
            if protected > 0 {
                protected -= 1;
                continue;
            }
            trace!(craft = %j, hangars = %include, "surplus craft inside saturated set");
            return Reduction::Infeasible;
        }
        mask.exclude(j, include);
    }

    trace!(hangars = %include, size, "saturated group");
    Reduction::Saturated(include)
}
