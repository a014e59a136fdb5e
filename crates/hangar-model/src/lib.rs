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

//! # Hangar Model
//!
//! The domain state the hangar allocation engine reads from and writes to.
//!
//! ## Architecture
//!
//! * **`index`**: Typed indices for every arena (`CraftIndex`, `FacilityIndex`, ...).
//! * **`rules`**: Immutable craft and facility rules (`Ruleset`) built through `RulesetBuilder`.
//! * **`base`**: One base's crafts, incoming transfers, production orders and facilities,
//!   each object carrying its facility back-reference (`hangar`).
//! * **`error`**: Errors raised while assembling a `Base` against a `Ruleset`.
//!
//! ## Design Philosophy
//!
//! 1.  **Arenas, not pointers**: Objects live in flat vectors and reference each other by
//!     typed index. The only relation the allocation engine writes is the `hangar`
//!     back-reference on crafts, transfers and productions.
//! 2.  **Rules are shared, state is owned**: A `Ruleset` is built once and borrowed by every
//!     base; a `Base` owns its objects.
//! 3.  **Fail-Fast**: `BaseBuilder::build` validates every reference before a `Base` exists.

pub mod base;
pub mod error;
pub mod index;
pub mod rules;
