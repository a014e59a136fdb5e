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

/// Why a craft could not be given a hangar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationError {
    /// Every craft slot is taken.
    CapacityExceeded,
    /// No registered hangar slot accepts the craft type at all.
    NoCompatibleHangar,
    /// Compatible hangars exist, but not enough of them for every craft.
    Infeasible,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::CapacityExceeded => write!(f, "Craft slot capacity exceeded"),
            AllocationError::NoCompatibleHangar => write!(f, "No hangar accepts this craft type"),
            AllocationError::Infeasible => write!(f, "Not enough compatible hangar space"),
        }
    }
}

impl std::error::Error for AllocationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            AllocationError::CapacityExceeded.to_string(),
            "Craft slot capacity exceeded"
        );
        assert_eq!(
            AllocationError::Infeasible.to_string(),
            "Not enough compatible hangar space"
        );
    }

    #[test]
    fn test_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(AllocationError::NoCompatibleHangar);
        assert_eq!(err.to_string(), "No hangar accepts this craft type");
    }
}
