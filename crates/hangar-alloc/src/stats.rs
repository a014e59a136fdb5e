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

/// Counters collected by one `HangarAllocation` over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationStatistics {
    /// Full reduce-and-match runs started.
    pub solve_attempts: u64,
    /// Runs repeated with maximum freedom after a sticky run failed.
    pub retries: u64,
    /// Saturated groups found by the reducer.
    pub reductions: u64,
    /// Groups handed to the matcher and solved.
    pub groups_solved: u64,
    /// Matcher steps that placed a craft slot.
    pub nodes_explored: u64,
    /// Matcher steps that undid a placement.
    pub backtracks: u64,
    /// Facilities written back onto base objects.
    pub commits: u64,
}

impl AllocationStatistics {
    #[inline]
    pub fn on_solve_attempt(&mut self) {
        self.solve_attempts = self.solve_attempts.saturating_add(1);
    }

    #[inline]
    pub fn on_retry(&mut self) {
        self.retries = self.retries.saturating_add(1);
    }

    #[inline]
    pub fn on_reduction(&mut self) {
        self.reductions = self.reductions.saturating_add(1);
    }

    #[inline]
    pub fn on_group_solved(&mut self) {
        self.groups_solved = self.groups_solved.saturating_add(1);
    }

    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_backtrack(&mut self) {
        self.backtracks = self.backtracks.saturating_add(1);
    }

    #[inline]
    pub fn on_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }
}

impl std::fmt::Display for AllocationStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hangar Allocation Statistics:")?;
        writeln!(f, "  Solve attempts:  {}", self.solve_attempts)?;
        writeln!(f, "  Retries:         {}", self.retries)?;
        writeln!(f, "  Reductions:      {}", self.reductions)?;
        writeln!(f, "  Groups solved:   {}", self.groups_solved)?;
        writeln!(f, "  Nodes explored:  {}", self.nodes_explored)?;
        writeln!(f, "  Backtracks:      {}", self.backtracks)?;
        writeln!(f, "  Commits:         {}", self.commits)?;
        Ok(())
    }
}
