//! Pivot diagnostics (component I, expansion)
//!
//! `PivotTrace` is a purely observational ring buffer of recent pivot
//! operations, opt in via [`crate::config::SolverConfig::with_trace`].
//! Nothing in the kernel ever reads it back to make a decision — deleting
//! every `record` call would change observability, never behavior, which
//! mirrors the host codebase's posture of stats structs that watch the
//! solver without steering it.

use std::collections::VecDeque;

use crate::variable::Variable;

/// Default number of most-recent pivots retained.
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

/// Which optimisation loop produced a [`PivotEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Phase-1 artificial-variable minimisation or phase-2 objective
    /// optimisation — both run through the same primal loop.
    Primal,
    /// Post-edit infeasibility repair.
    Dual,
}

/// A single pivot: which variable entered and left the basis, in which
/// phase, and how many rows the tableau held at that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotEvent {
    pub entering: Variable,
    pub leaving: Variable,
    pub row_count: usize,
    pub phase: Phase,
}

/// A bounded ring of the most recent [`PivotEvent`]s.
#[derive(Debug, Clone)]
pub struct PivotTrace {
    events: VecDeque<PivotEvent>,
    capacity: usize,
}

impl PivotTrace {
    /// An empty trace retaining at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        PivotTrace { events: VecDeque::with_capacity(capacity.min(1024)), capacity }
    }

    /// Append an event, evicting the oldest if at capacity.
    pub fn record(&mut self, event: PivotEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Iterate events oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &PivotEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for PivotTrace {
    fn default() -> Self {
        PivotTrace::new(DEFAULT_TRACE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableRegistry;

    #[test]
    fn records_up_to_capacity_then_evicts_oldest() {
        let mut reg = VariableRegistry::new();
        let a = reg.new_slack();
        let b = reg.new_slack();
        let mut trace = PivotTrace::new(2);
        for _ in 0..3 {
            trace.record(PivotEvent { entering: a, leaving: b, row_count: 1, phase: Phase::Primal });
        }
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn default_uses_default_capacity() {
        let trace = PivotTrace::default();
        assert!(trace.is_empty());
    }
}
