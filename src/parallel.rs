use std::collections::BTreeSet;

use tracing::debug;

use crate::network::{ContextObject, NodeId, Transition};

/// Transitions that can fire together from one reachable marking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParallelSet(Vec<Transition>);

impl ParallelSet {
    pub fn new(transitions: Vec<Transition>) -> Self {
        Self(transitions)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, transition: &NodeId) -> bool {
        self.0.iter().any(|t| t.id() == transition)
    }

    /// Number of distinct transitions of the set whose context satisfies `predicate`.
    pub fn count_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ContextObject) -> bool,
    {
        self.0
            .iter()
            .filter(|transition| transition.satisfies(&predicate))
            .map(Transition::id)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Returns true iff some set holds at least `n` distinct transitions whose context satisfies `predicate`.
/// Transitions without a context never count.
pub fn n_parallel_transitions_with_condition<F>(predicate: F, n: usize, sets: &[ParallelSet]) -> bool
where
    F: Fn(&ContextObject) -> bool,
{
    let res = sets.iter().any(|set| set.count_matching(&predicate) >= n);
    debug!(n, sets = sets.len(), res, "Counted parallel transitions.");
    res
}
