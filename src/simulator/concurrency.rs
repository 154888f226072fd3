use std::collections::{BTreeSet, HashSet};

use tracing::{debug, trace};

use super::Simulator;
use crate::graph::{Step, StepGraph};
use crate::network::{Marking, NodeId, Transition};
use crate::parallel::ParallelSet;

/// Enabled transitions that compete, directly or through a chain of others, for the same input places.
#[derive(Debug)]
struct ConflictGroup<'a> {
    transitions: Vec<&'a Transition>,
    places: HashSet<&'a NodeId>,
}

/// Every exhaustive firing choice of one conflict group.
#[derive(Debug)]
struct ResolvedConflictGroup<'a>(Vec<Vec<&'a Transition>>);

impl Simulator {
    /// Collects the sets of transitions that can fire together from some step of `graph`.
    ///
    /// Within a step, enabled transitions are grouped by shared input places. Each group is resolved
    /// into the choices that fire as many of its transitions as the marking allows, leaving none of
    /// them still enabled; independent groups are combined. Every distinct combination is one set.
    /// Meant to run on the graph of an unfolded net, where concurrent occurrences of a transition
    /// are distinct transitions.
    #[tracing::instrument(level = "debug", skip_all, fields(steps = graph.len()))]
    pub fn get_parallel_sets(&self, graph: &StepGraph) -> Vec<ParallelSet> {
        let mut seen: BTreeSet<Vec<NodeId>> = BTreeSet::new();
        let mut res = Vec::new();

        for (id, step) in graph.steps().iter().enumerate() {
            let groups = group_enabled_transitions(step);
            let groups = groups
                .iter()
                .map(|group| group.resolve(step))
                .collect::<Vec<_>>();

            let mut combinations = Vec::new();
            combine(&groups, Vec::new(), &mut combinations);

            for combination in combinations {
                if combination.is_empty() {
                    continue;
                }

                let mut key = combination
                    .iter()
                    .map(|transition| transition.id().clone())
                    .collect::<Vec<_>>();
                key.sort();
                if seen.insert(key) {
                    trace!(step = id, size = combination.len(), "Found parallel set.");
                    res.push(ParallelSet::new(combination.into_iter().cloned().collect()));
                }
            }
        }

        debug!(parallel_sets = res.len(), "Computed parallel sets.");
        res
    }
}

/// Cartesian product of the choices of every group.
fn combine<'a>(
    groups: &[ResolvedConflictGroup<'a>],
    current: Vec<&'a Transition>,
    res: &mut Vec<Vec<&'a Transition>>,
) {
    let Some((first, rest)) = groups.split_first() else {
        res.push(current);
        return;
    };

    for choice in first.0.iter() {
        let mut next = current.clone();
        next.extend(choice.iter().copied());
        combine(rest, next, res);
    }
}

fn group_enabled_transitions(step: &Step) -> Vec<ConflictGroup<'_>> {
    let net = step.net();
    // Groups stay pairwise disjoint: a new transition absorbs every group it overlaps
    let mut groups: Vec<ConflictGroup> = Vec::new();

    for transition in net.enabled_transitions() {
        let mut group = ConflictGroup {
            transitions: vec![transition],
            places: net.consumption(transition.id()).into_keys().collect(),
        };

        let mut index = 0;
        while index < groups.len() {
            if groups[index].places.is_disjoint(&group.places) {
                index += 1;
            } else {
                let mut other = groups.swap_remove(index);
                group.transitions.append(&mut other.transitions);
                group.places.extend(other.places);
            }
        }

        groups.push(group);
    }

    groups
}

impl<'a> ConflictGroup<'a> {
    fn is_enabled(transition: &Transition, step: &Step, remaining: &Marking) -> bool {
        step.net()
            .consumption(transition.id())
            .into_iter()
            .all(|(place, weight)| remaining.get(place).copied().unwrap_or(0) >= weight)
    }

    fn consume(transition: &Transition, step: &Step, remaining: &mut Marking) {
        for (place, weight) in step.net().consumption(transition.id()) {
            if let Some(markers) = remaining.get_mut(place) {
                *markers = markers.saturating_sub(weight);
            }
        }
    }

    fn resolve_recurse(
        &self,
        step: &Step,
        mut remaining: Marking,
        current_choice: &[bool],
    ) -> Vec<Vec<bool>> {
        let index = current_choice.len();

        if index >= self.transitions.len() {
            let leaves_enabled = self
                .transitions
                .iter()
                .enumerate()
                .any(|(index, transition)| {
                    !current_choice[index] && Self::is_enabled(transition, step, &remaining)
                });

            // A choice that leaves an unfired transition enabled is not maximal
            return if leaves_enabled {
                vec![]
            } else {
                vec![Vec::from(current_choice)]
            };
        }

        let mut next_choice = Vec::with_capacity(index + 1);
        next_choice.extend_from_slice(current_choice);

        if !Self::is_enabled(self.transitions[index], step, &remaining) {
            next_choice.push(false);
            return self.resolve_recurse(step, remaining, &next_choice);
        }

        let mut res = Vec::new();

        next_choice.push(false);
        res.append(&mut self.resolve_recurse(step, remaining.clone(), &next_choice));
        next_choice.pop();

        next_choice.push(true);
        Self::consume(self.transitions[index], step, &mut remaining);
        res.append(&mut self.resolve_recurse(step, remaining, &next_choice));

        res
    }

    fn resolve(&self, step: &Step) -> ResolvedConflictGroup<'a> {
        let choices = self.resolve_recurse(step, step.marking().clone(), &[]);

        ResolvedConflictGroup(
            choices
                .into_iter()
                .map(|choice| {
                    self.transitions
                        .iter()
                        .zip(choice)
                        .filter(|(_, fired)| *fired)
                        .map(|(transition, _)| *transition)
                        .collect()
                })
                .collect(),
        )
    }
}
