use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::Simulator;
use crate::error::Result;
use crate::graph::Step;
use crate::network::{Arc, Node, NodeId, PetriNet, Transition};

/// Separates a transition id from the copy number of its unfolded copies, as in `trans://read#2`.
pub const UNFOLDED_COPY_SEPARATOR: char = '#';

impl Simulator {
    /// Unfolds `net` so that concurrent occurrences of the same transition become distinct transitions.
    ///
    /// A transition that can be enabled `k` times at once in some reachable marking is replaced by
    /// `k` copies with identical arcs and context; the first copy keeps the original id, the others
    /// are suffixed with `#2`, `#3`, ..., skipping suffixes already used by another node. Places are untouched, so the unfolded net reaches exactly the
    /// same markings as `net`, through more (parallel) arcs.
    #[tracing::instrument(level = "debug", skip_all, fields(net = net.id()))]
    pub fn get_unfolded_petri_net(&self, net: &PetriNet) -> Result<PetriNet> {
        let graph = self.build_step_graph(net)?;

        let mut degrees: BTreeMap<&NodeId, u32> = BTreeMap::new();
        for transition in net.transitions() {
            let degree = graph
                .steps()
                .iter()
                .map(|step| enabled_degree(step, transition))
                .max()
                .unwrap_or(0);
            degrees.insert(transition.id(), degree.max(1));
        }

        let mut nodes: Vec<Node> = net.places().cloned().map(Node::from).collect();
        let mut arcs = Vec::with_capacity(net.arcs().len());
        let mut taken: BTreeSet<NodeId> = net.nodes().map(|node| node.id().clone()).collect();

        for transition in net.transitions() {
            let copies = degrees.get(transition.id()).copied().unwrap_or(1);
            let mut suffix = 1;
            for copy in 1..=copies {
                let id = if copy == 1 {
                    transition.id().clone()
                } else {
                    next_copy_id(transition.id(), &mut suffix, &mut taken)
                };
                for arc in net.incoming(transition.id()) {
                    arcs.push(Arc::new(arc.source(), &id));
                }
                for arc in net.outgoing(transition.id()) {
                    arcs.push(Arc::new(&id, arc.target()));
                }
                nodes.push(transition.renamed(id).into());
            }
        }

        let unfolded = PetriNet::new(format!("{}#unfolded", net.id()), nodes, arcs)?;
        debug!(
            transitions = net.transitions().count(),
            unfolded_transitions = unfolded.transitions().count(),
            "Unfolded net."
        );
        Ok(unfolded)
    }
}

/// The first `id#n` after `suffix` that names no node of the net nor an earlier copy.
fn next_copy_id(id: &NodeId, suffix: &mut u32, taken: &mut BTreeSet<NodeId>) -> NodeId {
    loop {
        *suffix += 1;
        let candidate = NodeId::new(format!("{}{}{}", id, UNFOLDED_COPY_SEPARATOR, suffix));
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// How many times `transition` could fire at once in the marking of `step`.
/// Transitions without input places count as enabled once.
fn enabled_degree(step: &Step, transition: &Transition) -> u32 {
    step.net()
        .consumption(transition.id())
        .into_iter()
        .map(|(place, weight)| step.marking().get(place).copied().unwrap_or(0) / weight)
        .min()
        .unwrap_or(1)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::PetriNetBuilder;
    use crate::network::ContextObject;

    #[test]
    fn test_unfold_keeps_single_occurrences() {
        let mut builder = PetriNetBuilder::new("sequence");
        let start = builder.place("start", 1);
        let end = builder.place("end", 0);
        builder.begin_transition("t1").input(&start).output(&end).build();
        let net = builder.build().unwrap();

        let unfolded = Simulator::default().get_unfolded_petri_net(&net).unwrap();

        assert_eq!(unfolded.transitions().count(), 1);
        assert_eq!(unfolded.arcs(), net.arcs());
        assert_eq!(unfolded.id(), "sequence#unfolded");
    }

    #[test]
    fn test_unfold_splits_auto_concurrency() {
        // Two tokens in `copy` let `read` fire twice concurrently
        let mut builder = PetriNetBuilder::new("copies");
        let copy = builder.place("copy", 2);
        let done = builder.place("done", 0);
        builder
            .begin_transition("read")
            .input(&copy)
            .output(&done)
            .context(ContextObject::app().read("data"))
            .build();
        let net = builder.build().unwrap();

        let simulator = Simulator::default();
        let unfolded = simulator.get_unfolded_petri_net(&net).unwrap();

        let ids = unfolded
            .transitions()
            .map(|t| t.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["read", "read#2"]);
        assert!(unfolded
            .transitions()
            .all(|t| t.satisfies(|c| c.reads("data"))));

        // Same reachable markings, more arcs
        let graph = simulator.build_step_graph(&net).unwrap();
        let unfolded_graph = simulator.build_step_graph(&unfolded).unwrap();
        assert_eq!(graph.len(), unfolded_graph.len());
        assert_eq!(graph.arcs().len() * 2, unfolded_graph.arcs().len());
        for step in graph.steps() {
            assert!(unfolded_graph.find(step.marking()).is_some());
        }
    }

    #[test]
    fn test_unfold_respects_arc_weight() {
        let mut builder = PetriNetBuilder::new("weighted");
        let pool = builder.place("pool", 3);
        let out = builder.place("out", 0);
        builder
            .begin_transition("pair")
            .input(&pool)
            .input(&pool)
            .output(&out)
            .build();
        let net = builder.build().unwrap();

        let unfolded = Simulator::default().get_unfolded_petri_net(&net).unwrap();

        // 3 / 2 = 1 concurrent occurrence
        assert_eq!(unfolded.transitions().count(), 1);
        assert_eq!(unfolded.consumption(&NodeId::from("pair")).get(&pool), Some(&2));
    }

    #[test]
    fn test_unfold_skips_taken_copy_ids() {
        let mut builder = PetriNetBuilder::new("taken");
        let pool = builder.place("pool", 3);
        let other = builder.place("other", 0);
        let done = builder.place("done", 0);
        builder.begin_transition("t").input(&pool).output(&done).build();
        builder.begin_transition("t#2").input(&other).output(&done).build();
        let net = builder.build().unwrap();

        let unfolded = Simulator::default().get_unfolded_petri_net(&net).unwrap();

        let ids = unfolded
            .transitions()
            .map(|t| t.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["t", "t#2", "t#3", "t#4"]);
        assert_eq!(
            unfolded.consumption(&NodeId::from("t#2")).into_keys().collect::<Vec<_>>(),
            vec![&other]
        );
        for copy in ["t#3", "t#4"] {
            assert_eq!(unfolded.consumption(&NodeId::from(copy)).get(&pool), Some(&1));
        }
    }
}
