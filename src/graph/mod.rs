use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::network::{Marking, NodeId, PetriNet};

mod edge_map;
pub use edge_map::EdgeMap;

/// Index of a step inside its [`StepGraph`].
pub type StepId = usize;

/// One reachable marking, kept as an immutable snapshot of the net.
/// Two steps are the same step iff their markings are equal.
#[derive(Clone, Debug)]
pub struct Step {
    net: PetriNet,
    marking: Marking,
}

impl Step {
    pub fn new(net: PetriNet) -> Self {
        let marking = net.marking();
        Self { net, marking }
    }

    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    /// Places holding at least one token.
    pub fn marked_places(&self) -> impl Iterator<Item = (&NodeId, u32)> {
        self.marking
            .iter()
            .filter(|(_, markers)| **markers > 0)
            .map(|(id, &markers)| (id, markers))
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.marking == other.marking
    }
}

impl Eq for Step {}

impl Hash for Step {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.marking.hash(state);
    }
}

/// An edge of the step graph: firing `fired` in `source` yields `target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetArc {
    source: StepId,
    target: StepId,
    fired: NodeId,
}

impl NetArc {
    pub fn source(&self) -> StepId {
        self.source
    }

    pub fn target(&self) -> StepId {
        self.target
    }

    pub fn fired(&self) -> &NodeId {
        &self.fired
    }
}

/// The graph of reachable markings of a petri net. The following notation is used in this document:
/// - `step ∈ G`, iff `step` is a marking reached while generating the graph `G`
/// - `a -> b`, iff some transition enabled in `a` yields `b` when fired
/// - `a ->> b`, iff there exists a path (possibly empty) of `->` from `a` to `b`
#[derive(Debug)]
pub struct StepGraph {
    steps: Vec<Step>,
    arcs: Vec<NetArc>,
    initial: StepId,
    index: HashMap<Marking, StepId>,
    map: EdgeMap<usize>,
    reverse: OnceLock<EdgeMap<usize>>,
}

impl StepGraph {
    /// Creates a graph containing only the initial step.
    pub fn new(initial: Step) -> Self {
        let mut res = Self {
            steps: Vec::new(),
            arcs: Vec::new(),
            initial: 0,
            index: HashMap::new(),
            map: EdgeMap::default(),
            reverse: OnceLock::new(),
        };
        res.insert_step(initial);
        res
    }

    /// Inserts `step` unless a step with the same marking exists.
    /// Returns the id of the step and whether it was newly inserted.
    pub fn insert_step(&mut self, step: Step) -> (StepId, bool) {
        if let Some(&existing) = self.index.get(step.marking()) {
            return (existing, false);
        }

        let id = self.map.push_node();
        self.index.insert(step.marking().clone(), id);
        self.steps.push(step);
        self.reverse = OnceLock::new();
        (id, true)
    }

    pub fn add_arc(&mut self, source: StepId, target: StepId, fired: NodeId) {
        let index = self.arcs.len();
        self.arcs.push(NetArc {
            source,
            target,
            fired,
        });
        self.map.add(source, target, index);
        self.reverse = OnceLock::new();
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.steps.shrink_to_fit();
        self.arcs.shrink_to_fit();
        self.map.shrink_to_fit();
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn arcs(&self) -> &[NetArc] {
        &self.arcs
    }

    pub fn initial(&self) -> StepId {
        self.initial
    }

    pub fn initial_step(&self) -> &Step {
        &self.steps[self.initial]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn find(&self, marking: &Marking) -> Option<StepId> {
        self.index.get(marking).copied()
    }

    /// The outgoing arcs of `step`.
    pub fn outgoing(&self, step: StepId) -> impl Iterator<Item = &NetArc> {
        self.map.iter_of(step).map(|&(_, arc)| &self.arcs[arc])
    }

    pub fn successors(&self, step: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.map.iter_edges_of(step)
    }

    /// Transitions that label at least one arc, ie. that fire in some reachable marking.
    pub fn fired_transitions(&self) -> BTreeSet<&NodeId> {
        self.arcs.iter().map(NetArc::fired).collect()
    }

    /// Steps without any enabled transition.
    pub fn final_steps(&self) -> impl Iterator<Item = StepId> + '_ {
        (0..self.steps.len()).filter(|&step| self.map.count_of(step) == 0)
    }

    fn reversed(&self) -> &EdgeMap<usize> {
        self.reverse.get_or_init(|| self.map.reverse())
    }

    /// Returns the greatest set `S ⊂ self` such that `∀ step ∈ S`, `∃ target ∈ self` such that `condition(target)` and `step ->> target`
    pub fn reaches<F>(&self, condition: F) -> HashSet<StepId>
    where
        F: Fn(&Step) -> bool,
    {
        let mut hash_set = HashSet::with_capacity(self.steps.len());
        let mut stack = Vec::new();

        for (id, step) in self.steps.iter().enumerate() {
            if (condition)(step) {
                hash_set.insert(id);
                stack.push(id);
            }
        }

        if hash_set.len() == self.steps.len() {
            return hash_set;
        }

        let reverse = self.reversed();
        while let Some(current) = stack.pop() {
            for antecedent in reverse.iter_edges_of(current) {
                if hash_set.insert(antecedent) {
                    stack.push(antecedent);
                }
            }
        }

        hash_set
    }

    /// Returns true if `∀ step ∈ self`, `∃ target ∈ self` such that `condition(target)` and `step ->> target`
    pub fn always_reaches<F>(&self, condition: F) -> bool
    where
        F: Fn(&Step) -> bool,
    {
        self.reaches(condition).len() == self.steps.len()
    }

    pub fn forall<F>(&self, condition: F) -> bool
    where
        F: Fn(&Step) -> bool,
    {
        self.steps.iter().all(condition)
    }

    #[cfg(feature = "export_dot")]
    pub fn export_dot<W: std::io::Write>(
        &self,
        writer: &mut W,
        format_node: impl Fn(&Step, &mut dot_writer::Node),
        format_edge: impl Fn(&NetArc, &mut dot_writer::AttributesList),
    ) {
        let mut writer = dot_writer::DotWriter::from(writer);

        crate::network::export_dot::export_graph(self, &mut writer, format_node, format_edge);
    }

    #[cfg(feature = "export_dot")]
    pub fn dot_string(&self) -> String {
        use dot_writer::Attributes;

        let mut vec = Vec::new();
        let mut writer = dot_writer::DotWriter::from(&mut vec);

        crate::network::export_dot::export_graph(
            self,
            &mut writer,
            |step, node| {
                let label = step
                    .marked_places()
                    .map(|(id, markers)| {
                        if markers == 1 {
                            id.to_string()
                        } else {
                            format!("{}×{}", id, markers)
                        }
                    })
                    .collect::<Vec<_>>();
                node.set_label(&label.join(", "));
            },
            |arc, edge| {
                edge.set_label(arc.fired().as_str());
            },
        );

        String::from_utf8_lossy(&vec).into_owned()
    }
}
