use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::Simulator;
use crate::error::{PetriError, Result};
use crate::graph::{StepGraph, StepId};
use crate::network::{Node, NodeId, PetriNet};

/// A sequence of steps starting at the initial step of a graph.
pub type StepPath = Vec<StepId>;
/// An alternating sequence of places and transitions.
pub type NodePath = Vec<NodeId>;

/// All paths of an explored net.
///
/// Paths end either at an element without successors, or at the first element that already occurs
/// earlier on the same path; that repeated element closes the path and is not expanded further.
#[derive(Clone, Debug)]
pub struct PathSet {
    net: PetriNet,
    step_paths: Vec<StepPath>,
    node_paths: Vec<NodePath>,
    by_start: HashMap<NodeId, Vec<usize>>,
}

impl PathSet {
    pub fn new(net: PetriNet, step_paths: Vec<StepPath>, node_paths: Vec<NodePath>) -> Self {
        let mut by_start: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (index, path) in node_paths.iter().enumerate() {
            if let Some(start) = path.first() {
                by_start.entry(start.clone()).or_default().push(index);
            }
        }

        Self {
            net,
            step_paths,
            node_paths,
            by_start,
        }
    }

    /// The net whose nodes the node paths range over.
    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    /// Paths through the step graph, starting at its initial step.
    pub fn step_paths(&self) -> &[StepPath] {
        &self.step_paths
    }

    /// Paths through the live structure of the net, starting at every live node.
    pub fn node_paths(&self) -> &[NodePath] {
        &self.node_paths
    }

    /// The node paths whose first element is `node`.
    pub fn paths_from(&self, node: &NodeId) -> impl Iterator<Item = &NodePath> {
        self.by_start
            .get(node)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&index| &self.node_paths[index]))
    }

    /// The distinct direct successors of `node` along the node paths.
    pub fn successors(&self, node: &NodeId) -> BTreeSet<&NodeId> {
        self.paths_from(node).filter_map(|path| path.get(1)).collect()
    }
}

impl Simulator {
    /// Enumerates the paths of `graph`.
    ///
    /// Step paths start at the initial step. Node paths are built over the places of the net
    /// and the transitions which fire at least once in `graph`; every such node starts paths.
    /// Both sets are exponential in the worst case.
    #[tracing::instrument(level = "debug", skip_all, fields(steps = graph.len()))]
    pub fn get_all_paths(&self, graph: &StepGraph) -> Result<PathSet> {
        let mut step_paths = Vec::new();
        enumerate_paths(
            graph.initial(),
            |&step| graph.successors(step).collect::<BTreeSet<_>>(),
            self.config.max_paths,
            &mut step_paths,
        )?;

        let net = graph.initial_step().net();
        let live = graph.fired_transitions();
        let is_live = |id: &NodeId| match net.node(id) {
            Some(Node::Place(_)) => true,
            Some(Node::Transition(_)) => live.contains(id),
            None => false,
        };

        let mut node_paths = Vec::new();
        for node in net.nodes().map(Node::id).filter(|id| is_live(*id)) {
            enumerate_paths(
                node.clone(),
                |id| {
                    net.successors(id)
                        .into_iter()
                        .filter(|next| is_live(*next))
                        .cloned()
                        .collect()
                },
                self.config.max_paths,
                &mut node_paths,
            )?;
        }

        debug!(
            step_paths = step_paths.len(),
            node_paths = node_paths.len(),
            "Enumerated paths."
        );
        Ok(PathSet::new(net.clone(), step_paths, node_paths))
    }
}

/// Depth-first enumeration of every maximal path starting at `start`, appended to `res`.
fn enumerate_paths<N, F>(start: N, successors: F, limit: Option<usize>, res: &mut Vec<Vec<N>>) -> Result<()>
where
    N: Clone + PartialEq,
    F: Fn(&N) -> BTreeSet<N>,
{
    let push = |path: Vec<N>, res: &mut Vec<Vec<N>>| {
        res.push(path);
        match limit {
            Some(limit) if res.len() > limit => Err(PetriError::ResourceExhausted {
                what: "paths",
                limit,
            }),
            _ => Ok(()),
        }
    };

    let mut stack = vec![vec![start]];
    while let Some(path) = stack.pop() {
        let Some(last) = path.last() else {
            continue;
        };
        let next = (successors)(last);

        if next.is_empty() {
            push(path, res)?;
            continue;
        }

        for node in next.into_iter().rev() {
            let closes_cycle = path.contains(&node);
            let mut extended = path.clone();
            extended.push(node);

            if closes_cycle {
                push(extended, res)?;
            } else {
                stack.push(extended);
            }
        }
    }

    Ok(())
}
