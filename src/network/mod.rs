use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{PetriError, Result};

pub mod data;
pub use data::{ContextObject, TransitionKind};

#[cfg(feature = "export_dot")]
pub(crate) mod export_dot;

mod transition;
pub use transition::Transition;

/// Token count of every place of a net, keyed by place id.
pub type Marking = BTreeMap<NodeId, u32>;

/// Stable, opaque identifier of a place or transition, for instance `place://start`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Place {
    id: NodeId,
    markers: u32,
}

impl Place {
    pub fn new(id: impl Into<NodeId>, markers: u32) -> Self {
        Self {
            id: id.into(),
            markers,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn markers(&self) -> u32 {
        self.markers
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Place(Place),
    Transition(Transition),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Place(place) => place.id(),
            Node::Transition(transition) => transition.id(),
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Node::Place(place) => Some(place),
            Node::Transition(_) => None,
        }
    }

    pub fn as_transition(&self) -> Option<&Transition> {
        match self {
            Node::Place(_) => None,
            Node::Transition(transition) => Some(transition),
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self, Node::Place(_))
    }
}

impl From<Place> for Node {
    fn from(place: Place) -> Self {
        Node::Place(place)
    }
}

impl From<Transition> for Node {
    fn from(transition: Transition) -> Self {
        Node::Transition(transition)
    }
}

/// A directed arc. Repeated arcs between the same pair of nodes add up to an arc weight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arc {
    source: NodeId,
    target: NodeId,
}

impl Arc {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }
}

/* Invariants:
    ∀ arc ∈ arcs, arc.source ∈ nodes && arc.target ∈ nodes
    ∀ arc ∈ arcs, exactly one of (arc.source, arc.target) is a place
    node ids are unique

    Every value is one marking of one structure: firing returns a new net and
    leaves `self` untouched.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PetriNet {
    id: String,
    nodes: BTreeMap<NodeId, Node>,
    arcs: Vec<Arc>,
}

impl PetriNet {
    pub fn new(
        id: impl Into<String>,
        nodes: impl IntoIterator<Item = Node>,
        arcs: Vec<Arc>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for node in nodes {
            let id = node.id().clone();
            if map.insert(id.clone(), node).is_some() {
                return Err(PetriError::DuplicateNode(id));
            }
        }

        let res = Self {
            id: id.into(),
            nodes: map,
            arcs,
        };
        res.check_arcs()?;
        Ok(res)
    }

    fn check_arcs(&self) -> Result<()> {
        for arc in self.arcs.iter() {
            let lookup = |id: &NodeId| {
                self.nodes.get(id).ok_or_else(|| PetriError::UnknownNode {
                    from: arc.source.clone(),
                    to: arc.target.clone(),
                    missing: id.clone(),
                })
            };
            let source = lookup(&arc.source)?;
            let target = lookup(&arc.target)?;

            if source.is_place() == target.is_place() {
                return Err(PetriError::NotBipartite {
                    from: arc.source.clone(),
                    to: arc.target.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn place(&self, id: &NodeId) -> Option<&Place> {
        self.nodes.get(id).and_then(Node::as_place)
    }

    pub fn transition(&self, id: &NodeId) -> Option<&Transition> {
        self.nodes.get(id).and_then(Node::as_transition)
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.nodes.values().filter_map(Node::as_place)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.nodes.values().filter_map(Node::as_transition)
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Arcs ending at `id`.
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Arc> + '_ {
        let id = id.clone();
        self.arcs.iter().filter(move |arc| arc.target == id)
    }

    /// Arcs starting at `id`.
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Arc> + '_ {
        let id = id.clone();
        self.arcs.iter().filter(move |arc| arc.source == id)
    }

    /// Distinct direct successors of `id`, ignoring arc multiplicity.
    pub fn successors(&self, id: &NodeId) -> BTreeSet<&NodeId> {
        self.outgoing(id).map(Arc::target).collect()
    }

    /// Tokens consumed from each input place when `transition` fires.
    pub fn consumption(&self, transition: &NodeId) -> BTreeMap<&NodeId, u32> {
        let mut res = BTreeMap::new();
        for arc in self.incoming(transition) {
            *res.entry(&arc.source).or_insert(0) += 1;
        }
        res
    }

    /// Tokens produced into each output place when `transition` fires.
    pub fn production(&self, transition: &NodeId) -> BTreeMap<&NodeId, u32> {
        let mut res = BTreeMap::new();
        for arc in self.outgoing(transition) {
            *res.entry(&arc.target).or_insert(0) += 1;
        }
        res
    }

    pub fn marking(&self) -> Marking {
        self.places()
            .map(|place| (place.id.clone(), place.markers))
            .collect()
    }

    /// Returns a copy of this net where the places listed in `marking` carry the given token counts.
    pub fn with_marking(&self, marking: &Marking) -> Self {
        let mut res = self.clone();
        for (id, &markers) in marking {
            if let Some(Node::Place(place)) = res.nodes.get_mut(id) {
                place.markers = markers;
            }
        }
        res
    }

    /// A transition is enabled iff each input place holds at least as many tokens as it has arcs into the transition.
    pub fn is_enabled(&self, transition: &NodeId) -> bool {
        if self.transition(transition).is_none() {
            return false;
        }

        self.consumption(transition)
            .into_iter()
            .all(|(place, weight)| self.place(place).is_some_and(|p| p.markers >= weight))
    }

    /// The transitions enabled in the current marking. Consumers must not rely on the order.
    pub fn enabled_transitions(&self) -> Vec<&Transition> {
        self.transitions()
            .filter(|transition| self.is_enabled(transition.id()))
            .collect()
    }

    /// Fires `transition`, returning the successor marking as a new net.
    pub fn fire(&self, transition: &NodeId) -> Result<Self> {
        if self.transition(transition).is_none() {
            return Err(PetriError::UnknownTransition(transition.clone()));
        }
        if !self.is_enabled(transition) {
            return Err(PetriError::NotEnabled(transition.clone()));
        }

        let mut res = self.clone();
        for arc in self.arcs.iter() {
            if arc.target == *transition {
                if let Some(Node::Place(place)) = res.nodes.get_mut(&arc.source) {
                    place.markers -= 1;
                }
            }
            if arc.source == *transition {
                if let Some(Node::Place(place)) = res.nodes.get_mut(&arc.target) {
                    place.markers += 1;
                }
            }
        }
        Ok(res)
    }

    #[cfg(feature = "export_dot")]
    pub fn export_dot<W: std::io::Write>(&self, writer: &mut W) {
        let mut writer = dot_writer::DotWriter::from(writer);

        export_dot::export_network(self, &mut writer);
    }

    #[cfg(feature = "export_dot")]
    pub fn dot_string(&self) -> String {
        let mut vec = Vec::new();
        let mut writer = dot_writer::DotWriter::from(&mut vec);

        export_dot::export_network(self, &mut writer);

        String::from_utf8_lossy(&vec).into_owned()
    }
}
