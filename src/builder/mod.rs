use crate::error::Result;
use crate::network::{Arc, ContextObject, Node, NodeId, PetriNet, Place, Transition};

pub struct PetriNetBuilder {
    pub id: String,
    pub nodes: Vec<Node>,
    pub arcs: Vec<Arc>,
}

pub struct PetriTransitionBuilder<'a> {
    pub builder: &'a mut PetriNetBuilder,
    pub id: NodeId,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
    pub context: Option<ContextObject>,
}

impl PetriNetBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
            arcs: Vec::new(),
        }
    }

    pub fn place(&mut self, id: impl Into<NodeId>, markers: u32) -> NodeId {
        let place = Place::new(id, markers);
        let res = place.id().clone();
        self.nodes.push(place.into());
        res
    }

    pub fn transition(&mut self, id: impl Into<NodeId>) -> NodeId {
        let transition = Transition::new(id);
        let res = transition.id().clone();
        self.nodes.push(transition.into());
        res
    }

    pub fn transition_with_context(
        &mut self,
        id: impl Into<NodeId>,
        context: ContextObject,
    ) -> NodeId {
        let transition = Transition::with_context(id, context);
        let res = transition.id().clone();
        self.nodes.push(transition.into());
        res
    }

    /// Adds an arc; calling this twice for the same pair doubles the arc weight.
    pub fn arc(&mut self, source: &NodeId, target: &NodeId) -> &mut Self {
        self.arcs.push(Arc::new(source, target));

        self
    }

    pub fn begin_transition<'b>(&'b mut self, id: impl Into<NodeId>) -> PetriTransitionBuilder<'b> {
        PetriTransitionBuilder {
            builder: self,
            id: id.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            context: None,
        }
    }

    /// Validates the structure and returns the net.
    pub fn build(self) -> Result<PetriNet> {
        PetriNet::new(self.id, self.nodes, self.arcs)
    }

    pub fn build_clone(&self) -> Result<PetriNet> {
        PetriNet::new(self.id.clone(), self.nodes.clone(), self.arcs.clone())
    }
}

impl<'a> PetriTransitionBuilder<'a> {
    pub fn input(mut self, place: &NodeId) -> Self {
        self.inputs.push(place.clone());

        self
    }

    pub fn output(mut self, place: &NodeId) -> Self {
        self.outputs.push(place.clone());

        self
    }

    pub fn context(mut self, context: ContextObject) -> Self {
        self.context = Some(context);

        self
    }

    pub fn build(self) -> NodeId {
        let id = match self.context {
            Some(context) => self.builder.transition_with_context(self.id, context),
            None => self.builder.transition(self.id),
        };
        for input in self.inputs.iter() {
            self.builder.arc(input, &id);
        }
        for output in self.outputs.iter() {
            self.builder.arc(&id, output);
        }
        id
    }
}
