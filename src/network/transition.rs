use super::{ContextObject, NodeId};

/// A transition of the net, optionally annotated with the data-flow effect of the route step it models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    id: NodeId,
    context: Option<ContextObject>,
}

impl Transition {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            context: None,
        }
    }

    pub fn with_context(id: impl Into<NodeId>, context: ContextObject) -> Self {
        Self {
            id: id.into(),
            context: Some(context),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn context(&self) -> Option<&ContextObject> {
        self.context.as_ref()
    }

    /// Returns true if the transition carries a context and `predicate` holds for it.
    /// Transitions without a context never satisfy a predicate.
    #[inline]
    pub fn satisfies<F>(&self, predicate: F) -> bool
    where
        F: FnOnce(&ContextObject) -> bool,
    {
        self.context.as_ref().is_some_and(predicate)
    }

    pub(crate) fn renamed(&self, id: NodeId) -> Self {
        Self {
            id,
            context: self.context.clone(),
        }
    }
}
