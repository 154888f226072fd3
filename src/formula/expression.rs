use std::fmt;
use std::sync::Arc;

use crate::network::{ContextObject, NodeId, PetriNet, Place, Transition};

/// A place seen from inside its net, handed to state predicates.
#[derive(Clone, Copy, Debug)]
pub struct PlaceView<'a> {
    place: &'a Place,
    net: &'a PetriNet,
}

impl<'a> PlaceView<'a> {
    pub fn new(place: &'a Place, net: &'a PetriNet) -> Self {
        Self { place, net }
    }

    pub fn id(&self) -> &'a NodeId {
        self.place.id()
    }

    pub fn markers(&self) -> u32 {
        self.place.markers()
    }

    pub fn place(&self) -> &'a Place {
        self.place
    }

    pub fn net(&self) -> &'a PetriNet {
        self.net
    }

    /// No arc leaves the place.
    pub fn is_sink(&self) -> bool {
        self.net.outgoing(self.place.id()).next().is_none()
    }

    /// No arc enters the place.
    pub fn is_source(&self) -> bool {
        self.net.incoming(self.place.id()).next().is_none()
    }

    pub fn outgoing_transitions(&self) -> impl Iterator<Item = &'a Transition> + 'a {
        let net = self.net;
        net.successors(self.place.id())
            .into_iter()
            .filter_map(move |id| net.transition(id))
    }
}

type StatePredicate = dyn Fn(&PlaceView) -> bool + Send + Sync;
type TransitionPredicate = dyn Fn(&ContextObject) -> bool + Send + Sync;

/// A labelled predicate over places.
///
/// Two expressions are equal iff their labels are; the predicates themselves are never compared.
#[derive(Clone)]
pub struct StateExpression {
    label: String,
    predicate: Arc<StatePredicate>,
}

impl StateExpression {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PlaceView) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn test(&self, place: &PlaceView) -> bool {
        (self.predicate)(place)
    }
}

/// A labelled predicate over the context of a transition.
/// Transitions without a context do not satisfy any expression.
#[derive(Clone)]
pub struct TransitionExpression {
    label: String,
    predicate: Arc<TransitionPredicate>,
}

impl TransitionExpression {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ContextObject) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn test(&self, transition: &Transition) -> bool {
        transition.satisfies(|context| (self.predicate)(context))
    }
}

macro_rules! label_identity {
    ($name:ident) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.label == other.label
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.label).finish()
            }
        }
    };
}

label_identity!(StateExpression);
label_identity!(TransitionExpression);

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::PetriNetBuilder;

    #[test]
    fn test_place_view() {
        let mut builder = PetriNetBuilder::new("view");
        let start = builder.place("start", 2);
        let end = builder.place("end", 0);
        builder.begin_transition("t1").input(&start).output(&end).build();
        let net = builder.build().unwrap();

        let view = PlaceView::new(net.place(&start).unwrap(), &net);
        assert_eq!(view.id(), &start);
        assert_eq!(view.markers(), 2);
        assert!(view.is_source());
        assert!(!view.is_sink());
        assert_eq!(
            view.outgoing_transitions().map(|t| t.id().as_str()).collect::<Vec<_>>(),
            vec!["t1"]
        );

        let view = PlaceView::new(net.place(&end).unwrap(), &net);
        assert!(view.is_sink());
        assert_eq!(view.outgoing_transitions().count(), 0);
    }

    #[test]
    fn test_expressions_compare_by_label() {
        let a = TransitionExpression::new("reads data", |c| c.reads("data"));
        let b = TransitionExpression::new("reads data", |_| false);
        let c = TransitionExpression::new("reads", |c| c.reads("data"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{:?}", a), "TransitionExpression(\"reads data\")");
    }

    #[test]
    fn test_transition_expression_needs_context() {
        let any = TransitionExpression::new("any", |_| true);

        assert!(any.test(&Transition::with_context("t", ContextObject::control())));
        assert!(!any.test(&Transition::new("t")));
    }
}
