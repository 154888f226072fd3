use super::{
    at, check_domain, exist_until, exists_successor, forall_next, render, Domain, Formula, PlaceView,
    StateExpression, TransitionFormula,
};
use crate::error::Result;
use crate::network::{Node, NodeId};
use crate::simulator::PathSet;

/// A formula evaluated at places.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateFormula {
    True,
    False,
    Expression(StateExpression),
    And(Box<StateFormula>, Box<StateFormula>),
    Or(Box<StateFormula>, Box<StateFormula>),
    Not(Box<StateFormula>),
    ExistUntil(Box<StateFormula>, Box<StateFormula>),
    ForallNext(Box<StateFormula>),
    Ev(Box<StateFormula>),
    Pos(Box<StateFormula>),
    Along(Box<StateFormula>),
    /// Some transition following the place satisfies the embedded formula.
    Modal(Box<TransitionFormula>),
}

impl StateFormula {
    pub fn expression<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&PlaceView) -> bool + Send + Sync + 'static,
    {
        StateFormula::Expression(StateExpression::new(label, predicate))
    }

    pub fn and(left: StateFormula, right: StateFormula) -> Self {
        StateFormula::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: StateFormula, right: StateFormula) -> Self {
        StateFormula::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: StateFormula) -> Self {
        StateFormula::Not(Box::new(inner))
    }

    pub fn exist_until(hold: StateFormula, until: StateFormula) -> Self {
        StateFormula::ExistUntil(Box::new(hold), Box::new(until))
    }

    pub fn forall_next(inner: StateFormula) -> Self {
        StateFormula::ForallNext(Box::new(inner))
    }

    pub fn ev(inner: StateFormula) -> Self {
        StateFormula::Ev(Box::new(inner))
    }

    pub fn pos(inner: StateFormula) -> Self {
        StateFormula::Pos(Box::new(inner))
    }

    pub fn along(inner: StateFormula) -> Self {
        StateFormula::Along(Box::new(inner))
    }

    pub fn modal(inner: TransitionFormula) -> Self {
        StateFormula::Modal(Box::new(inner))
    }

    /// Rewrites every derived operator of the tree into `ExistUntil`, `Not`, `And`, `Or` and `Modal`.
    pub fn to_primitive(&self) -> StateFormula {
        use StateFormula::*;

        match self {
            True => True,
            False => False,
            Expression(expression) => Expression(expression.clone()),
            And(left, right) => Self::and(left.to_primitive(), right.to_primitive()),
            Or(left, right) => Self::or(left.to_primitive(), right.to_primitive()),
            Not(inner) => Self::not(inner.to_primitive()),
            ExistUntil(hold, until) => Self::exist_until(hold.to_primitive(), until.to_primitive()),
            ForallNext(inner) => Self::forall_next(inner.to_primitive()),
            Ev(inner) | Pos(inner) => Self::exist_until(True, inner.to_primitive()),
            Along(inner) => Self::not(Self::exist_until(True, Self::not(inner.to_primitive()))),
            Modal(inner) => Self::modal(inner.to_primitive()),
        }
    }
}

impl Formula for StateFormula {
    fn domain(&self) -> Domain {
        Domain::State
    }

    fn evaluate(&self, node: &NodeId, paths: &PathSet) -> Result<bool> {
        use StateFormula::*;

        let found = check_domain(self, node, paths)?;
        match self {
            True => Ok(true),
            False => Ok(false),
            Expression(expression) => Ok(match found {
                Node::Place(place) => expression.test(&PlaceView::new(place, paths.net())),
                Node::Transition(_) => false,
            }),
            And(left, right) => Ok(left.evaluate(node, paths)? && right.evaluate(node, paths)?),
            Or(left, right) => Ok(left.evaluate(node, paths)? || right.evaluate(node, paths)?),
            Not(inner) => Ok(!inner.evaluate(node, paths)?),
            ExistUntil(hold, until) => exist_until(
                node,
                paths,
                at(hold.as_ref(), paths),
                at(until.as_ref(), paths),
            ),
            ForallNext(inner) => forall_next(node, paths, at(inner.as_ref(), paths)),
            Ev(inner) | Pos(inner) => {
                exist_until(node, paths, |_| Ok(true), at(inner.as_ref(), paths))
            }
            Along(inner) => {
                let violated = |id: &NodeId| -> Result<bool> { Ok(!inner.evaluate(id, paths)?) };
                Ok(!exist_until(node, paths, |_| Ok(true), violated)?)
            }
            Modal(inner) => exists_successor(node, paths, at(inner.as_ref(), paths)),
        }
    }

    fn symbol(&self) -> &'static str {
        use StateFormula::*;

        match self {
            True => "TT",
            False => "FF",
            Expression(_) => "NF",
            And(..) => "AND",
            Or(..) => "OR",
            Not(_) => "NOT",
            ExistUntil(..) => "EXIST_UNTIL",
            ForallNext(_) => "FORALL_NEXT",
            Ev(_) => "EV",
            Pos(_) => "POS",
            Along(_) => "ALONG",
            Modal(_) => "MODAL",
        }
    }

    fn write_formula(&self) -> String {
        use StateFormula::*;

        match self {
            True | False => self.symbol().to_string(),
            Expression(expression) => render(self.symbol(), &[expression.label().to_string()]),
            And(left, right) | Or(left, right) | ExistUntil(left, right) => {
                render(self.symbol(), &[left.write_formula(), right.write_formula()])
            }
            Not(inner) | ForallNext(inner) | Ev(inner) | Pos(inner) | Along(inner) => {
                render(self.symbol(), &[inner.write_formula()])
            }
            Modal(inner) => render(self.symbol(), &[inner.write_formula()]),
        }
    }
}
