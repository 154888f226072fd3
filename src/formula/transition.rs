use super::{
    at, check_domain, exist_until, exists_successor, forall_next, render, Domain, Formula,
    StateFormula, TransitionExpression,
};
use crate::error::Result;
use crate::network::{ContextObject, Node, NodeId};
use crate::simulator::PathSet;

/// A formula evaluated at transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionFormula {
    True,
    False,
    Expression(TransitionExpression),
    And(Box<TransitionFormula>, Box<TransitionFormula>),
    Or(Box<TransitionFormula>, Box<TransitionFormula>),
    Not(Box<TransitionFormula>),
    ExistUntil(Box<TransitionFormula>, Box<TransitionFormula>),
    ForallNext(Box<TransitionFormula>),
    Ev(Box<TransitionFormula>),
    Pos(Box<TransitionFormula>),
    Along(Box<TransitionFormula>),
    /// Some place following the transition satisfies the embedded formula.
    Modal(Box<StateFormula>),
    /// Some place following the transition satisfies the state formula and is itself followed
    /// by a transition satisfying the transition formula.
    ///
    /// This is a transition formula, evaluated at the transition before the place. To ask the same
    /// of a place, use `StateFormula::and(p1, StateFormula::modal(t2))`.
    ExistModal(Box<StateFormula>, Box<TransitionFormula>),
}

impl TransitionFormula {
    pub fn expression<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ContextObject) -> bool + Send + Sync + 'static,
    {
        TransitionFormula::Expression(TransitionExpression::new(label, predicate))
    }

    pub fn and(left: TransitionFormula, right: TransitionFormula) -> Self {
        TransitionFormula::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: TransitionFormula, right: TransitionFormula) -> Self {
        TransitionFormula::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: TransitionFormula) -> Self {
        TransitionFormula::Not(Box::new(inner))
    }

    pub fn exist_until(hold: TransitionFormula, until: TransitionFormula) -> Self {
        TransitionFormula::ExistUntil(Box::new(hold), Box::new(until))
    }

    pub fn forall_next(inner: TransitionFormula) -> Self {
        TransitionFormula::ForallNext(Box::new(inner))
    }

    pub fn ev(inner: TransitionFormula) -> Self {
        TransitionFormula::Ev(Box::new(inner))
    }

    pub fn pos(inner: TransitionFormula) -> Self {
        TransitionFormula::Pos(Box::new(inner))
    }

    pub fn along(inner: TransitionFormula) -> Self {
        TransitionFormula::Along(Box::new(inner))
    }

    pub fn modal(inner: StateFormula) -> Self {
        TransitionFormula::Modal(Box::new(inner))
    }

    pub fn exist_modal(state: StateFormula, next: TransitionFormula) -> Self {
        TransitionFormula::ExistModal(Box::new(state), Box::new(next))
    }

    /// Rewrites every derived operator of the tree into `ExistUntil`, `Not`, `And`, `Or` and `Modal`.
    pub fn to_primitive(&self) -> TransitionFormula {
        use TransitionFormula::*;

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
            ExistModal(state, next) => Self::modal(StateFormula::and(
                state.to_primitive(),
                StateFormula::modal(next.to_primitive()),
            )),
        }
    }
}

impl Formula for TransitionFormula {
    fn domain(&self) -> Domain {
        Domain::Transition
    }

    fn evaluate(&self, node: &NodeId, paths: &PathSet) -> Result<bool> {
        use TransitionFormula::*;

        let found = check_domain(self, node, paths)?;
        match self {
            True => Ok(true),
            False => Ok(false),
            Expression(expression) => Ok(match found {
                Node::Transition(transition) => expression.test(transition),
                Node::Place(_) => false,
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
            ExistModal(..) => self.to_primitive().evaluate(node, paths),
        }
    }

    fn symbol(&self) -> &'static str {
        use TransitionFormula::*;

        match self {
            True => "TT",
            False => "FF",
            Expression(_) => "AF",
            And(..) => "AND",
            Or(..) => "OR",
            Not(_) => "NOT",
            ExistUntil(..) => "EXIST_UNTIL",
            ForallNext(_) => "FORALL_NEXT",
            Ev(_) => "EV",
            Pos(_) => "POS",
            Along(_) => "ALONG",
            Modal(_) => "MODAL",
            ExistModal(..) => "EXIST_MODAL",
        }
    }

    fn write_formula(&self) -> String {
        use TransitionFormula::*;

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
            ExistModal(state, next) => {
                render(self.symbol(), &[state.write_formula(), next.write_formula()])
            }
        }
    }
}
