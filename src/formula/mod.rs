/*!
Two-sorted branching-time formulas over the paths of a net.

[`StateFormula`]s are evaluated at places and [`TransitionFormula`]s at transitions. `Modal` bridges
the two domains. Paths alternate between places and transitions, so along a path the positions of a
formula's own domain are the even offsets from its start.

Derived operators are rewritten into `ExistUntil`, `Not`, `And`, `Or` and `Modal` before evaluation:
- `Ev(p)` and `Pos(p)` are `ExistUntil(TT, p)`
- `Along(p)` is `Not(Ev(Not(p)))`
- `ExistModal(p1, p2)` is the transition formula `Modal(And(p1, Modal(p2)))`
*/

use std::fmt;

use tracing::debug;

use crate::error::{PetriError, Result};
use crate::network::{Node, NodeId};
use crate::simulator::PathSet;

mod expression;
pub use expression::{PlaceView, StateExpression, TransitionExpression};

mod state;
pub use state::StateFormula;

mod transition;
pub use transition::TransitionFormula;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    State,
    Transition,
}

impl Domain {
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Place(_) => Domain::State,
            Node::Transition(_) => Domain::Transition,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::State => write!(f, "state"),
            Domain::Transition => write!(f, "transition"),
        }
    }
}

pub trait Formula {
    /// The kind of node this formula is evaluated at.
    fn domain(&self) -> Domain;

    /// Evaluates the formula at `node` over `paths`.
    ///
    /// Fails with [`PetriError::NotInNet`] if `node` is not a node of the path set's net, and with
    /// [`PetriError::DomainMismatch`] if `node` belongs to the other domain.
    fn evaluate(&self, node: &NodeId, paths: &PathSet) -> Result<bool>;

    /// The name of the outermost operator.
    fn symbol(&self) -> &'static str;

    /// Fully parenthesized rendering of the tree, as in `EXIST_UNTIL(TT, AF(reads data))`.
    fn write_formula(&self) -> String;
}

/// Evaluates `formula` at `node`, logging the formula and its verdict.
pub fn evaluate<F: Formula>(formula: &F, node: &NodeId, paths: &PathSet) -> Result<bool> {
    let res = formula.evaluate(node, paths)?;
    debug!(formula = %formula.write_formula(), node = %node, res, "Evaluated formula.");
    Ok(res)
}

/// Looks `node` up in the path set's net and checks that `formula` may be evaluated there.
fn check_domain<'a, F: Formula>(formula: &F, node: &NodeId, paths: &'a PathSet) -> Result<&'a Node> {
    let found = paths
        .net()
        .node(node)
        .ok_or_else(|| PetriError::NotInNet(node.clone()))?;

    let found_domain = Domain::of(found);
    if found_domain != formula.domain() {
        return Err(PetriError::DomainMismatch {
            formula: formula.write_formula(),
            expected: formula.domain(),
            found: found_domain,
            node: node.clone(),
        });
    }

    Ok(found)
}

/// `formula` as a predicate over nodes.
fn at<'a, F: Formula>(formula: &'a F, paths: &'a PathSet) -> impl Fn(&NodeId) -> Result<bool> + 'a {
    move |id: &NodeId| formula.evaluate(id, paths)
}

fn render(symbol: &str, children: &[String]) -> String {
    format!("{}({})", symbol, children.join(", "))
}

/// Some path from `node` reaches a same-domain position where `until` holds,
/// with `hold` holding at every same-domain position before it.
fn exist_until<P, Q>(node: &NodeId, paths: &PathSet, hold: P, until: Q) -> Result<bool>
where
    P: Fn(&NodeId) -> Result<bool>,
    Q: Fn(&NodeId) -> Result<bool>,
{
    for path in paths.paths_from(node) {
        for id in path.iter().step_by(2) {
            if (until)(id)? {
                return Ok(true);
            }
            if !(hold)(id)? {
                break;
            }
        }
    }
    Ok(false)
}

/// Every path from `node` that reaches a next same-domain position satisfies `next` there.
fn forall_next<P>(node: &NodeId, paths: &PathSet, next: P) -> Result<bool>
where
    P: Fn(&NodeId) -> Result<bool>,
{
    for path in paths.paths_from(node) {
        if let Some(id) = path.get(2) {
            if !(next)(id)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Some direct successor of `node`, which lies in the other domain, satisfies `condition`.
fn exists_successor<P>(node: &NodeId, paths: &PathSet, condition: P) -> Result<bool>
where
    P: Fn(&NodeId) -> Result<bool>,
{
    for successor in paths.successors(node) {
        if (condition)(successor)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::PetriNetBuilder;
    use crate::network::{ContextObject, PetriNet};
    use crate::simulator::Simulator;

    fn route() -> PetriNet {
        let mut builder = PetriNetBuilder::new("route");
        let start = builder.place("start", 1);
        let mid = builder.place("mid", 0);
        let end = builder.place("end", 0);
        let never = builder.place("never", 0);
        builder
            .begin_transition("read")
            .input(&start)
            .output(&mid)
            .context(ContextObject::app().read("data"))
            .build();
        builder
            .begin_transition("anonymize")
            .input(&mid)
            .output(&end)
            .context(ContextObject::app().read("data").write("anon").erase("data"))
            .build();
        builder
            .begin_transition("leak")
            .input(&mid)
            .input(&never)
            .output(&end)
            .context(ContextObject::app().write("data"))
            .build();
        builder.build().unwrap()
    }

    fn paths_of(net: &PetriNet) -> PathSet {
        let simulator = Simulator::default();
        let graph = simulator.build_step_graph(net).unwrap();
        simulator.get_all_paths(&graph).unwrap()
    }

    fn places(paths: &PathSet) -> Vec<NodeId> {
        paths.net().places().map(|p| p.id().clone()).collect()
    }

    fn state_predicates() -> Vec<StateFormula> {
        vec![
            StateFormula::True,
            StateFormula::False,
            StateFormula::expression("sink", |p| p.is_sink()),
            StateFormula::expression("marked", |p| p.markers() > 0),
            StateFormula::modal(TransitionFormula::expression("erases data", |c| c.erases("data"))),
        ]
    }

    fn reads_data() -> TransitionFormula {
        TransitionFormula::expression("reads data", |c| c.reads("data"))
    }

    #[test]
    fn test_pos_and_ev_are_exist_until_true() {
        let paths = paths_of(&route());

        for p in state_predicates() {
            let pos = StateFormula::pos(p.clone());
            let ev = StateFormula::ev(p.clone());
            let until = StateFormula::exist_until(StateFormula::True, p.clone());
            assert_eq!(pos.to_primitive(), until);

            for node in places(&paths) {
                let expected = until.evaluate(&node, &paths).unwrap();
                assert_eq!(pos.evaluate(&node, &paths).unwrap(), expected, "{}", node);
                assert_eq!(ev.evaluate(&node, &paths).unwrap(), expected, "{}", node);
            }
        }
    }

    #[test]
    fn test_along_is_not_ev_not() {
        let paths = paths_of(&route());

        for p in state_predicates() {
            let along = StateFormula::along(p.clone());
            let rewritten = StateFormula::not(StateFormula::ev(StateFormula::not(p.clone())));
            assert_eq!(along.to_primitive(), rewritten.to_primitive());

            for node in places(&paths) {
                assert_eq!(
                    along.evaluate(&node, &paths).unwrap(),
                    rewritten.evaluate(&node, &paths).unwrap(),
                    "{}",
                    node
                );
            }
        }
    }

    #[test]
    fn test_exist_until() {
        let paths = paths_of(&route());
        let start = NodeId::from("start");
        let sink = StateFormula::expression("sink", |p| p.is_sink());

        assert!(StateFormula::ev(sink.clone()).evaluate(&start, &paths).unwrap());
        let not_sink = StateFormula::not(sink.clone());
        assert!(StateFormula::exist_until(not_sink, sink.clone())
            .evaluate(&start, &paths)
            .unwrap());
        assert!(!StateFormula::exist_until(StateFormula::False, sink)
            .evaluate(&start, &paths)
            .unwrap());
    }

    #[test]
    fn test_terminal_nodes() {
        let paths = paths_of(&route());
        let end = NodeId::from("end");
        let source = StateFormula::expression("source", |p| p.is_source());

        assert!(!StateFormula::ev(source.clone()).evaluate(&end, &paths).unwrap());
        assert!(StateFormula::along(StateFormula::not(source)).evaluate(&end, &paths).unwrap());
        assert!(StateFormula::forall_next(StateFormula::False).evaluate(&end, &paths).unwrap());
        assert!(!StateFormula::forall_next(StateFormula::False)
            .evaluate(&NodeId::from("start"), &paths)
            .unwrap());
        assert!(!StateFormula::modal(TransitionFormula::True).evaluate(&end, &paths).unwrap());

        // `leak` never fires, so no path starts there
        let leak = NodeId::from("leak");
        assert!(!TransitionFormula::ev(TransitionFormula::True).evaluate(&leak, &paths).unwrap());
        assert!(TransitionFormula::along(TransitionFormula::False).evaluate(&leak, &paths).unwrap());
    }

    #[test]
    fn test_modal_bridges_domains() {
        let paths = paths_of(&route());
        let formula = StateFormula::modal(TransitionFormula::pos(reads_data()));

        assert!(formula.evaluate(&NodeId::from("start"), &paths).unwrap());
        // `anonymize` reads data too
        assert!(formula.evaluate(&NodeId::from("mid"), &paths).unwrap());
        assert!(!formula.evaluate(&NodeId::from("end"), &paths).unwrap());

        let writes_data = TransitionFormula::expression("writes data", |c| c.writes("data"));
        let formula = StateFormula::modal(writes_data);
        assert!(!formula.evaluate(&NodeId::from("mid"), &paths).unwrap());
    }

    #[test]
    fn test_transition_path_operators() {
        let paths = paths_of(&route());
        let read = NodeId::from("read");
        let erases = TransitionFormula::expression("erases data", |c| c.erases("data"));

        assert!(TransitionFormula::ev(erases.clone()).evaluate(&read, &paths).unwrap());
        assert!(TransitionFormula::forall_next(erases.clone())
            .evaluate(&read, &paths)
            .unwrap());
        assert!(TransitionFormula::along(reads_data()).evaluate(&read, &paths).unwrap());
        assert!(!TransitionFormula::along(erases.clone()).evaluate(&read, &paths).unwrap());
        assert!(TransitionFormula::exist_until(reads_data(), erases)
            .evaluate(&read, &paths)
            .unwrap());
    }

    #[test]
    fn test_exist_modal() {
        let paths = paths_of(&route());
        let read = NodeId::from("read");
        let empty = StateFormula::expression("empty", |p| p.markers() == 0);
        let erases = TransitionFormula::expression("erases data", |c| c.erases("data"));

        let formula = TransitionFormula::exist_modal(empty.clone(), erases.clone());
        assert_eq!(
            formula.to_primitive(),
            TransitionFormula::modal(StateFormula::and(
                empty.clone(),
                StateFormula::modal(erases.clone())
            ))
        );
        assert!(formula.evaluate(&read, &paths).unwrap());
        assert_eq!(
            formula.evaluate(&NodeId::from("anonymize"), &paths).unwrap(),
            formula.to_primitive().evaluate(&NodeId::from("anonymize"), &paths).unwrap()
        );

        let formula = TransitionFormula::exist_modal(StateFormula::not(empty), erases);
        assert!(!formula.evaluate(&read, &paths).unwrap());
    }

    #[test]
    fn test_domain_mismatch() {
        let paths = paths_of(&route());

        match StateFormula::True.evaluate(&NodeId::from("read"), &paths) {
            Err(PetriError::DomainMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, Domain::State);
                assert_eq!(found, Domain::Transition);
            }
            other => panic!("Expected a domain mismatch, got {:?}", other),
        }

        assert!(matches!(
            reads_data().evaluate(&NodeId::from("start"), &paths),
            Err(PetriError::DomainMismatch { .. })
        ));
        // Modal switches the domain of its operand
        let nested = StateFormula::modal(TransitionFormula::modal(StateFormula::True));
        assert!(nested.evaluate(&NodeId::from("start"), &paths).unwrap());
        assert!(matches!(
            StateFormula::True.evaluate(&NodeId::from("elsewhere"), &paths),
            Err(PetriError::NotInNet(_))
        ));
    }

    #[test]
    fn test_write_formula() {
        let sink = StateFormula::expression("sink", |p| p.is_sink());
        let formula = StateFormula::and(
            StateFormula::exist_until(StateFormula::True, StateFormula::not(sink.clone())),
            StateFormula::modal(TransitionFormula::exist_modal(sink, reads_data())),
        );

        let expected = "AND(EXIST_UNTIL(TT, NOT(NF(sink))), MODAL(EXIST_MODAL(NF(sink), AF(reads data))))";
        assert_eq!(formula.write_formula(), expected);
        assert_eq!(formula.clone().write_formula(), expected);
        assert_eq!(formula.symbol(), "AND");
        assert_eq!(TransitionFormula::False.write_formula(), "FF");

        // Labels are the caller's responsibility
        let same = StateFormula::expression("marked", |p| p.markers() > 0);
        let renamed = StateFormula::expression("has tokens", |p| p.markers() > 0);
        assert_ne!(same.write_formula(), renamed.write_formula());
        assert_ne!(same, renamed);
    }

    #[test]
    fn test_cyclic_paths() {
        let mut builder = PetriNetBuilder::new("cycle");
        let a = builder.place("a", 1);
        let b = builder.place("b", 0);
        builder.begin_transition("forth").input(&a).output(&b).build();
        builder.begin_transition("back").input(&b).output(&a).build();
        let paths = paths_of(&builder.build().unwrap());

        let is_b = StateFormula::expression("is b", |p| p.id().as_str() == "b");
        assert!(StateFormula::ev(is_b.clone()).evaluate(&a, &paths).unwrap());
        assert!(!StateFormula::along(is_b).evaluate(&a, &paths).unwrap());
        assert!(evaluate(
            &StateFormula::along(StateFormula::expression("bounded", |p| p.markers() <= 1)),
            &a,
            &paths
        )
        .unwrap());
    }
}
