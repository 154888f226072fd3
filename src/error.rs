use std::io;

use crate::formula::Domain;
use crate::network::NodeId;
use crate::simulator::SimulatorConfigBuilderError;

#[derive(thiserror::Error, Debug)]
pub enum PetriError {
    #[error("Node id '{0}' is used more than once")]
    DuplicateNode(NodeId),
    #[error("Arc '{from}' -> '{to}' references unknown node '{missing}'")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },
    #[error("Arc '{from}' -> '{to}' does not connect a place and a transition")]
    NotBipartite { from: NodeId, to: NodeId },
    #[error("Transition '{0}' does not exist")]
    UnknownTransition(NodeId),
    #[error("Transition '{0}' is not enabled")]
    NotEnabled(NodeId),
    #[error("{expected} formula {formula} cannot be evaluated at {found} node '{node}'")]
    DomainMismatch {
        formula: String,
        expected: Domain,
        found: Domain,
        node: NodeId,
    },
    #[error("Node '{0}' is not part of the evaluated net")]
    NotInNet(NodeId),
    #[error("Resource exhausted: more than {limit} {what}")]
    ResourceExhausted { what: &'static str, limit: usize },
    #[error("Configuration error: {0}")]
    ConfigError(#[from] SimulatorConfigBuilderError),
    #[error("Syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },
    #[error("Filesystem error: {0}")]
    IOError(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PetriError>;
