pub mod error;
pub use error::{PetriError, Result};

pub mod network;
pub use network::{ContextObject, Marking, Node, NodeId, PetriNet, Place, Transition, TransitionKind};

pub mod builder;
pub use builder::{PetriNetBuilder, PetriTransitionBuilder};

pub mod parser;

pub mod graph;
pub use graph::{NetArc, Step, StepGraph, StepId};

pub mod simulator;
pub use simulator::{PathSet, Simulator, SimulatorConfig, SimulatorConfigBuilder};

pub mod formula;
pub use formula::{Domain, Formula, StateFormula, TransitionFormula};

pub mod parallel;
pub use parallel::{n_parallel_transitions_with_condition, ParallelSet};

pub mod prelude {
    pub use crate::builder::PetriNetBuilder;
    pub use crate::error::PetriError;
    pub use crate::formula::{evaluate, Formula, PlaceView, StateFormula, TransitionFormula};
    pub use crate::graph::StepGraph;
    pub use crate::network::{ContextObject, NodeId, PetriNet};
    pub use crate::parallel::{n_parallel_transitions_with_condition, ParallelSet};
    pub use crate::parser::{parse, parse_named};
    pub use crate::simulator::{PathSet, Simulator, SimulatorConfigBuilder};
}
