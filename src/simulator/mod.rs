use derive_builder::Builder;

mod concurrency;
mod explore;
mod paths;
mod unfold;

pub use paths::{NodePath, PathSet, StepPath};
pub use unfold::UNFOLDED_COPY_SEPARATOR;

/// Limits applied while exploring a net. Nets are expected to be bounded; the limits turn
/// an accidental state explosion into a [`PetriError::ResourceExhausted`](crate::error::PetriError::ResourceExhausted).
#[derive(Builder, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Maximum number of distinct markings a step graph may contain.
    #[builder(setter(strip_option), default)]
    pub max_steps: Option<usize>,
    /// Maximum number of paths of each kind a path set may contain.
    #[builder(setter(strip_option), default)]
    pub max_paths: Option<usize>,
}

/// Explores petri nets: step graphs, paths, unfolding and parallel transition sets.
/// A simulator holds no state besides its configuration and can be shared between threads.
#[derive(Clone, Debug, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}
