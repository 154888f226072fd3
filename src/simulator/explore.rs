use std::collections::VecDeque;

use tracing::{debug, trace};

use super::Simulator;
use crate::error::{PetriError, Result};
use crate::graph::{Step, StepGraph};
use crate::network::PetriNet;

impl Simulator {
    /// Breadth-first exploration of every marking reachable from `initial`.
    ///
    /// Each distinct marking becomes exactly one step; firing into an already known marking
    /// only records the arc. Terminates iff the net has finitely many reachable markings,
    /// unless `max_steps` is configured.
    #[tracing::instrument(level = "debug", skip_all, fields(net = initial.id()))]
    pub fn build_step_graph(&self, initial: &PetriNet) -> Result<StepGraph> {
        let mut graph = StepGraph::new(Step::new(initial.clone()));
        let mut frontier = VecDeque::from([graph.initial()]);

        while let Some(current) = frontier.pop_front() {
            let net = graph.steps()[current].net().clone();

            for transition in net.enabled_transitions() {
                let next = net.fire(transition.id())?;
                let (target, inserted) = graph.insert_step(Step::new(next));

                if inserted {
                    if let Some(limit) = self.config.max_steps {
                        if graph.len() > limit {
                            return Err(PetriError::ResourceExhausted {
                                what: "reachable markings",
                                limit,
                            });
                        }
                    }
                    frontier.push_back(target);
                }

                trace!(source = current, target, transition = %transition.id(), "Fired.");
                graph.add_arc(current, target, transition.id().clone());
            }
        }

        graph.shrink_to_fit();
        debug!(
            steps = graph.len(),
            arcs = graph.arcs().len(),
            "Built step graph."
        );
        Ok(graph)
    }
}
