use std::path::Path;

use petri_checker::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), PetriError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("Usage: petri_checker <net.petri> [output directory]");
        std::process::exit(2);
    };
    let output = args.next();

    let name = Path::new(&input)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("net"));
    let net = parse_named(name, &std::fs::read_to_string(&input)?)?;

    let simulator = Simulator::default();
    let graph = simulator.build_step_graph(&net)?;
    let paths = simulator.get_all_paths(&graph)?;
    let unfolded = simulator.get_unfolded_petri_net(&net)?;
    let unfolded_graph = simulator.build_step_graph(&unfolded)?;
    let parallel_sets = simulator.get_parallel_sets(&unfolded_graph);

    let largest = parallel_sets.iter().map(ParallelSet::len).max().unwrap_or(0);
    info!(net = net.id(), "Explored net.");
    println!("steps:          {}", graph.len());
    println!("arcs:           {}", graph.arcs().len());
    println!("final steps:    {}", graph.final_steps().count());
    println!("step paths:     {}", paths.step_paths().len());
    println!("node paths:     {}", paths.node_paths().len());
    println!("parallel sets:  {} (largest: {})", parallel_sets.len(), largest);

    if let Some(directory) = output {
        export(&net, &graph, Path::new(&directory))?;
    }

    Ok(())
}

#[cfg(feature = "export_dot")]
fn export(net: &PetriNet, graph: &StepGraph, directory: &Path) -> Result<(), PetriError> {
    use dot_writer::Attributes;

    std::fs::write(directory.join(format!("{}.dot", net.id())), net.dot_string())?;

    let finals = graph.final_steps().collect::<std::collections::HashSet<_>>();
    let mut output = std::fs::File::create(directory.join(format!("{}_graph.dot", net.id())))?;
    graph.export_dot(
        &mut output,
        |step, dot_node| {
            let label = step
                .marked_places()
                .map(|(id, markers)| format!("{}:{}", id, markers))
                .collect::<Vec<_>>();
            dot_node.set_label(&label.join("\\n"));
            if graph.find(step.marking()).is_some_and(|id| finals.contains(&id)) {
                dot_node.set("color", "red", true);
            }
        },
        |arc, dot_edge| {
            dot_edge.set_label(arc.fired().as_str());
        },
    );
    info!(directory = %directory.display(), "Wrote dot files.");

    Ok(())
}

#[cfg(not(feature = "export_dot"))]
fn export(_net: &PetriNet, _graph: &StepGraph, _directory: &Path) -> Result<(), PetriError> {
    tracing::warn!("Built without the export_dot feature, skipping dot output.");
    Ok(())
}
