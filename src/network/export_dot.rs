use std::collections::BTreeMap;

use dot_writer::{Attributes, AttributesList, DotWriter, Shape, Style};

use super::*;
use crate::graph::{NetArc, Step, StepGraph};

pub fn export_network(network: &PetriNet, writer: &mut DotWriter) {
    let mut digraph = writer.digraph();
    digraph.set_font_size(14.0);
    digraph.set("nodesep", "0.5", false);

    let mut names: BTreeMap<&NodeId, String> = BTreeMap::new();

    for (index, place) in network.places().enumerate() {
        let name = format!("N{}", index);
        {
            let mut node = digraph.node_named(&name);
            node.set_shape(Shape::Circle);

            if place.markers() <= 3 {
                node.set_label(&"&#9679;".repeat(place.markers() as usize));
            } else {
                node.set_label(&format!("{}", place.markers()));
            }
            node.set("xlabel", place.id().as_str(), true);
        }
        names.insert(place.id(), name);
    }

    for (index, transition) in network.transitions().enumerate() {
        let name = format!("T{}", index);
        {
            let mut transition_node = digraph.node_named(&name);
            transition_node.set_shape(Shape::Rectangle);
            transition_node.set("height", "0.4", false);
            transition_node.set("width", "0.4", false);
            transition_node.set("margin", "0.01", false);
            transition_node.set_style(Style::Filled);

            let label = match transition.context().map(ContextObject::summary) {
                Some(summary) if !summary.is_empty() => {
                    format!("{}\\n{}", transition.id(), summary)
                }
                _ => transition.id().to_string(),
            };
            transition_node.set_label(&label);
        }
        names.insert(transition.id(), name);
    }

    for arc in network.arcs() {
        if let (Some(source), Some(target)) = (names.get(arc.source()), names.get(arc.target())) {
            digraph.edge(source, target);
        }
    }
}

pub fn export_graph(
    graph: &StepGraph,
    writer: &mut DotWriter,
    format_node: impl Fn(&Step, &mut dot_writer::Node),
    format_edge: impl Fn(&NetArc, &mut AttributesList),
) {
    let mut digraph = writer.digraph();
    digraph.set_font_size(14.0);

    for (index, step) in graph.steps().iter().enumerate() {
        let mut node = digraph.node_named(&format!("S{}", index));
        if index == graph.initial() {
            node.set("peripheries", "2", false);
        }
        (format_node)(step, &mut node);
    }

    for arc in graph.arcs() {
        let mut edge = digraph.edge(
            &format!("S{}", arc.source()),
            &format!("S{}", arc.target()),
        );
        (format_edge)(arc, &mut edge.attributes());
    }
}
