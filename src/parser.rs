//! Line based textual format for nets:
//!
//! ```text
//! # comment
//! start = 1
//! read: start -> {copy, copy}
//! {copy, copy} -> end
//! read [read=data, context={france, eu}, kind=app]
//! ```
//!
//! `name = n` sets the initial markers of a place, `id: inputs -> outputs` declares a transition
//! (repeated places are arc weights, unnamed transitions are called `t1`, `t2`, ... in order of
//! declaration) and `id [key=value, ...]` attaches a context to a declared transition.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::builder::PetriNetBuilder;
use crate::error::{PetriError, Result};
use crate::network::{ContextObject, PetriNet, TransitionKind};

/// Parses `raw` into a net called `net`.
pub fn parse(raw: &str) -> Result<PetriNet> {
    parse_named("net", raw)
}

pub fn parse_named(id: impl Into<String>, raw: &str) -> Result<PetriNet> {
    let rules = parse_rules(raw)?;

    let mut places: BTreeSet<&str> = BTreeSet::new();
    let mut markers: BTreeMap<&str, u32> = BTreeMap::new();
    let mut transitions = Vec::new();
    let mut contexts: BTreeMap<&str, (usize, &ContextObject)> = BTreeMap::new();

    for (line, rule) in rules.iter() {
        match rule {
            Rule::Transition(transition) => {
                places.extend(transition.inputs.iter().map(String::as_str));
                places.extend(transition.outputs.iter().map(String::as_str));
                transitions.push(transition);
            }
            Rule::Assign(name, value) => {
                places.insert(name.as_str());
                markers.insert(name.as_str(), *value);
            }
            Rule::Context(name, context) => {
                contexts.insert(name.as_str(), (*line, context));
            }
        }
    }

    let mut builder = PetriNetBuilder::new(id);
    for place in places.iter() {
        builder.place(*place, markers.get(place).copied().unwrap_or(0));
    }

    let mut declared = BTreeSet::new();
    for (index, transition) in transitions.into_iter().enumerate() {
        let id = match &transition.id {
            Some(id) => id.clone(),
            None => format!("t{}", index + 1),
        };

        let mut branch = builder.begin_transition(id.as_str());
        for input in transition.inputs.iter() {
            branch = branch.input(&input.as_str().into());
        }
        for output in transition.outputs.iter() {
            branch = branch.output(&output.as_str().into());
        }
        if let Some((_, context)) = contexts.get(id.as_str()) {
            branch = branch.context((*context).clone());
        }
        branch.build();
        declared.insert(id);
    }

    if let Some((name, (line, _))) = contexts
        .iter()
        .find(|(name, _)| !declared.contains(**name))
    {
        return Err(PetriError::SyntaxError {
            line: *line,
            message: format!("Context attached to undeclared transition '{}'", name),
        });
    }

    let net = builder.build()?;
    debug!(
        net = net.id(),
        places = net.places().count(),
        transitions = net.transitions().count(),
        "Parsed net."
    );
    Ok(net)
}

#[derive(Debug, PartialEq)]
enum Rule {
    Transition(TransitionRule),
    Assign(String, u32),
    Context(String, ContextObject),
}

#[derive(Debug, PartialEq)]
struct TransitionRule {
    id: Option<String>,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

fn syntax_error(line: usize, message: impl Into<String>) -> PetriError {
    PetriError::SyntaxError {
        line,
        message: message.into(),
    }
}

/// Returns every rule together with its (1-based) line number.
fn parse_rules(raw: &str) -> Result<Vec<(usize, Rule)>> {
    let mut res = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        let line = match line.split_once('#') {
            Some((content, _comment)) => content,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let rule = if let Some((left, right)) = line.split_once("->") {
            if right.contains("->") {
                return Err(syntax_error(line_number, "Expected a single '->'"));
            }
            let (id, left) = match split_transition_id(left) {
                Some((id, left)) => (Some(parse_name(id, line_number)?), left),
                None => (None, left),
            };

            Rule::Transition(TransitionRule {
                id,
                inputs: parse_set(left, line_number)?,
                outputs: parse_set(right, line_number)?,
            })
        } else if let Some((name, attributes)) = line.split_once('[') {
            let Some(attributes) = attributes.trim_end().strip_suffix(']') else {
                return Err(syntax_error(line_number, "Unterminated '['"));
            };
            Rule::Context(
                parse_name(name, line_number)?,
                parse_context(attributes, line_number)?,
            )
        } else if let Some((name, value)) = line.split_once('=') {
            let value = value.trim();
            let markers = value.parse::<u32>().map_err(|err| {
                syntax_error(line_number, format!("Invalid marker count '{}': {}", value, err))
            })?;
            Rule::Assign(parse_name(name, line_number)?, markers)
        } else {
            return Err(syntax_error(line_number, format!("Unrecognized rule '{}'", line)));
        };

        res.push((line_number, rule));
    }

    Ok(res)
}

/// Splits `id: inputs` on the first ':' that does not open a `://` scheme separator.
fn split_transition_id(left: &str) -> Option<(&str, &str)> {
    left.match_indices(':')
        .map(|(index, _)| index)
        .find(|index| !left[index + 1..].starts_with("//"))
        .map(|index| (&left[..index], &left[index + 1..]))
}

/// Names may contain ':' only as part of `://`, so that URIs such as `place://start` can be used as ids.
fn parse_name(raw: &str, line: usize) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty()
        || raw.contains(|c: char| c.is_whitespace() || "{},=[]".contains(c))
        || raw.replace("://", "").contains(':')
    {
        return Err(syntax_error(line, format!("Invalid name '{}'", raw)));
    }
    Ok(raw.to_owned())
}

/// Either a single name or `{a, b, ...}`; items may be separated by commas or spaces.
/// Repetitions are kept.
fn parse_set(raw: &str, line: usize) -> Result<Vec<String>> {
    let raw = raw.trim();
    let items = match raw.strip_prefix('{') {
        Some(inner) => inner
            .strip_suffix('}')
            .ok_or_else(|| syntax_error(line, "Unterminated '{'"))?,
        None => raw,
    };

    items
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| parse_name(item, line))
        .collect()
}

/// Splits on commas that are not nested inside braces.
fn split_attributes(raw: &str) -> Vec<&str> {
    let mut res = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                res.push(&raw[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    res.push(&raw[start..]);

    res.into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_context(raw: &str, line: usize) -> Result<ContextObject> {
    let mut res = ContextObject::default();

    for attribute in split_attributes(raw) {
        let Some((key, value)) = attribute.split_once('=') else {
            return Err(syntax_error(line, format!("Expected key=value, got '{}'", attribute)));
        };

        match key.trim() {
            "read" => res.read = Some(parse_name(value, line)?),
            "write" => res.write = Some(parse_name(value, line)?),
            "erase" => res.erase = Some(parse_name(value, line)?),
            "context" => res.required_context = parse_set(value, line)?.into_iter().collect(),
            "kind" => {
                res.kind = match value.trim() {
                    "app" => TransitionKind::App,
                    "control" => TransitionKind::Control,
                    other => {
                        return Err(syntax_error(line, format!("Unknown transition kind '{}'", other)))
                    }
                }
            }
            other => return Err(syntax_error(line, format!("Unknown attribute '{}'", other))),
        }
    }

    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::network::NodeId;

    macro_rules! transition {
        ( $id:expr, [ $( $input:expr ),* ] , [ $( $output:expr ),* ] ) => {
            Rule::Transition(TransitionRule {
                id: $id.map(|id: &str| id.to_owned()),
                inputs: vec![ $( $input.to_owned() ),* ],
                outputs: vec![ $( $output.to_owned() ),* ],
            })
        }
    }

    fn rules(raw: &str) -> Vec<Rule> {
        parse_rules(raw)
            .unwrap()
            .into_iter()
            .map(|(_, rule)| rule)
            .collect()
    }

    #[test]
    fn should_parse_empty() {
        assert_eq!(rules(""), vec![]);
        assert_eq!(rules("  \n# only a comment\n"), vec![]);
    }

    #[test]
    fn should_parse_simple() {
        assert_eq!(rules("A -> B"), vec![transition!(None, ["A"], ["B"])]);
        assert_eq!(
            rules("t1: A -> B # trailing comment"),
            vec![transition!(Some("t1"), ["A"], ["B"])]
        );
    }

    #[test]
    fn should_parse_sets() {
        assert_eq!(
            rules("A -> {B C, D,}"),
            vec![transition!(None, ["A"], ["B", "C", "D"])]
        );
        assert_eq!(
            rules("join: {A, B} -> {C, C}"),
            vec![transition!(Some("join"), ["A", "B"], ["C", "C"])]
        );
    }

    #[test]
    fn should_parse_context() {
        assert_eq!(
            rules("t1 [read=data, write=mean, context={france, eu}, kind=app]"),
            vec![Rule::Context(
                "t1".to_owned(),
                ContextObject::app()
                    .read("data")
                    .write("mean")
                    .required_context(["france", "eu"])
            )]
        );
    }

    #[test]
    fn should_report_line_numbers() {
        let err = parse_rules("A -> B\n\nA B").unwrap_err();
        assert!(matches!(err, PetriError::SyntaxError { line: 3, .. }));

        assert!(matches!(
            parse_rules("A -> {B"),
            Err(PetriError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            parse_rules("A -> B -> C"),
            Err(PetriError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            parse_rules("t1 [color=red]"),
            Err(PetriError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            parse_rules("A = many"),
            Err(PetriError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            parse_rules("# header\nA = 1\nB = -2"),
            Err(PetriError::SyntaxError { line: 3, .. })
        ));
    }

    #[test]
    fn should_fully_parse_simple() {
        let mut builder = PetriNetBuilder::new("net");
        let a = builder.place("A", 0);
        let b = builder.place("B", 0);
        builder.begin_transition("t1").input(&a).output(&b).build();

        assert_eq!(parse("A -> B").unwrap(), builder.build().unwrap());
    }

    #[test]
    fn should_assign_values() {
        let mut builder = PetriNetBuilder::new("cycle");
        let start = builder.place("A", 3);
        let end = builder.place("B", 2);
        builder.begin_transition("t1").input(&start).output(&end).build();
        builder.begin_transition("t2").input(&end).output(&start).build();

        assert_eq!(
            parse_named("cycle", "A = 3\nB = 2\n\nA -> B\nB -> A").unwrap(),
            builder.build().unwrap()
        );
    }

    #[test]
    fn should_attach_contexts_and_weights() {
        let net = parse(
            "start = 1\n\
             copy: start -> {left, left}\n\
             read: {left, left} -> end\n\
             read [read=data, kind=app]",
        )
        .unwrap();

        let read = NodeId::from("read");
        assert_eq!(net.consumption(&read).get(&NodeId::from("left")), Some(&2));
        assert!(net.transition(&read).unwrap().satisfies(|c| c.reads("data")));
        assert_eq!(net.transition(&NodeId::from("copy")).unwrap().context(), None);
    }

    #[test]
    fn should_accept_uri_names() {
        assert_eq!(
            rules("trans://init: place://start -> {place://left, place://right}"),
            vec![transition!(
                Some("trans://init"),
                ["place://start"],
                ["place://left", "place://right"]
            )]
        );

        let net = parse(
            "place://start = 1\n\
             trans://init: place://start -> place://end\n\
             trans://init [read=data, kind=app]",
        )
        .unwrap();
        let init = NodeId::from("trans://init");
        assert!(net.transition(&init).unwrap().satisfies(|c| c.reads("data")));
        assert_eq!(net.place(&NodeId::from("place://start")).unwrap().markers(), 1);

        assert!(matches!(
            parse_rules("a:b = 1"),
            Err(PetriError::SyntaxError { line: 1, .. })
        ));
    }

    #[test]
    fn should_reject_dangling_context() {
        assert!(matches!(
            parse("A -> B\nmissing [read=data]"),
            Err(PetriError::SyntaxError { line: 2, .. })
        ));
        assert!(matches!(
            parse("A: A -> B"),
            Err(PetriError::DuplicateNode(_))
        ));
    }
}
