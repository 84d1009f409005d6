use std::collections::BTreeSet;

use msci_core::{
    cmd, CommandNode, CommandTree, ErrorToken, NodeId, ParameterValue, ScriptFile,
};
use msci_parser::ScriptParser;
use tracing::trace;

const ITERATOR_VAR_PREFIX: &str = "XS.Iterator";

struct MacroExpansionContext {
    used_var_names: BTreeSet<String>,
    iterator_counter: usize,
}

/// Source lines a macro expands to. `loop_header` becomes a `while` that
/// receives `loop_prelude` followed by the macro's own body.
#[derive(Debug, Default)]
struct Expansion {
    before: Vec<String>,
    loop_header: Option<String>,
    loop_prelude: Vec<String>,
}

/// Rewrites `dim`, `for` and `for each` nodes into primitive commands.
/// Inner macros expand before outer ones; a macro that fails to expand is
/// reported and left in place.
pub fn expand_macros(
    tree: &mut CommandTree,
    script: &mut ScriptFile,
    parser: &ScriptParser<'_>,
) -> Vec<ErrorToken> {
    let mut used_var_names: BTreeSet<String> = script.variables.keys().cloned().collect();
    collect_variable_names(tree, &mut used_var_names);
    let mut context = MacroExpansionContext {
        used_var_names,
        iterator_counter: 1,
    };

    let macros: Vec<NodeId> = tree
        .nodes()
        .into_iter()
        .rev()
        .filter(|id| {
            let node = tree.node(*id);
            node.is_code() && node.syntax.is_macro()
        })
        .collect();

    let mut errors = Vec::new();
    for id in macros {
        if let Err(error) = expand_macro(tree, id, script, parser, &mut context) {
            errors.push(error);
        }
    }
    errors
}

fn collect_variable_names(tree: &CommandTree, names: &mut BTreeSet<String>) {
    for id in tree.nodes() {
        for param in tree.node(id).all_parameters() {
            if let Some(name) = param.value.as_variable() {
                names.insert(name.to_string());
            }
        }
    }
}

fn next_iterator_var_name(context: &mut MacroExpansionContext) -> String {
    loop {
        let candidate = format!("{}{}", ITERATOR_VAR_PREFIX, context.iterator_counter);
        context.iterator_counter += 1;
        if context.used_var_names.insert(candidate.clone()) {
            return candidate;
        }
    }
}

fn expand_macro(
    tree: &mut CommandTree,
    id: NodeId,
    script: &mut ScriptFile,
    parser: &ScriptParser<'_>,
    context: &mut MacroExpansionContext,
) -> Result<(), ErrorToken> {
    let node = tree.node(id).clone();
    let fail = |message: String| ErrorToken::for_line(message, node.line_number, &node.line_text);

    let expansion = match node.id() {
        cmd::DIM_ARRAY => expand_dim(&node).map_err(fail)?,
        cmd::FOR_LOOP => expand_for(&node).map_err(fail)?,
        cmd::FOR_EACH | cmd::FOR_EACH_COUNTER => {
            let counter = match node.parameters.get(2).and_then(|param| param.value.as_variable()) {
                Some(name) => name.to_string(),
                None => {
                    let name = next_iterator_var_name(context);
                    script.variables.entry(name.clone()).or_default();
                    name
                }
            };
            expand_for_each(&node, &counter).map_err(fail)?
        }
        _ => return Ok(()),
    };

    let mut parse = |text: &str| -> Result<NodeId, ErrorToken> {
        let outcome = parser.parse_line(node.line_number, text);
        if let Some(error) = outcome.error {
            return Err(fail(format!(
                "macro expansion failed: '{}': {}",
                text, error.message
            )));
        }
        let mut generated = outcome.node;
        generated.synthetic = true;
        Ok(tree.add(generated))
    };

    let mut replacements = expansion
        .before
        .iter()
        .map(|text| parse(text.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let loop_node = expansion.loop_header.as_deref().map(&mut parse).transpose()?;
    let prelude = expansion
        .loop_prelude
        .iter()
        .map(|text| parse(text.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    replacements.extend(loop_node);
    tree.replace(id, &replacements);
    if let Some(loop_node) = loop_node {
        for child in prelude {
            tree.append_child(loop_node, child);
        }
        tree.move_children(id, loop_node);
    }
    trace!(line = node.line_number, command = node.id(), "expanded macro");
    Ok(())
}

fn variable_param(node: &CommandNode, index: usize, role: &str) -> Result<String, String> {
    node.parameters
        .get(index)
        .and_then(|param| param.value.as_variable())
        .map(|name| format!("${}", name))
        .ok_or_else(|| format!("{} must be a variable", role))
}

fn param_text(node: &CommandNode, index: usize) -> Result<String, String> {
    node.parameters
        .get(index)
        .map(|param| param.text())
        .ok_or_else(|| format!("'{}' is missing parameter {}", node.syntax.text, index))
}

fn expand_dim(node: &CommandNode) -> Result<Expansion, String> {
    let array = variable_param(node, 0, "Array")?;
    let values: Vec<String> = node.parameters.iter().skip(1).map(|param| param.text()).collect();
    if values.is_empty() {
        return Err("'dim' requires at least one value".to_string());
    }

    let mut before = vec![format!("{} = array alloc: size={}", array, values.len())];
    for (index, value) in values.iter().enumerate() {
        before.push(format!("{}[{}] = {}", array, index, value));
    }
    Ok(Expansion {
        before,
        ..Expansion::default()
    })
}

fn expand_for(node: &CommandNode) -> Result<Expansion, String> {
    let counter = variable_param(node, 0, "Loop counter")?;
    let from = param_text(node, 1)?;
    let to = param_text(node, 2)?;
    let step = match node.parameters.get(3).map(|param| &param.value) {
        Some(ParameterValue::Number(step)) if *step != 0 => *step,
        _ => return Err("Loop step must be a non-zero number".to_string()),
    };

    let init = match node.parameters[1].value.as_number() {
        Some(start) => {
            let first = start
                .checked_sub(step)
                .ok_or_else(|| "Loop start is out of range".to_string())?;
            format!("{} = {}", counter, first)
        }
        None if step > 0 => format!("{} = {} - {}", counter, from, step),
        None => format!("{} = {} + {}", counter, from, step.unsigned_abs()),
    };
    let comparison = if step > 0 { "<" } else { ">" };
    let advance = match step {
        1 => format!("inc {}", counter),
        -1 => format!("dec {}", counter),
        step if step > 0 => format!("{} = {} + {}", counter, counter, step),
        step => format!("{} = {} - {}", counter, counter, step.unsigned_abs()),
    };

    Ok(Expansion {
        before: vec![init],
        loop_header: Some(format!("while {} {} {}", counter, comparison, to)),
        loop_prelude: vec![advance],
    })
}

fn expand_for_each(node: &CommandNode, counter: &str) -> Result<Expansion, String> {
    let item = variable_param(node, 0, "Loop item")?;
    let array = variable_param(node, 1, "Iterated array")?;
    let counter = format!("${}", counter);

    Ok(Expansion {
        before: vec![format!("{} = size of array {}", counter, array)],
        loop_header: Some(format!("while {}", counter)),
        loop_prelude: vec![
            format!("dec {}", counter),
            format!("{} = {}[{}]", item, array, counter),
        ],
    })
}

/// A `dim` statement recovered from primitive array commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInitializer {
    pub array: String,
    pub values: Vec<ParameterValue>,
}

impl ArrayInitializer {
    pub fn text(&self) -> String {
        let values: Vec<String> = self.values.iter().map(ToString::to_string).collect();
        format!("dim ${} = {}", self.array, values.join(", "))
    }
}

/// Recognises an allocation of size N followed by N assignments to indices
/// `0..N` of the same array: the shape `dim` expands to.
pub fn detect_array_initializer(nodes: &[&CommandNode]) -> Option<ArrayInitializer> {
    let (alloc, sets) = nodes.split_first()?;
    if !alloc.is(cmd::ARRAY_ALLOC) || alloc.commented {
        return None;
    }
    let (return_index, _) = alloc.syntax.return_parameter()?;
    let array = alloc.parameters.get(return_index)?.value.as_variable()?;
    let size_index = alloc.syntax.slot_parameter(1)?;
    let size = usize::try_from(alloc.parameters.get(size_index)?.value.as_number()?).ok()?;
    if size == 0 || sets.len() < size {
        return None;
    }

    let mut values = Vec::with_capacity(size);
    for (position, set) in sets.iter().take(size).enumerate() {
        if !set.is(cmd::ARRAY_SET) || set.commented {
            return None;
        }
        let slot = |display: usize| {
            set.syntax
                .slot_parameter(display)
                .and_then(|index| set.parameters.get(index))
                .map(|param| &param.value)
        };
        if slot(0)?.as_variable()? != array {
            return None;
        }
        if usize::try_from(slot(1)?.as_number()?).ok()? != position {
            return None;
        }
        values.push(slot(2)?.clone());
    }
    Some(ArrayInitializer {
        array: array.to_string(),
        values,
    })
}
