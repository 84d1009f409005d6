use std::collections::BTreeSet;

use msci_core::{
    CommandTree, ErrorToken, ParameterType, ParameterUsage, ParameterValue, ScriptCallResolver,
    ScriptFile,
};
use tracing::debug;

/// Variable named by a parameter value, looking through `name=value` pairs.
pub(crate) fn referenced_variable(value: &ParameterValue) -> Option<&str> {
    match value {
        ParameterValue::Variable(name) => Some(name.as_str()),
        ParameterValue::Named { value, .. } => referenced_variable(value),
        _ => None,
    }
}

/// Registers labels and variables of the tree in `script`.
pub fn identify_symbols(tree: &CommandTree, script: &mut ScriptFile) -> Vec<ErrorToken> {
    let mut errors = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        if !node.is_code() {
            continue;
        }

        if let Some(name) = node.label_name() {
            match script.labels.get(name) {
                Some(line) => {
                    let message = format!("Label '{}' already defined on line {}", name, line);
                    errors.push(match node.parameters[0].token.as_ref() {
                        Some(token) => ErrorToken::for_token(message, node.line_number, token),
                        None => ErrorToken::for_line(message, node.line_number, &node.line_text),
                    });
                }
                None => {
                    script.labels.insert(name.to_string(), node.line_number);
                }
            }
        }

        for param in node.all_parameters() {
            let Some(name) = referenced_variable(&param.value) else {
                continue;
            };
            let info = script.variables.entry(name.to_string()).or_default();
            if param.syntax.usage == ParameterUsage::ReturnValue {
                info.assignment_count += 1;
            } else {
                info.usage_count += 1;
            }
        }
    }
    errors
}

/// Loads the declared arguments of every script called by literal name.
/// Scripts that cannot be resolved are skipped; their calls go unchecked.
pub fn resolve_script_calls(
    tree: &CommandTree,
    script: &mut ScriptFile,
    resolver: &dyn ScriptCallResolver,
) {
    let mut failed = BTreeSet::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        if !node.is_code() || !node.syntax.is_script_call() {
            continue;
        }
        let names = node.parameters.iter().filter_map(|param| match &param.value {
            ParameterValue::String(name) if param.syntax.ptype == ParameterType::ScriptName => {
                Some(name)
            }
            _ => None,
        });
        for name in names {
            if script.script_calls.contains_key(name) || failed.contains(name) {
                continue;
            }
            match resolver.resolve(name) {
                Ok(info) => {
                    script.script_calls.insert(name.clone(), info);
                }
                Err(error) => {
                    debug!(script = %name, error = %error, "script call unresolved");
                    failed.insert(name.clone());
                }
            }
        }
    }
}
