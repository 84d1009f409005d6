use msci_core::{
    cmd, Command, CommandNode, CommandTree, CompiledParameter, ErrorToken, NodeKind,
    Parameter, ParameterType, ParameterValue, ScriptFile,
};

fn compile_failed(node: &CommandNode, detail: impl std::fmt::Display) -> ErrorToken {
    ErrorToken::for_line(
        format!("compile failed: {}", detail),
        node.line_number,
        &node.line_text,
    )
}

fn compile_parameter(param: &Parameter) -> CompiledParameter {
    CompiledParameter {
        ptype: param.syntax.ptype,
        value: param.value.clone(),
    }
}

/// Whether the node appears in the emitted command list at all.
fn is_emitted(node: &CommandNode) -> bool {
    match node.kind {
        NodeKind::Nop => false,
        NodeKind::Comment { .. } | NodeKind::Unrecognised => true,
        NodeKind::Command | NodeKind::Expression { .. } => {
            !node.syntax.is_macro() && !node.is(cmd::END)
        }
    }
}

fn compile_node(node: &CommandNode) -> Result<Command, ErrorToken> {
    if let NodeKind::Comment { text } = &node.kind {
        return Ok(Command {
            id: cmd::COMMENT,
            line_number: node.line_number,
            address: None,
            conditional: node.conditional,
            parameters: vec![CompiledParameter {
                ptype: ParameterType::Comment,
                value: ParameterValue::Comment(text.clone()),
            }],
            postfix: Vec::new(),
            commented: false,
            text: node.line_text.clone(),
        });
    }
    if node.kind == NodeKind::Unrecognised {
        return Err(compile_failed(node, "unrecognised command"));
    }

    let address = match (node.is_standard(), node.index) {
        (true, Some(address)) => Some(address),
        (true, None) => return Err(compile_failed(node, "command has no address")),
        (false, _) => None,
    };

    if !node.commented {
        for param in &node.parameters {
            match &param.value {
                ParameterValue::Label(name) if param.syntax.ptype.is_label() && address.is_some() => {
                    return Err(compile_failed(node, format!("label '{}' was not resolved", name)));
                }
                ParameterValue::Conditional { jump: None, conditional }
                    if conditional.is_branching() =>
                {
                    return Err(compile_failed(
                        node,
                        format!("'{}' has no jump address", conditional.keyword()),
                    ));
                }
                _ => {}
            }
        }
    }

    let postfix = match &node.kind {
        NodeKind::Expression { postfix, .. } => postfix.iter().map(compile_parameter).collect(),
        _ => Vec::new(),
    };
    Ok(Command {
        id: node.id(),
        line_number: node.line_number,
        address,
        conditional: node.conditional,
        parameters: node.parameters.iter().map(compile_parameter).collect(),
        postfix,
        commented: node.commented,
        text: node.line_text.clone(),
    })
}

/// Flattens the linked, indexed tree into `script.commands`, in document
/// order. Failing nodes are reported and skipped.
pub fn generate(tree: &CommandTree, script: &mut ScriptFile) -> Vec<ErrorToken> {
    script.commands.clear();
    let mut errors = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        if !is_emitted(node) {
            continue;
        }
        match compile_node(node) {
            Ok(command) => script.commands.push(command),
            Err(error) => errors.push(error),
        }
    }
    errors
}
