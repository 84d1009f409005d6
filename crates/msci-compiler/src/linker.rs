use msci_core::{
    cmd, Address, BranchLogic, CommandNode, CommandTree, ErrorToken, NodeId, ParameterValue,
};

use crate::structure::next_code_sibling;
use crate::termination::terminates;

fn linking_error(node: &CommandNode, detail: impl std::fmt::Display) -> ErrorToken {
    ErrorToken::for_line(
        format!("linking failed: {}", detail),
        node.line_number,
        &node.line_text,
    )
}

/// First node control reaches after leaving `id`: the next executable sibling,
/// else the loop head or the exit of the enclosing block.
fn following(tree: &CommandTree, id: NodeId) -> Option<NodeId> {
    for sibling in tree.following_siblings(id) {
        let node = tree.node(sibling);
        if !node.is_code() {
            continue;
        }
        match node.branch_logic() {
            BranchLogic::Else | BranchLogic::ElseIf | BranchLogic::End => continue,
            BranchLogic::Break | BranchLogic::Continue => return Some(sibling),
            _ if node.is_standard() => return Some(sibling),
            _ => continue,
        }
    }

    let parent = tree.parent(id)?;
    if parent == tree.root() {
        return None;
    }
    match tree.node(parent).branch_logic() {
        BranchLogic::While => Some(parent),
        BranchLogic::If | BranchLogic::ElseIf | BranchLogic::Else | BranchLogic::SkipIf => {
            following(tree, parent)
        }
        _ => None,
    }
}

/// Where a branch body starts: its first executable child, or wherever
/// control goes after an empty body.
fn entry(tree: &CommandTree, id: NodeId) -> Option<NodeId> {
    let first = tree.children(id).iter().copied().find(|child| {
        let node = tree.node(*child);
        node.is_standard()
            || matches!(node.branch_logic(), BranchLogic::Break | BranchLogic::Continue)
    });
    first.or_else(|| following(tree, id))
}

fn enclosing_while(tree: &CommandTree, id: NodeId) -> Option<NodeId> {
    tree.ancestors(id)
        .into_iter()
        .find(|ancestor| tree.node(*ancestor).branch_logic() == BranchLogic::While)
}

fn find_label(tree: &CommandTree, name: &str) -> Option<NodeId> {
    tree.nodes().into_iter().find(|id| {
        let node = tree.node(*id);
        node.is_code() && node.label_name() == Some(name)
    })
}

fn goto_label(node: &CommandNode) -> Option<&str> {
    if !(node.is(cmd::GOTO_LABEL) || node.is(cmd::GOTO_SUB)) {
        return None;
    }
    node.parameters.first().and_then(|param| match &param.value {
        ParameterValue::Label(name) => Some(name.as_str()),
        _ => None,
    })
}

/// Inserts the synthetic jumps and points every control-flow node at the
/// node it transfers to. Works on node handles only; addresses come later.
pub fn link(tree: &mut CommandTree) -> Vec<ErrorToken> {
    let mut jumps: Vec<(NodeId, NodeId)> = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        let line_number = node.line_number;
        match node.branch_logic() {
            BranchLogic::While => {
                let jump = tree.add(CommandNode::jump(line_number));
                tree.append_child(id, jump);
                jumps.push((jump, id));
            }
            BranchLogic::Break | BranchLogic::Continue => {
                let jump = tree.add(CommandNode::jump(line_number));
                tree.insert_child(id, 0, jump);
                jumps.push((jump, id));
            }
            BranchLogic::If | BranchLogic::ElseIf => {
                let alternate = next_code_sibling(tree, id)
                    .map(|sibling| tree.node(sibling).branch_logic())
                    .is_some_and(|logic| matches!(logic, BranchLogic::ElseIf | BranchLogic::Else));
                if alternate && !terminates(tree, id) {
                    let jump = tree.add(CommandNode::jump(line_number));
                    tree.append_child(id, jump);
                    jumps.push((jump, id));
                }
            }
            _ => {}
        }
    }

    let mut errors = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        let target = match node.branch_logic() {
            BranchLogic::If | BranchLogic::ElseIf => match next_code_sibling(tree, id) {
                Some(sibling) => match tree.node(sibling).branch_logic() {
                    BranchLogic::ElseIf => Some(sibling),
                    BranchLogic::Else => entry(tree, sibling),
                    _ => following(tree, id),
                },
                None => following(tree, id),
            },
            BranchLogic::SkipIf | BranchLogic::While => following(tree, id),
            BranchLogic::Break => enclosing_while(tree, id).and_then(|loop_id| following(tree, loop_id)),
            BranchLogic::Continue => enclosing_while(tree, id),
            _ => match goto_label(node).filter(|_| node.is_code()) {
                Some(name) => {
                    let found = find_label(tree, name);
                    if found.is_none() {
                        errors.push(linking_error(node, format!("label '{}' not found", name)));
                    }
                    found
                }
                None => continue,
            },
        };
        tree.node_mut(id).jump_target = target;
    }

    for (jump, owner) in jumps {
        let target = match tree.node(owner).branch_logic() {
            BranchLogic::While => Some(owner),
            BranchLogic::Break | BranchLogic::Continue => tree.node(owner).jump_target,
            _ => following(tree, owner),
        };
        tree.node_mut(jump).jump_target = target;
    }
    errors
}

/// Numbers the standard commands in document order; returns how many there are.
pub fn index(tree: &mut CommandTree) -> usize {
    let mut next: Address = 0;
    for id in tree.nodes() {
        let node = tree.node_mut(id);
        if node.is_standard() {
            node.index = Some(next);
            next += 1;
        } else {
            node.index = None;
        }
    }
    next
}

/// Address of a jump target. `break` and `continue` carry no address of
/// their own; they are entered through their synthetic jump.
pub(crate) fn target_address(tree: &CommandTree, target: NodeId) -> Option<Address> {
    let node = tree.node(target);
    match node.branch_logic() {
        BranchLogic::Break | BranchLogic::Continue => tree
            .children(target)
            .first()
            .and_then(|jump| tree.node(*jump).index),
        _ => node.index,
    }
}

/// Writes resolved addresses into jump, goto and branching parameters.
pub fn finalize(tree: &mut CommandTree) -> Vec<ErrorToken> {
    let mut errors = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        if !node.is_standard() {
            continue;
        }
        let branching = node.conditional.is_branching();
        let is_jump = node.is(cmd::JUMP) || goto_label(node).is_some();
        if !branching && !is_jump {
            continue;
        }

        let Some(target) = node.jump_target else {
            errors.push(linking_error(node, "command has no jump target"));
            continue;
        };
        let Some(address) = target_address(tree, target) else {
            let target_line = tree.node(target).line_number;
            errors.push(linking_error(
                node,
                format!("jump target on line {} has no address", target_line),
            ));
            continue;
        };

        let conditional = node.conditional;
        let return_index = node
            .syntax
            .return_parameter()
            .map(|(index, _)| index)
            .filter(|index| *index < node.parameters.len());
        if branching && return_index.is_none() {
            errors.push(linking_error(node, "branching command has no return value"));
            continue;
        }

        let node = tree.node_mut(id);
        if is_jump {
            if let Some(param) = node.parameters.first_mut() {
                param.value = ParameterValue::Address(address);
            }
        }
        if let (true, Some(index)) = (branching, return_index) {
            node.parameters[index].value = ParameterValue::Conditional {
                conditional,
                jump: Some(address),
            };
        }
    }
    errors
}
