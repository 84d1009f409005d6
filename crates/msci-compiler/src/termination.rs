use msci_core::{cmd, BranchLogic, CommandTree, ErrorToken, NodeId};

const NOT_TERMINATED: &str = "Not every control path ends with 'return'";

/// Proves that every control path through the script reaches `return` (or
/// `endsub`, which closes a subroutine tail).
pub fn verify_termination(tree: &CommandTree) -> Vec<ErrorToken> {
    let root = tree.root();
    if terminates(tree, root) {
        return Vec::new();
    }
    let last = tree
        .children(root)
        .iter()
        .rev()
        .copied()
        .find(|id| tree.node(*id).is_code());
    let error = match last {
        Some(id) => {
            let node = tree.node(id);
            ErrorToken::for_line(NOT_TERMINATED, node.line_number, &node.line_text)
        }
        None => ErrorToken::for_line(NOT_TERMINATED, 1, ""),
    };
    vec![error]
}

/// Whether the body of `id` ends every path in `return` or `endsub`.
pub(crate) fn terminates(tree: &CommandTree, id: NodeId) -> bool {
    let last = tree.children(id).iter().rev().copied().find(|child| {
        let node = tree.node(*child);
        node.is_code()
            && !matches!(
                node.branch_logic(),
                BranchLogic::Else | BranchLogic::ElseIf | BranchLogic::End
            )
    });
    let Some(last) = last else {
        return false;
    };

    let node = tree.node(last);
    match node.branch_logic() {
        BranchLogic::None => {
            (node.is(cmd::RETURN) || node.is(cmd::END_SUB)) && !node.conditional.is_branching()
        }
        BranchLogic::If => terminates(tree, last) && alternatives_terminate(tree, last),
        _ => false,
    }
}

/// Every `else if` after the `if` terminates and a terminating `else` closes
/// the chain.
fn alternatives_terminate(tree: &CommandTree, if_node: NodeId) -> bool {
    for sibling in tree.following_siblings(if_node) {
        if !tree.node(sibling).is_code() {
            continue;
        }
        match tree.node(sibling).branch_logic() {
            BranchLogic::ElseIf if terminates(tree, sibling) => {}
            BranchLogic::Else => return terminates(tree, sibling),
            _ => return false,
        }
    }
    false
}
