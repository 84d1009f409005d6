use msci_core::{BranchLogic, CommandTree, ErrorToken, NodeId};

fn code_sibling(tree: &CommandTree, id: NodeId, forward: bool) -> Option<NodeId> {
    let parent = tree.parent(id)?;
    let siblings = tree.children(parent);
    let position = tree.position(id)?;
    let is_code = |sibling: &&NodeId| tree.node(**sibling).is_code();
    if forward {
        siblings[position + 1..].iter().find(is_code).copied()
    } else {
        siblings[..position].iter().rev().find(is_code).copied()
    }
}

pub(crate) fn next_code_sibling(tree: &CommandTree, id: NodeId) -> Option<NodeId> {
    code_sibling(tree, id, true)
}

pub(crate) fn previous_code_sibling(tree: &CommandTree, id: NodeId) -> Option<NodeId> {
    code_sibling(tree, id, false)
}

fn sibling_logic(tree: &CommandTree, sibling: Option<NodeId>) -> BranchLogic {
    sibling
        .map(|id| tree.node(id).branch_logic())
        .unwrap_or(BranchLogic::None)
}

/// Logic of the block a closing line pairs with. A block opened as the body
/// of a `skip if` still closes at the level of the `skip if`.
fn opener_logic(tree: &CommandTree, sibling: Option<NodeId>) -> BranchLogic {
    let logic = sibling_logic(tree, sibling);
    if logic != BranchLogic::SkipIf {
        return logic;
    }
    let body = sibling.and_then(|id| {
        tree.children(id)
            .iter()
            .rev()
            .copied()
            .find(|child| tree.node(*child).is_code())
    });
    match sibling_logic(tree, body) {
        inner @ (BranchLogic::If | BranchLogic::While) => inner,
        _ => logic,
    }
}

/// Checks the branch structure: block openers meet their `end`, `else` and
/// `else if` sit inside an `if` chain, `skip if` wraps one plain command and
/// `break`/`continue` live inside a `while`.
pub fn verify_structure(tree: &CommandTree) -> Vec<ErrorToken> {
    let mut errors = Vec::new();
    for id in tree.nodes() {
        let node = tree.node(id);
        let logic = node.branch_logic();
        let next = sibling_logic(tree, next_code_sibling(tree, id));
        let previous = opener_logic(tree, previous_code_sibling(tree, id));
        let parent_logic = sibling_logic(tree, tree.parent(id));

        let message = match logic {
            BranchLogic::If if parent_logic != BranchLogic::SkipIf => {
                match next {
                    BranchLogic::ElseIf | BranchLogic::Else | BranchLogic::End => None,
                    _ => Some("'if' is missing a matching 'end'".to_string()),
                }
            }
            BranchLogic::While if parent_logic != BranchLogic::SkipIf => {
                (next != BranchLogic::End).then(|| "'while' is missing a matching 'end'".to_string())
            }
            BranchLogic::ElseIf | BranchLogic::Else => {
                let name = logic.name();
                if !matches!(previous, BranchLogic::If | BranchLogic::ElseIf) {
                    Some(format!("'{}' must follow 'if' or 'else if'", name))
                } else {
                    let closed = match logic {
                        BranchLogic::ElseIf => matches!(
                            next,
                            BranchLogic::ElseIf | BranchLogic::Else | BranchLogic::End
                        ),
                        _ => next == BranchLogic::End,
                    };
                    (!closed).then(|| format!("'{}' is missing a matching 'end'", name))
                }
            }
            BranchLogic::End => {
                let opened = matches!(
                    previous,
                    BranchLogic::If | BranchLogic::ElseIf | BranchLogic::Else | BranchLogic::While
                );
                (!opened).then(|| "'end' without matching 'if' or 'while'".to_string())
            }
            BranchLogic::SkipIf => verify_skip_if(tree, id),
            BranchLogic::Break | BranchLogic::Continue => {
                let in_loop = tree
                    .ancestors(id)
                    .into_iter()
                    .any(|ancestor| tree.node(ancestor).branch_logic() == BranchLogic::While);
                (!in_loop).then(|| format!("'{}' cannot appear outside 'while'", logic.name()))
            }
            _ => None,
        };

        if let Some(message) = message {
            errors.push(ErrorToken::for_line(message, node.line_number, &node.line_text));
        }
    }
    errors
}

fn verify_skip_if(tree: &CommandTree, id: NodeId) -> Option<String> {
    let nested = tree
        .ancestors(id)
        .into_iter()
        .any(|ancestor| tree.node(ancestor).branch_logic() == BranchLogic::SkipIf);
    if nested {
        return Some("'skip if' cannot be nested inside 'skip if'".to_string());
    }
    let code: Vec<NodeId> = tree
        .children(id)
        .iter()
        .copied()
        .filter(|child| tree.node(*child).is_code())
        .collect();
    let plain = match code.as_slice() {
        [only] => matches!(
            tree.node(*only).branch_logic(),
            BranchLogic::None | BranchLogic::Break | BranchLogic::Continue
        ),
        _ => false,
    };
    (!plain).then(|| "'skip if' must contain single command".to_string())
}
