use msci_core::{BranchLogic, CommandNode, CommandTree, NodeId};

/// Nests classified lines into a command tree by their branch logic.
///
/// `if`/`while` (and the loop macros) open a scope closed by `end`; `else`
/// and `else if` close the open branch and start a sibling one; `skip if`
/// holds exactly the next command. Everything else lands in the innermost
/// open scope.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: CommandTree,
    stack: Vec<NodeId>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let tree = CommandTree::new();
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
        }
    }

    pub fn push(&mut self, node: CommandNode) -> NodeId {
        let logic = node.branch_logic();
        let is_code = node.is_code();
        let id = self.tree.add(node);

        match logic {
            BranchLogic::If | BranchLogic::While | BranchLogic::SkipIf => {
                self.attach(id);
                self.close_skip_if_scope();
                self.stack.push(id);
            }
            BranchLogic::Else | BranchLogic::ElseIf => {
                self.close_skip_if_scope();
                if self
                    .top_logic()
                    .is_some_and(|top| matches!(top, BranchLogic::If | BranchLogic::ElseIf))
                {
                    self.stack.pop();
                }
                self.attach(id);
                self.stack.push(id);
            }
            BranchLogic::End => {
                self.close_skip_if_scope();
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
                self.attach(id);
            }
            _ => {
                self.attach(id);
                if is_code {
                    self.close_skip_if_scope();
                }
            }
        }
        id
    }

    pub fn finish(self) -> CommandTree {
        self.tree
    }

    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn top_logic(&self) -> Option<BranchLogic> {
        if self.stack.len() <= 1 {
            return None;
        }
        Some(self.tree.node(self.top()).branch_logic())
    }

    fn attach(&mut self, id: NodeId) {
        let parent = self.top();
        self.tree.append_child(parent, id);
    }

    /// A `skip if` scope holds a single command; the next code line ends it.
    fn close_skip_if_scope(&mut self) {
        if self.top_logic() == Some(BranchLogic::SkipIf) {
            self.stack.pop();
        }
    }
}

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::line::LineParser;
    use crate::syntax_library::SyntaxLibrary;
    use msci_core::GameVersion;

    fn build(lines: &[&str]) -> CommandTree {
        let library = SyntaxLibrary::standard();
        let parser = LineParser::new(&library, GameVersion::AlbionPrelude);
        let mut builder = TreeBuilder::new();
        for (index, line) in lines.iter().enumerate() {
            builder.push(parser.parse(index + 1, line).node);
        }
        builder.finish()
    }

    fn lines_of(tree: &CommandTree, id: NodeId) -> Vec<usize> {
        tree.children(id)
            .iter()
            .map(|child| tree.node(*child).line_number)
            .collect()
    }

    #[test]
    fn if_else_chain_nests_bodies_and_keeps_end_as_sibling() {
        let tree = build(&[
            "$x = 1",
            "if $x == 1",
            "return 1",
            "else if $x == 2",
            "return 2",
            "else",
            "return 3",
            "end",
        ]);
        let root = tree.root();
        assert_eq!(lines_of(&tree, root), vec![1, 2, 4, 6, 8]);
        let branches = tree.children(root);
        assert_eq!(lines_of(&tree, branches[1]), vec![3]);
        assert_eq!(lines_of(&tree, branches[2]), vec![5]);
        assert_eq!(lines_of(&tree, branches[3]), vec![7]);
    }

    #[test]
    fn nested_while_inside_if() {
        let tree = build(&["if $a", "while $b", "dec $b", "end", "end"]);
        let root = tree.root();
        assert_eq!(lines_of(&tree, root), vec![1, 5]);
        let outer = tree.children(root)[0];
        assert_eq!(lines_of(&tree, outer), vec![2, 4]);
        assert_eq!(lines_of(&tree, tree.children(outer)[0]), vec![3]);
    }

    #[test]
    fn skip_if_takes_the_next_command_after_blank_lines() {
        let tree = build(&["skip if $a", "", "* note", "inc $b", "dec $b"]);
        let root = tree.root();
        assert_eq!(lines_of(&tree, root), vec![1, 5]);
        assert_eq!(lines_of(&tree, tree.children(root)[0]), vec![2, 3, 4]);
    }

    #[test]
    fn skip_if_followed_by_block_hands_scope_to_the_block() {
        let tree = build(&["skip if $a", "if $b", "inc $c", "end", "dec $c"]);
        let root = tree.root();
        let skip = tree.children(root)[0];
        assert_eq!(lines_of(&tree, skip), vec![2]);
        assert_eq!(lines_of(&tree, root), vec![1, 4, 5]);
    }

    #[test]
    fn stray_end_and_else_attach_at_root() {
        let tree = build(&["end", "else", "inc $a", "end"]);
        let root = tree.root();
        assert_eq!(lines_of(&tree, root), vec![1, 2, 4]);
        assert_eq!(lines_of(&tree, tree.children(root)[1]), vec![3]);
    }
}
