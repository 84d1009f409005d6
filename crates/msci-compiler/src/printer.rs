use std::fmt::Write;

use msci_core::{CommandTree, NodeId, NodeKind, NodeVisitor};

use crate::linker::target_address;

/// Renders one node per row: source line, compiled address (when indexed),
/// the line indented by depth, and the jump destination once linked.
#[derive(Default)]
struct TreePrinter {
    out: String,
}

impl NodeVisitor for TreePrinter {
    fn visit(&mut self, tree: &CommandTree, id: NodeId, depth: usize) {
        let node = tree.node(id);
        if node.kind == NodeKind::Nop {
            return;
        }
        let address = node
            .index
            .map(|address| format!("#{}", address))
            .unwrap_or_default();
        let jump = node
            .jump_target
            .and_then(|target| target_address(tree, target))
            .map(|address| format!(" -> #{}", address))
            .unwrap_or_default();
        let _ = writeln!(
            self.out,
            "{:>4} {:<5} {}{}{}",
            node.line_number,
            address,
            "  ".repeat(depth),
            node.line_text.trim(),
            jump
        );
    }
}

pub fn print_tree(tree: &CommandTree) -> String {
    let mut printer = TreePrinter::default();
    tree.accept(&mut printer);
    printer.out
}
