use msci_core::{CommandTree, NodeId, NodeKind, NodeVisitor, Symbol, SymbolKind};

use crate::symbols::referenced_variable;

/// Collects every occurrence of one label or variable, commented commands
/// included.
struct SymbolSearch<'n> {
    name: &'n str,
    kind: SymbolKind,
    found: Vec<Symbol>,
}

impl NodeVisitor for SymbolSearch<'_> {
    fn visit(&mut self, tree: &CommandTree, id: NodeId, _depth: usize) {
        let node = tree.node(id);
        if !matches!(node.kind, NodeKind::Command | NodeKind::Expression { .. }) {
            return;
        }
        for param in node.all_parameters() {
            let Some(token) = &param.token else {
                continue;
            };
            let matched = match self.kind {
                SymbolKind::Label => param.syntax.ptype.is_label() && token.text == self.name,
                SymbolKind::Variable => referenced_variable(&param.value) == Some(self.name),
            };
            if matched {
                self.found.push(Symbol {
                    token: token.clone(),
                    kind: self.kind,
                    line_number: node.line_number,
                    line_text: node.line_text.clone(),
                    commented: node.commented,
                });
            }
        }
    }
}

/// Finds the definitions and uses of `name`. A leading `$` on variable
/// names is optional.
pub fn find_symbols(tree: &CommandTree, name: &str, kind: SymbolKind) -> Vec<Symbol> {
    let name = match kind {
        SymbolKind::Variable => name.strip_prefix('$').unwrap_or(name),
        SymbolKind::Label => name,
    };
    let mut search = SymbolSearch {
        name,
        kind,
        found: Vec::new(),
    };
    tree.accept(&mut search);
    search.found
}
