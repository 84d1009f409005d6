use std::sync::Arc;

use crate::syntax::{cmd, BranchLogic, CommandSyntax, Conditional};
use crate::value::{Address, Parameter, ParameterValue};

/// Handle of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Nop,
    Comment { text: String },
    Command,
    Expression {
        infix: Vec<Parameter>,
        postfix: Vec<Parameter>,
    },
    Unrecognised,
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub kind: NodeKind,
    pub syntax: Arc<CommandSyntax>,
    pub conditional: Conditional,
    pub parameters: Vec<Parameter>,
    pub line_number: usize,
    pub line_text: String,
    /// Commented-out command (`* command`) that still parses as code.
    pub commented: bool,
    /// Produced by the compiler rather than read from a source line.
    pub synthetic: bool,
    pub index: Option<Address>,
    pub jump_target: Option<NodeId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CommandNode {
    fn with_kind(
        kind: NodeKind,
        syntax: Arc<CommandSyntax>,
        line_number: usize,
        line_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            syntax,
            conditional: Conditional::None,
            parameters: Vec::new(),
            line_number,
            line_text: line_text.into(),
            commented: false,
            synthetic: false,
            index: None,
            jump_target: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn nop(line_number: usize, line_text: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Nop, CommandSyntax::nop(), line_number, line_text)
    }

    pub fn comment(line_number: usize, line_text: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_kind(
            NodeKind::Comment { text: text.into() },
            CommandSyntax::comment(),
            line_number,
            line_text,
        )
    }

    pub fn command(
        syntax: Arc<CommandSyntax>,
        conditional: Conditional,
        parameters: Vec<Parameter>,
        line_number: usize,
        line_text: impl Into<String>,
    ) -> Self {
        let mut node = Self::with_kind(NodeKind::Command, syntax, line_number, line_text);
        node.conditional = conditional;
        node.parameters = parameters;
        node
    }

    pub fn expression(
        conditional: Conditional,
        parameters: Vec<Parameter>,
        infix: Vec<Parameter>,
        postfix: Vec<Parameter>,
        line_number: usize,
        line_text: impl Into<String>,
    ) -> Self {
        let mut node = Self::with_kind(
            NodeKind::Expression { infix, postfix },
            CommandSyntax::expression(),
            line_number,
            line_text,
        );
        node.conditional = conditional;
        node.parameters = parameters;
        node
    }

    /// A line that matched no grammar. The conditional prefix, when one was
    /// read, is kept so branch structure survives the bad line.
    pub fn unrecognised(
        conditional: Conditional,
        line_number: usize,
        line_text: impl Into<String>,
    ) -> Self {
        let mut node = Self::with_kind(
            NodeKind::Unrecognised,
            CommandSyntax::unrecognised(),
            line_number,
            line_text,
        );
        node.conditional = conditional;
        node
    }

    /// Unconditional jump inserted by the linker.
    pub fn jump(line_number: usize) -> Self {
        let syntax = CommandSyntax::jump();
        let param = Parameter::new(
            syntax.parameters[0].clone(),
            ParameterValue::Address(0),
            None,
        );
        let mut node = Self::with_kind(NodeKind::Command, syntax, line_number, "goto address");
        node.parameters = vec![param];
        node.synthetic = true;
        node
    }

    pub fn id(&self) -> u16 {
        self.syntax.id
    }

    pub fn is(&self, id: u16) -> bool {
        self.syntax.id == id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Non-comment, non-NOP line of code.
    pub fn is_code(&self) -> bool {
        !self.commented
            && matches!(
                self.kind,
                NodeKind::Command | NodeKind::Expression { .. } | NodeKind::Unrecognised
            )
    }

    pub fn branch_logic(&self) -> BranchLogic {
        if !self.is_code() {
            return BranchLogic::None;
        }
        match self.conditional {
            Conditional::If | Conditional::IfNot => return BranchLogic::If,
            Conditional::ElseIf | Conditional::ElseIfNot => return BranchLogic::ElseIf,
            Conditional::While | Conditional::WhileNot => return BranchLogic::While,
            Conditional::SkipIf | Conditional::SkipIfNot => return BranchLogic::SkipIf,
            _ => {}
        }
        match self.syntax.id {
            cmd::ELSE => BranchLogic::Else,
            cmd::END => BranchLogic::End,
            cmd::BREAK => BranchLogic::Break,
            cmd::CONTINUE => BranchLogic::Continue,
            _ if self.syntax.is_loop_macro() => BranchLogic::While,
            _ => BranchLogic::None,
        }
    }

    /// Executable command that receives a compiled address.
    pub fn is_standard(&self) -> bool {
        matches!(self.kind, NodeKind::Command | NodeKind::Expression { .. })
            && !self.commented
            && !self.syntax.is_auxiliary()
            && !self.syntax.is_macro()
    }

    /// Name of the label this node defines.
    pub fn label_name(&self) -> Option<&str> {
        if !self.is(cmd::DEFINE_LABEL) {
            return None;
        }
        match self.parameters.first().map(|param| &param.value) {
            Some(ParameterValue::Label(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Every parameter including expression operands, in source order.
    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        let infix: &[Parameter] = match &self.kind {
            NodeKind::Expression { infix, .. } => infix,
            _ => &[],
        };
        self.parameters.iter().chain(infix.iter())
    }
}

pub trait NodeVisitor {
    fn visit(&mut self, tree: &CommandTree, id: NodeId, depth: usize);
}

/// Arena of command nodes. Children are owned by their parent through the
/// child lists; `parent` and `jump_target` are plain handles.
#[derive(Debug, Clone)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    root: NodeId,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::nop(0, "")],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds a detached node to the arena.
    pub fn add(&mut self, node: CommandNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode {
            parent: None,
            children: Vec::new(),
            ..node
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.nodes[parent.0].children.len();
        self.insert_child(parent, position, child);
    }

    pub fn insert_child(&mut self, parent: NodeId, position: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let position = position.min(children.len());
        children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != child);
        }
    }

    /// Puts `replacements` where `old` sits in its parent and detaches `old`.
    pub fn replace(&mut self, old: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        let position = self.position(old).unwrap_or(0);
        for (offset, id) in replacements.iter().enumerate() {
            self.insert_child(parent, position + offset, *id);
        }
        self.detach(old);
    }

    /// Re-parents every child of `from` onto the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.append_child(to, child);
        }
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let position = self.position(id)?;
        self.children(parent).get(position + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let position = self.position(id)?;
        position
            .checked_sub(1)
            .and_then(|index| self.children(parent).get(index).copied())
    }

    /// Siblings after `id`, in order.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match (self.parent(id), self.position(id)) {
            (Some(parent), Some(position)) => self.children(parent)[position + 1..].to_vec(),
            _ => Vec::new(),
        }
    }

    /// Parent chain from the nearest ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self.parent(ancestor);
        }
        out
    }

    /// Depth-first, document-order descendants of `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every node reachable from the root, in document order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len().saturating_sub(1)
    }

    pub fn accept(&self, visitor: &mut impl NodeVisitor) {
        for id in self.nodes() {
            visitor.visit(self, id, self.depth(id));
        }
    }
}
