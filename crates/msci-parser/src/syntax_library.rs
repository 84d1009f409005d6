use std::collections::HashMap;
use std::sync::Arc;

use msci_core::{
    CommandSyntax, GameVersion, MsciError, SyntaxCatalog, SyntaxMatch, Token, TokenType,
};
use serde::Deserialize;

use crate::lexer::tokenize_significant;

const STANDARD_SYNTAX: &str = include_str!("../data/standard-syntax.json");

#[derive(Debug, Deserialize)]
struct SyntaxDocument {
    commands: Vec<CommandSyntax>,
}

#[derive(Debug, Clone)]
enum TemplatePart {
    Literal(String),
    Slot(usize),
}

#[derive(Debug, Clone)]
struct SyntaxEntry {
    syntax: Arc<CommandSyntax>,
    template: Vec<TemplatePart>,
    literals: usize,
}

/// In-memory syntax catalog built from a JSON command list.
#[derive(Debug, Clone, Default)]
pub struct SyntaxLibrary {
    entries: Vec<SyntaxEntry>,
    by_id: HashMap<u16, Vec<usize>>,
}

impl SyntaxLibrary {
    pub fn from_json(source: &str) -> Result<Self, MsciError> {
        let document: SyntaxDocument = serde_json::from_str(source)
            .map_err(|error| MsciError::new("SYNTAX_LIBRARY_INVALID", error.to_string()))?;
        let mut library = Self::default();
        for syntax in document.commands {
            library.insert(syntax)?;
        }
        Ok(library)
    }

    /// The command set shipped with the compiler.
    pub fn standard() -> Self {
        Self::from_json(STANDARD_SYNTAX).expect("embedded standard syntax must load")
    }

    pub fn insert(&mut self, syntax: CommandSyntax) -> Result<(), MsciError> {
        let template = compile_template(&syntax)?;
        let literals = template
            .iter()
            .filter(|part| matches!(part, TemplatePart::Literal(_)))
            .count();
        let index = self.entries.len();
        self.by_id.entry(syntax.id).or_default().push(index);
        self.entries.push(SyntaxEntry {
            syntax: Arc::new(syntax),
            template,
            literals,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compile_template(syntax: &CommandSyntax) -> Result<Vec<TemplatePart>, MsciError> {
    let mut parts = Vec::new();
    for token in tokenize_significant(&syntax.text, 0) {
        if token.ttype == TokenType::Variable {
            let display = token.text[1..].parse::<usize>().ok();
            let slot = display.and_then(|display| syntax.slot_parameter(display));
            let Some(slot) = slot else {
                return Err(MsciError::new(
                    "SYNTAX_LIBRARY_INVALID",
                    format!(
                        "Command {} template \"{}\" refers to unknown parameter {}.",
                        syntax.id, syntax.text, token.text
                    ),
                ));
            };
            parts.push(TemplatePart::Slot(slot));
        } else {
            parts.push(TemplatePart::Literal(token.text));
        }
    }
    Ok(parts)
}

impl SyntaxCatalog for SyntaxLibrary {
    fn find(&self, id: u16, version: GameVersion) -> Option<Arc<CommandSyntax>> {
        self.by_id
            .get(&id)?
            .iter()
            .map(|index| &self.entries[*index])
            .find(|entry| entry.syntax.supports(version))
            .map(|entry| entry.syntax.clone())
    }

    fn identify(&self, tokens: &[Token], version: GameVersion) -> Vec<SyntaxMatch> {
        let mut found: Vec<(usize, SyntaxMatch)> = self
            .entries
            .iter()
            .filter(|entry| !entry.syntax.hidden && entry.syntax.supports(version))
            .filter_map(|entry| match_entry(entry, tokens).map(|found| (entry.literals, found)))
            .collect();
        found.sort_by(|(left, a), (right, b)| {
            right.cmp(left).then_with(|| a.syntax.id.cmp(&b.syntax.id))
        });
        found.into_iter().map(|(_, found)| found).collect()
    }
}

fn match_entry(entry: &SyntaxEntry, tokens: &[Token]) -> Option<SyntaxMatch> {
    if tokens.len() < entry.template.len() {
        return None;
    }
    let mut bindings = Vec::new();
    for (part, token) in entry.template.iter().zip(tokens) {
        match part {
            TemplatePart::Literal(text) => {
                if !token.text.eq_ignore_ascii_case(text) {
                    return None;
                }
            }
            TemplatePart::Slot(index) => {
                let accepts_text = entry.syntax.parameters[*index].ptype.is_label();
                let fits = token.is_value() || (accepts_text && token.ttype == TokenType::Text);
                if !fits {
                    return None;
                }
                bindings.push((*index, token.clone()));
            }
        }
    }
    let residual = tokens[entry.template.len()..].to_vec();
    if !residual.is_empty() && entry.syntax.varargs.is_none() {
        return None;
    }
    Some(SyntaxMatch {
        syntax: entry.syntax.clone(),
        bindings,
        residual,
    })
}
