pub mod builder;
pub mod expression;
pub mod lexer;
pub mod line;
pub mod literal;
pub mod object_library;
pub mod syntax_library;

pub use builder::TreeBuilder;
pub use expression::{parse_expression, ParsedExpression};
pub use lexer::{significant, tokenize, tokenize_significant};
pub use line::{LineOutcome, LineParser};
pub use object_library::ObjectLibrary;
pub use syntax_library::SyntaxLibrary;

use msci_core::{CommandTree, ErrorToken, GameVersion, SyntaxCatalog};
use tracing::debug;

/// Result of parsing a whole script: the tree plus every line diagnostic.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub tree: CommandTree,
    pub errors: Vec<ErrorToken>,
    /// `*` lines that were kept as plain comments, with the reason.
    pub comment_errors: Vec<ErrorToken>,
}

pub struct ScriptParser<'a> {
    lines: LineParser<'a>,
}

impl<'a> ScriptParser<'a> {
    pub fn new(catalog: &'a dyn SyntaxCatalog, version: GameVersion) -> Self {
        Self {
            lines: LineParser::new(catalog, version),
        }
    }

    pub fn parse_line(&self, line_number: usize, text: &str) -> LineOutcome {
        self.lines.parse(line_number, text)
    }

    /// Parses `lines` (numbered from 1) and assembles the command tree.
    pub fn parse_script<S: AsRef<str>>(&self, lines: &[S]) -> ParseOutcome {
        let mut builder = TreeBuilder::new();
        let mut errors = Vec::new();
        let mut comment_errors = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let outcome = self.parse_line(index + 1, line.as_ref());
            errors.extend(outcome.error);
            comment_errors.extend(outcome.comment_error);
            builder.push(outcome.node);
        }

        debug!(
            lines = lines.len(),
            errors = errors.len(),
            comments = comment_errors.len(),
            "parsed script"
        );
        ParseOutcome {
            tree: builder.finish(),
            errors,
            comment_errors,
        }
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    #[test]
    fn parse_script_numbers_lines_from_one_and_collects_errors() {
        let library = SyntaxLibrary::standard();
        let parser = ScriptParser::new(&library, GameVersion::TerranConflict);
        let outcome = parser.parse_script(&["$x = 1", "fly away", "* not code here", "return $x"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line_number, 2);
        assert_eq!(outcome.comment_errors.len(), 1);
        assert_eq!(outcome.comment_errors[0].line_number, 3);
        let root = outcome.tree.root();
        assert_eq!(outcome.tree.children(root).len(), 4);
    }
}
