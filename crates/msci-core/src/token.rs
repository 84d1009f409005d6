use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Text,
    Number,
    String,
    GameObject,
    ScriptObject,
    Keyword,
    Variable,
    Null,
    Label,
    BinaryOp,
    UnaryOp,
    Operator,
    Comment,
    Whitespace,
}

/// One lexical token of a source line. `start`/`end` are character offsets
/// into the line the token was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub ttype: TokenType,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            ttype,
            text: text.into(),
            start,
            end,
        }
    }

    pub fn is(&self, ttype: TokenType, text: &str) -> bool {
        self.ttype == ttype && self.text.eq_ignore_ascii_case(text)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.is(TokenType::Keyword, word)
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        self.ttype == TokenType::Operator && self.text == symbol
    }

    /// Whether the token can stand as a value: a parameter slot or an
    /// expression operand.
    pub fn is_value(&self) -> bool {
        matches!(
            self.ttype,
            TokenType::Number
                | TokenType::String
                | TokenType::GameObject
                | TokenType::ScriptObject
                | TokenType::Variable
                | TokenType::Null
        )
    }

    /// Variable name without its `$` sigil.
    pub fn variable_name(&self) -> Option<&str> {
        match self.ttype {
            TokenType::Variable => Some(self.text.trim_start_matches('$')),
            _ => None,
        }
    }
}
