use std::sync::OnceLock;

use msci_core::{Token, TokenType};
use regex::Regex;

const KEYWORDS: &[&str] = &[
    "if", "not", "while", "else", "skip", "start", "end", "break", "continue",
];

fn whitespace_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s+").expect("whitespace regex must compile"))
}

fn string_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^'(?:\\.|[^'\\])*'").expect("string regex must compile"))
}

fn game_object_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\{[^{}]*\}").expect("game object regex must compile"))
}

fn script_object_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\[[A-Za-z][^\[\]]*\]").expect("script object regex must compile")
    })
}

fn variable_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\$[\w.]+").expect("variable regex must compile"))
}

fn number_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^-?\d+").expect("number regex must compile"))
}

fn operator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^(?:->|==|!=|<=|>=|[=,:()\[\]<>+\-*/&|^!~])")
            .expect("operator regex must compile")
    })
}

fn word_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("word regex must compile"))
}

fn label_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_]*\s*:\s*$").expect("label line regex must compile")
    })
}

/// Splits one line into tokens, whitespace included. `offset` is added to
/// every character position so a re-lexed fragment keeps the columns of the
/// line it came from.
pub fn tokenize(text: &str, offset: usize) -> Vec<Token> {
    let label_line = label_line_regex().is_match(text);
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = text;
    let mut column = offset;

    while !rest.is_empty() {
        let (ttype, length) = next_token(rest, &tokens, label_line);
        let fragment = &rest[..length];
        let width = fragment.chars().count();
        tokens.push(Token::new(ttype, fragment, column, column + width));
        column += width;
        rest = &rest[length..];
    }
    tokens
}

/// Tokens without whitespace.
pub fn significant(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|token| token.ttype != TokenType::Whitespace)
        .cloned()
        .collect()
}

pub fn tokenize_significant(text: &str, offset: usize) -> Vec<Token> {
    significant(&tokenize(text, offset))
}

fn next_token(rest: &str, previous: &[Token], label_line: bool) -> (TokenType, usize) {
    if let Some(found) = whitespace_regex().find(rest) {
        return (TokenType::Whitespace, found.end());
    }
    if rest.starts_with('\'') {
        return match string_regex().find(rest) {
            Some(found) => (TokenType::String, found.end()),
            None => (TokenType::Text, rest.len()),
        };
    }
    if let Some(found) = game_object_regex().find(rest) {
        return (TokenType::GameObject, found.end());
    }
    if rest.starts_with('[') && !attached_to_value(previous) {
        if let Some(found) = script_object_regex().find(rest) {
            return (TokenType::ScriptObject, found.end());
        }
    }
    if let Some(found) = variable_regex().find(rest) {
        return (TokenType::Variable, found.end());
    }
    if let Some(found) = number_regex().find(rest) {
        if !found.as_str().starts_with('-') || !follows_value(previous) {
            return (TokenType::Number, found.end());
        }
    }
    if let Some(found) = operator_regex().find(rest) {
        let ttype = match found.as_str() {
            "->" | "=" | "," | ":" | "(" | ")" | "[" | "]" => TokenType::Operator,
            "!" | "~" => TokenType::UnaryOp,
            _ => TokenType::BinaryOp,
        };
        return (ttype, found.end());
    }
    if let Some(found) = word_regex().find(rest) {
        let word = found.as_str().to_ascii_lowercase();
        let ttype = if label_line && previous.iter().all(|token| token.ttype == TokenType::Whitespace) {
            TokenType::Label
        } else if word == "null" {
            TokenType::Null
        } else if matches!(word.as_str(), "and" | "or" | "mod") {
            TokenType::BinaryOp
        } else if KEYWORDS.contains(&word.as_str()) {
            TokenType::Keyword
        } else {
            TokenType::Text
        };
        return (ttype, found.end());
    }
    let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
    (TokenType::Text, width)
}

fn last_significant(previous: &[Token]) -> Option<&Token> {
    previous
        .iter()
        .rev()
        .find(|token| token.ttype != TokenType::Whitespace)
}

/// `[` glued directly onto a variable or a closing `]` opens an index.
fn attached_to_value(previous: &[Token]) -> bool {
    match previous.last() {
        Some(token) => token.ttype == TokenType::Variable || token.is_operator("]"),
        None => false,
    }
}

fn follows_value(previous: &[Token]) -> bool {
    match last_significant(previous) {
        Some(token) => token.is_value() || token.is_operator(")") || token.is_operator("]"),
        None => false,
    }
}
