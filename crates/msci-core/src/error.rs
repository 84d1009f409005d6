use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::Token;

/// Failure of an API call that is not a script diagnostic: a catalog that
/// fails to load, an external script that cannot be resolved, and so on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct MsciError {
    pub code: String,
    pub message: String,
    pub line: Option<usize>,
}

impl MsciError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(code: impl Into<String>, message: impl Into<String>, line: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: Some(line),
        }
    }
}

/// A diagnostic raised against one line of a script.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("line {line_number}: {message}")]
pub struct ErrorToken {
    pub message: String,
    pub line_number: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ErrorToken {
    pub fn new(
        message: impl Into<String>,
        line_number: usize,
        text: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            message: message.into(),
            line_number,
            text: text.into(),
            start,
            end,
        }
    }

    /// Error covering the whole of a source line.
    pub fn for_line(message: impl Into<String>, line_number: usize, line_text: &str) -> Self {
        Self::new(message, line_number, line_text, 0, line_text.chars().count())
    }

    /// Error covering a single token of a source line.
    pub fn for_token(message: impl Into<String>, line_number: usize, token: &Token) -> Self {
        Self::new(message, line_number, token.text.clone(), token.start, token.end)
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn msci_error_display_includes_code() {
        let error = MsciError::new("SYNTAX_LIBRARY_INVALID", "bad json");
        assert_eq!(error.to_string(), "SYNTAX_LIBRARY_INVALID: bad json");
        assert_eq!(error.line, None);
        assert_eq!(MsciError::at_line("X", "y", 4).line, Some(4));
    }

    #[test]
    fn error_token_constructors_cover_line_and_token_extents() {
        let line = ErrorToken::for_line("Unrecognised command", 3, "fly away");
        assert_eq!(line.to_string(), "line 3: Unrecognised command");
        assert_eq!((line.start, line.end), (0, 8));

        let token = Token::new(TokenType::Variable, "$ship", 4, 9);
        let error = ErrorToken::for_token("Unknown variable", 7, &token);
        assert_eq!(error.text, "$ship");
        assert_eq!((error.start, error.end), (4, 9));
    }
}
