use msci_core::{ParameterValue, Token, TokenType};

/// Reads the parameter value a token stands for. Bare words become label
/// names; anything that is neither a value nor a word is rejected.
pub fn token_value(token: &Token) -> Result<ParameterValue, String> {
    let text = token.text.as_str();
    match token.ttype {
        TokenType::Number => text
            .parse::<i32>()
            .map(ParameterValue::Number)
            .map_err(|_| format!("'{}' is not a valid number", text)),
        TokenType::String => Ok(ParameterValue::String(unquote(text))),
        TokenType::GameObject => Ok(ParameterValue::GameObject(strip(text, '{', '}'))),
        TokenType::ScriptObject => Ok(ParameterValue::ScriptObject(strip(text, '[', ']'))),
        TokenType::Variable => Ok(ParameterValue::Variable(
            token.variable_name().unwrap_or_default().to_string(),
        )),
        TokenType::Null => Ok(ParameterValue::Null),
        TokenType::Text | TokenType::Label => Ok(ParameterValue::Label(text.to_string())),
        _ => Err(format!("'{}' is not a value", text)),
    }
}

fn strip(text: &str, open: char, close: char) -> String {
    let inner = text.strip_prefix(open).unwrap_or(text);
    inner.strip_suffix(close).unwrap_or(inner).to_string()
}

fn unquote(text: &str) -> String {
    let inner = strip(text, '\'', '\'');
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        out.push(ch);
    }
    out
}
