use std::fmt;

use serde::{Deserialize, Serialize};

use crate::syntax::{Conditional, ParameterSyntax};
use crate::token::Token;

pub type Address = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
    Negate,
    Not,
    Complement,
    OpenBracket,
    CloseBracket,
}

impl Operator {
    pub fn from_binary(symbol: &str) -> Option<Self> {
        let op = match symbol.to_ascii_lowercase().as_str() {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            "mod" => Self::Modulus,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Less,
            ">" => Self::Greater,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "and" => Self::LogicalAnd,
            "or" => Self::LogicalOr,
            _ => return None,
        };
        Some(op)
    }

    pub fn from_unary(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(Self::Negate),
            "!" => Some(Self::Not),
            "~" => Some(Self::Complement),
            _ => None,
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Self::Negate | Self::Not | Self::Complement)
    }

    /// Binding strength; higher binds tighter. Brackets have none.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Negate | Self::Not | Self::Complement => 10,
            Self::Multiply | Self::Divide | Self::Modulus => 9,
            Self::Add | Self::Subtract => 8,
            Self::Less | Self::Greater | Self::LessEqual | Self::GreaterEqual => 7,
            Self::Equal | Self::NotEqual => 6,
            Self::BitAnd => 5,
            Self::BitXor => 4,
            Self::BitOr => 3,
            Self::LogicalAnd => 2,
            Self::LogicalOr => 1,
            Self::OpenBracket | Self::CloseBracket => 0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract | Self::Negate => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulus => "mod",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LogicalAnd => "AND",
            Self::LogicalOr => "OR",
            Self::Not => "!",
            Self::Complement => "~",
            Self::OpenBracket => "(",
            Self::CloseBracket => ")",
        }
    }
}

/// The resolved value carried by a command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ParameterValue {
    Null,
    Number(i32),
    String(String),
    Variable(String),
    GameObject(String),
    ScriptObject(String),
    Label(String),
    Address(Address),
    Comment(String),
    Conditional {
        conditional: Conditional,
        jump: Option<Address>,
    },
    Operator(Operator),
    /// `name=value` argument of a named variable-argument list.
    Named {
        name: String,
        value: Box<ParameterValue>,
    },
}

impl ParameterValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Variable(_) => "variable",
            Self::GameObject(_) => "game object",
            Self::ScriptObject(_) => "script object",
            Self::Label(_) => "label",
            Self::Address(_) => "address",
            Self::Comment(_) => "comment",
            Self::Conditional { .. } => "conditional",
            Self::Operator(_) => "operator",
            Self::Named { .. } => "named argument",
        }
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i32> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Number(value) => write!(f, "{}", value),
            Self::String(value) => {
                f.write_str("'")?;
                for ch in value.chars() {
                    if matches!(ch, '\\' | '\'') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", ch)?;
                }
                f.write_str("'")
            }
            Self::Variable(name) => write!(f, "${}", name),
            Self::GameObject(name) => write!(f, "{{{}}}", name),
            Self::ScriptObject(name) => write!(f, "[{}]", name),
            Self::Label(name) | Self::Comment(name) => f.write_str(name),
            Self::Address(address) => write!(f, "#{}", address),
            Self::Conditional { conditional, jump } => match jump {
                Some(address) => write!(f, "{} -> #{}", conditional.keyword(), address),
                None => f.write_str(conditional.keyword()),
            },
            Self::Operator(op) => f.write_str(op.symbol()),
            Self::Named { name, value } => write!(f, "{}={}", name, value),
        }
    }
}

/// A parameter of a command node: its signature slot, resolved value and the
/// token it was read from (absent for synthesized parameters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub syntax: ParameterSyntax,
    pub value: ParameterValue,
    pub token: Option<Token>,
}

impl Parameter {
    pub fn new(syntax: ParameterSyntax, value: ParameterValue, token: Option<Token>) -> Self {
        Self {
            syntax,
            value,
            token,
        }
    }

    pub fn text(&self) -> String {
        match &self.token {
            Some(token) => token.text.clone(),
            None => self.value.to_string(),
        }
    }
}
