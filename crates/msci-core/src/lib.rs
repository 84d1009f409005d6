pub mod error;
pub mod script;
pub mod services;
pub mod syntax;
pub mod token;
pub mod tree;
pub mod value;

pub use error::{ErrorToken, MsciError};
pub use script::*;
pub use services::*;
pub use syntax::*;
pub use token::{Token, TokenType};
pub use tree::{CommandNode, CommandTree, NodeId, NodeKind, NodeVisitor};
pub use value::*;
