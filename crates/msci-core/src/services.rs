use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MsciError;
use crate::script::ScriptCallInfo;
use crate::syntax::{CommandSyntax, GameVersion};
use crate::token::Token;

/// A catalog signature matched against a token sequence.
#[derive(Debug, Clone)]
pub struct SyntaxMatch {
    pub syntax: Arc<CommandSyntax>,
    /// Physical parameter index paired with the token bound to it.
    pub bindings: Vec<(usize, Token)>,
    /// Tokens left over after the template, for variable-argument lists.
    pub residual: Vec<Token>,
}

pub trait SyntaxCatalog: Send + Sync {
    fn find(&self, id: u16, version: GameVersion) -> Option<Arc<CommandSyntax>>;

    /// Every signature whose template matches `tokens`, most specific first.
    /// `tokens` must not contain whitespace.
    fn identify(&self, tokens: &[Token], version: GameVersion) -> Vec<SyntaxMatch>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameObjectKind {
    Ship,
    Station,
    Sector,
    Ware,
    Race,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameObjectRef {
    pub kind: GameObjectKind,
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptObjectGroup {
    Constant,
    DataType,
    FlightReturn,
    Relation,
    ObjectClass,
    Race,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptObjectRef {
    pub group: ScriptObjectGroup,
    pub id: u32,
}

pub trait ObjectCatalog: Send + Sync {
    fn find_game_object(&self, name: &str) -> Option<GameObjectRef>;
    fn find_script_object(&self, name: &str) -> Option<ScriptObjectRef>;
}

/// Loads the declared arguments of another script.
pub trait ScriptCallResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<ScriptCallInfo, MsciError>;
}

/// Resolver for hosts that cannot look up other scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScriptResolver;

impl ScriptCallResolver for NoScriptResolver {
    fn resolve(&self, name: &str) -> Result<ScriptCallInfo, MsciError> {
        Err(MsciError::new(
            "SCRIPT_CALL_NOT_FOUND",
            format!("Script \"{}\" cannot be resolved.", name),
        ))
    }
}
