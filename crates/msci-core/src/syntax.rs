use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::MsciError;

/// Well-known command ids the compiler relies on.
pub mod cmd {
    pub const NOP: u16 = 0;
    pub const COMMENT: u16 = 1;
    pub const EXPRESSION: u16 = 2;
    pub const UNRECOGNISED: u16 = 3;

    pub const CALL_SCRIPT: u16 = 102;
    pub const RETURN: u16 = 103;
    pub const GOTO_LABEL: u16 = 104;
    pub const DEFINE_LABEL: u16 = 105;
    pub const GOTO_SUB: u16 = 106;
    pub const END_SUB: u16 = 107;
    pub const JUMP: u16 = 108;
    pub const ELSE: u16 = 109;
    pub const END: u16 = 110;
    pub const BREAK: u16 = 111;
    pub const CONTINUE: u16 = 112;
    pub const ADD: u16 = 113;
    pub const SUBTRACT: u16 = 114;
    pub const INCREMENT: u16 = 115;
    pub const DECREMENT: u16 = 116;

    pub const ARRAY_ALLOC: u16 = 128;
    pub const ARRAY_GET: u16 = 129;
    pub const ARRAY_SET: u16 = 130;
    pub const ARRAY_SIZE: u16 = 131;

    pub const DIM_ARRAY: u16 = 1000;
    pub const FOR_LOOP: u16 = 1001;
    pub const FOR_EACH: u16 = 1002;
    pub const FOR_EACH_COUNTER: u16 = 1003;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameVersion {
    Threat,
    Reunion,
    TerranConflict,
    AlbionPrelude,
}

impl GameVersion {
    pub const ALL: [GameVersion; 4] = [
        GameVersion::Threat,
        GameVersion::Reunion,
        GameVersion::TerranConflict,
        GameVersion::AlbionPrelude,
    ];

    pub fn flag(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Threat => "X2: The Threat",
            Self::Reunion => "X3: Reunion",
            Self::TerranConflict => "X3: Terran Conflict",
            Self::AlbionPrelude => "X3: Albion Prelude",
        }
    }
}

impl FromStr for GameVersion {
    type Err = MsciError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "x2" | "threat" => Ok(Self::Threat),
            "x3r" | "reunion" => Ok(Self::Reunion),
            "x3tc" | "tc" | "terran-conflict" | "terranconflict" => Ok(Self::TerranConflict),
            "x3ap" | "ap" | "albion-prelude" | "albionprelude" => Ok(Self::AlbionPrelude),
            _ => Err(MsciError::new(
                "GAME_VERSION_UNKNOWN",
                format!("Unknown game version \"{}\".", value),
            )),
        }
    }
}

/// Compatible-version bitmask of a command signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<GameVersion>", into = "Vec<GameVersion>")]
pub struct VersionSet(u8);

impl VersionSet {
    pub fn all() -> Self {
        GameVersion::ALL.iter().copied().collect::<Vec<_>>().into()
    }

    pub fn contains(self, version: GameVersion) -> bool {
        self.0 & version.flag() != 0
    }
}

impl Default for VersionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<GameVersion>> for VersionSet {
    fn from(versions: Vec<GameVersion>) -> Self {
        Self(versions.iter().fold(0, |mask, version| mask | version.flag()))
    }
}

impl From<VersionSet> for Vec<GameVersion> {
    fn from(set: VersionSet) -> Self {
        GameVersion::ALL
            .iter()
            .copied()
            .filter(|version| set.contains(*version))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    Value,
    Variable,
    VarNumber,
    VarString,
    VarBoolean,
    VarArray,
    VarShip,
    VarStation,
    VarShipStation,
    VarSector,
    VarWare,
    VarRace,
    VarConstant,
    Number,
    String,
    LabelName,
    LabelNumber,
    ScriptName,
    Comment,
    RetVar,
    RetVarIf,
    RetVarIfStart,
    Expression,
}

impl ParameterType {
    pub fn is_return_value(self) -> bool {
        matches!(self, Self::RetVar | Self::RetVarIf | Self::RetVarIfStart)
    }

    pub fn is_label(self) -> bool {
        matches!(self, Self::LabelName | Self::LabelNumber)
    }

    /// Whether a return-value parameter of this type may carry `conditional`.
    pub fn admits(self, conditional: Conditional) -> bool {
        match conditional {
            Conditional::None | Conditional::Discard => self.is_return_value(),
            Conditional::Start => self == Self::RetVarIfStart,
            _ => matches!(self, Self::RetVarIf | Self::RetVarIfStart),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Variable => "Var",
            Self::VarNumber => "Var/Number",
            Self::VarString => "Var/String",
            Self::VarBoolean => "Var/Boolean",
            Self::VarArray => "Var/Array",
            Self::VarShip => "Var/Ship",
            Self::VarStation => "Var/Station",
            Self::VarShipStation => "Var/Ship/Station",
            Self::VarSector => "Var/Sector",
            Self::VarWare => "Var/Ware",
            Self::VarRace => "Var/Race",
            Self::VarConstant => "Var/Constant",
            Self::Number => "Number",
            Self::String => "String",
            Self::LabelName => "Label Name",
            Self::LabelNumber => "Label Number",
            Self::ScriptName => "Script Name",
            Self::Comment => "Comment",
            Self::RetVar => "RetVar",
            Self::RetVarIf => "RetVar/IF",
            Self::RetVarIfStart => "RetVar/IF/START",
            Self::Expression => "Expression",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterUsage {
    #[default]
    Normal,
    ReturnValue,
    RefObject,
    VarArg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSyntax {
    #[serde(rename = "type")]
    pub ptype: ParameterType,
    #[serde(default)]
    pub display: usize,
    #[serde(default)]
    pub usage: ParameterUsage,
}

impl ParameterSyntax {
    pub fn new(ptype: ParameterType, display: usize, usage: ParameterUsage) -> Self {
        Self {
            ptype,
            display,
            usage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionType {
    #[default]
    Serial,
    Concurrent,
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VarArgStyle {
    /// `v0, v1, v2`
    Delimited,
    /// `name=value name=value`
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarArgSyntax {
    pub style: VarArgStyle,
    #[serde(rename = "type")]
    pub ptype: ParameterType,
    pub max: usize,
}

/// A command signature from the syntax catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSyntax {
    pub id: u16,
    pub text: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSyntax>,
    #[serde(default)]
    pub versions: VersionSet,
    #[serde(default)]
    pub execution: ExecutionType,
    #[serde(default)]
    pub varargs: Option<VarArgSyntax>,
    #[serde(default)]
    pub hidden: bool,
}

impl CommandSyntax {
    pub fn supports(&self, version: GameVersion) -> bool {
        self.versions.contains(version)
    }

    pub fn return_parameter(&self) -> Option<(usize, &ParameterSyntax)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, param)| param.usage == ParameterUsage::ReturnValue)
    }

    pub fn ref_object_parameter(&self) -> Option<(usize, &ParameterSyntax)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, param)| param.usage == ParameterUsage::RefObject)
    }

    /// Physical index of the slot parameter written as `$display` in the template.
    pub fn slot_parameter(&self, display: usize) -> Option<usize> {
        self.parameters
            .iter()
            .position(|param| param.usage == ParameterUsage::Normal && param.display == display)
    }

    pub fn is(&self, id: u16) -> bool {
        self.id == id
    }

    pub fn is_macro(&self) -> bool {
        matches!(
            self.id,
            cmd::DIM_ARRAY | cmd::FOR_LOOP | cmd::FOR_EACH | cmd::FOR_EACH_COUNTER
        )
    }

    pub fn is_loop_macro(&self) -> bool {
        matches!(
            self.id,
            cmd::FOR_LOOP | cmd::FOR_EACH | cmd::FOR_EACH_COUNTER
        )
    }

    /// Structural commands that never receive a compiled address.
    pub fn is_auxiliary(&self) -> bool {
        matches!(
            self.id,
            cmd::NOP | cmd::COMMENT | cmd::ELSE | cmd::END | cmd::BREAK | cmd::CONTINUE
        )
    }

    pub fn is_script_call(&self) -> bool {
        self.parameters
            .iter()
            .any(|param| param.ptype == ParameterType::ScriptName)
    }

    pub fn nop() -> Arc<CommandSyntax> {
        builtin(&NOP_SYNTAX, || Self::internal(cmd::NOP, "", Vec::new()))
    }

    pub fn comment() -> Arc<CommandSyntax> {
        builtin(&COMMENT_SYNTAX, || {
            Self::internal(
                cmd::COMMENT,
                "* $0",
                vec![ParameterSyntax::new(
                    ParameterType::Comment,
                    0,
                    ParameterUsage::Normal,
                )],
            )
        })
    }

    pub fn expression() -> Arc<CommandSyntax> {
        builtin(&EXPRESSION_SYNTAX, || {
            Self::internal(
                cmd::EXPRESSION,
                "$1",
                vec![
                    ParameterSyntax::new(ParameterType::RetVarIf, 0, ParameterUsage::ReturnValue),
                    ParameterSyntax::new(ParameterType::Expression, 1, ParameterUsage::Normal),
                ],
            )
        })
    }

    pub fn unrecognised() -> Arc<CommandSyntax> {
        builtin(&UNRECOGNISED_SYNTAX, || {
            Self::internal(cmd::UNRECOGNISED, "", Vec::new())
        })
    }

    pub fn jump() -> Arc<CommandSyntax> {
        builtin(&JUMP_SYNTAX, || {
            Self::internal(
                cmd::JUMP,
                "goto address $0",
                vec![ParameterSyntax::new(
                    ParameterType::LabelNumber,
                    0,
                    ParameterUsage::Normal,
                )],
            )
        })
    }

    fn internal(id: u16, text: &str, parameters: Vec<ParameterSyntax>) -> Self {
        Self {
            id,
            text: text.to_string(),
            parameters,
            versions: VersionSet::all(),
            execution: ExecutionType::Serial,
            varargs: None,
            hidden: true,
        }
    }
}

static NOP_SYNTAX: OnceLock<Arc<CommandSyntax>> = OnceLock::new();
static COMMENT_SYNTAX: OnceLock<Arc<CommandSyntax>> = OnceLock::new();
static EXPRESSION_SYNTAX: OnceLock<Arc<CommandSyntax>> = OnceLock::new();
static UNRECOGNISED_SYNTAX: OnceLock<Arc<CommandSyntax>> = OnceLock::new();
static JUMP_SYNTAX: OnceLock<Arc<CommandSyntax>> = OnceLock::new();

fn builtin(
    cell: &'static OnceLock<Arc<CommandSyntax>>,
    init: impl FnOnce() -> CommandSyntax,
) -> Arc<CommandSyntax> {
    cell.get_or_init(|| Arc::new(init())).clone()
}

/// How a command node's return value is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Conditional {
    #[default]
    None,
    Discard,
    If,
    IfNot,
    While,
    WhileNot,
    ElseIf,
    ElseIfNot,
    SkipIf,
    SkipIfNot,
    Start,
}

impl Conditional {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::None | Self::Discard => "",
            Self::If => "if",
            Self::IfNot => "if not",
            Self::While => "while",
            Self::WhileNot => "while not",
            Self::ElseIf => "else if",
            Self::ElseIfNot => "else if not",
            Self::SkipIf => "skip if",
            Self::SkipIfNot => "skip if not",
            Self::Start => "start",
        }
    }

    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Self::IfNot | Self::WhileNot | Self::ElseIfNot | Self::SkipIfNot
        )
    }

    /// Whether the command evaluates a condition and therefore jumps.
    pub fn is_branching(self) -> bool {
        !matches!(self, Self::None | Self::Discard | Self::Start)
    }
}

/// Control-flow role of a node in the command tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchLogic {
    None,
    If,
    ElseIf,
    Else,
    End,
    While,
    SkipIf,
    Break,
    Continue,
}

impl BranchLogic {
    pub fn opens_scope(self) -> bool {
        matches!(
            self,
            Self::If | Self::ElseIf | Self::Else | Self::While | Self::SkipIf
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "command",
            Self::If => "if",
            Self::ElseIf => "else if",
            Self::Else => "else",
            Self::End => "end",
            Self::While => "while",
            Self::SkipIf => "skip if",
            Self::Break => "break",
            Self::Continue => "continue",
        }
    }
}
